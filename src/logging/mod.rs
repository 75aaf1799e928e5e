mod filters;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;

/// Инициализация логирования с фильтром из окружения (RUST_LOG),
/// по умолчанию — уровень `info`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(filters::build_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Инициализация логирования с директивой из настроек.
/// RUST_LOG, если задан, имеет приоритет.
pub fn init_with_settings(settings: &Settings) {
    tracing_subscriber::registry()
        .with(filters::build_filter_from_settings(settings))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!(log_filter = %settings.log_filter, "logging initialized");
}
