use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Настройки библиотеки для встраивающего приложения.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Директива фильтра логирования (синтаксис как у RUST_LOG).
    pub log_filter: String,
    /// Строгая фильтрация темы по умолчанию для подписок,
    /// не указавших флаг явно.
    pub strict_topic_filtering: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("log_filter", "info")?
            .set_default("strict_topic_filtering", false)?
            // Добавляем переменные окружения с префиксом VESTNIK_
            .add_source(Environment::with_prefix("VESTNIK"))
            .build()?;

        // Десериализуем конфигурацию в нашу структуру
        cfg.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            strict_topic_filtering: false,
        }
    }
}
