use tracing_subscriber::EnvFilter;

use crate::config::Settings;

pub fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap()
}

pub fn build_filter_from_settings(settings: &Settings) -> EnvFilter {
    // Если RUST_LOG (или другой env filter) задан — используем его.
    // Если переменная окружения отсутствует — try_from_default_env() вернёт Err.
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => match EnvFilter::try_new(&settings.log_filter) {
            Ok(filter) => filter,
            Err(e) => {
                // Некорректная директива из настроек — печатаем понятное
                // сообщение и откатываемся на "info"
                eprintln!(
                    "Invalid log filter directive from settings ('{}'): {}; falling back to 'info'",
                    settings.log_filter, e
                );
                EnvFilter::new("info")
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    /// Тест проверяет, что build_filter не паникует и возвращает EnvFilter,
    /// даже если переменная окружения отсутствует.
    #[test]
    #[serial]
    fn test_build_filter_no_env() {
        env::remove_var("RUST_LOG");
        let _f = build_filter();
        // если функция завершилась успешно — тест пройден
    }

    /// Тест проверяет, что build_filter использует RUST_LOG когда она задана.
    #[test]
    #[serial]
    fn test_build_filter_with_env() {
        env::set_var("RUST_LOG", "debug");
        let f = build_filter();
        drop(f);
        env::remove_var("RUST_LOG");
    }

    /// Тест проверяет, что некорректная директива из настроек не
    /// роняет функцию, а откатывается на "info".
    #[test]
    #[serial]
    fn test_build_filter_from_settings_invalid_directive() {
        env::remove_var("RUST_LOG"); // гарантируем использование настроек

        let settings = Settings {
            log_filter: "this_is_invalid_directive!!".to_string(),
            strict_topic_filtering: false,
        };
        let _f = build_filter_from_settings(&settings);
    }

    /// Тест проверяет, что корректная директива из настроек собирается.
    #[test]
    #[serial]
    fn test_build_filter_from_settings_valid_directive() {
        env::remove_var("RUST_LOG");

        let settings = Settings {
            log_filter: "vestnik=debug".to_string(),
            strict_topic_filtering: false,
        };
        let _f = build_filter_from_settings(&settings);
    }
}
