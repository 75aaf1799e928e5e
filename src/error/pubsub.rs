use thiserror::Error;

/// Ошибка конфигурации фильтра подписки.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid topic pattern: {0}")]
    InvalidPattern(String),
}

/// Ошибка доставки сообщения потребителям.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("consumer failed: {0}")]
    Consumer(String),

    #[error("invalid topic pattern: {0}")]
    InvalidPattern(String),
}

impl EmitError {
    /// Упаковывает причину отказа потребителя.
    pub fn consumer(reason: impl Into<String>) -> Self {
        EmitError::Consumer(reason.into())
    }
}

// === Преобразования ===

impl From<regex::Error> for FilterError {
    fn from(err: regex::Error) -> Self {
        FilterError::InvalidPattern(err.to_string())
    }
}

impl From<FilterError> for EmitError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidPattern(s) => EmitError::InvalidPattern(s),
        }
    }
}
