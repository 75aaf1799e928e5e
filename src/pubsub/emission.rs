use std::{fmt, future::Future};

use futures::future::{join_all, BoxFuture};

use crate::EmitError;

/// Результат одного вызова потребителя.
pub enum Consumed {
    /// Потребитель обработал сообщение синхронно.
    Done,
    /// Потребитель вернул отложенное завершение.
    Pending(BoxFuture<'static, Result<(), EmitError>>),
}

impl Consumed {
    /// Оборачивает future потребителя в отложенное завершение.
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<(), EmitError>> + Send + 'static,
    {
        Consumed::Pending(Box::pin(fut))
    }
}

impl fmt::Debug for Consumed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consumed::Done => f.write_str("Consumed::Done"),
            Consumed::Pending(_) => f.write_str("Consumed::Pending(..)"),
        }
    }
}

/// Завершение одной эмиссии.
///
/// Синхронные потребители уже отработали внутри самого вызова `emit`;
/// здесь остаются только отложенные завершения асинхронных. Если их нет,
/// эмиссия завершена немедленно и ждать нечего.
///
/// Отложенные future потребителей запускаются только при [`join`]:
/// эмиссию с асинхронными потребителями нужно дождаться, иначе их
/// работа не будет выполнена.
///
/// [`join`]: Emission::join
#[must_use = "pending consumer futures only run when the emission is joined"]
pub enum Emission {
    /// Все совпавшие потребители завершились синхронно.
    Immediate,
    /// Эмиссия ждёт асинхронных потребителей (в порядке вызова).
    Pending(Vec<BoxFuture<'static, Result<(), EmitError>>>),
}

impl Emission {
    /// Завершилась ли эмиссия синхронно, без ожидания.
    pub fn is_immediate(&self) -> bool {
        matches!(self, Emission::Immediate)
    }

    /// Количество асинхронных завершений, которых ждёт эмиссия.
    pub fn pending_count(&self) -> usize {
        match self {
            Emission::Immediate => 0,
            Emission::Pending(futures) => futures.len(),
        }
    }

    /// Ожидает завершения всех асинхронных потребителей (fan-in).
    ///
    /// Все завершения опрашиваются одновременно; первая ошибка не
    /// прерывает остальных. Результат готов только когда каждое
    /// завершение установилось, и несёт первую ошибку в порядке
    /// вызова потребителей, либо `Ok(())`.
    pub async fn join(self) -> Result<(), EmitError> {
        match self {
            Emission::Immediate => Ok(()),
            Emission::Pending(futures) => join_all(futures)
                .await
                .into_iter()
                .find(|result| result.is_err())
                .unwrap_or(Ok(())),
        }
    }
}

impl fmt::Debug for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emission::Immediate => f.write_str("Emission::Immediate"),
            Emission::Pending(futures) => write!(f, "Emission::Pending({})", futures.len()),
        }
    }
}
