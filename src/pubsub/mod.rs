//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует лёгкий внутрипроцессный маршрутизатор
//! сообщений: издатели раздают сообщения, подписки с фильтрами по теме
//! и содержимому решают, кто их получит:
//!
//! - `emission`: результат вызова потребителя и fan-in ожидание эмиссии.
//! - `filter`: темы, шаблоны тем и нормализация настроек фильтра.
//! - `publisher`: арена подписок, ручки отзыва, эмиттер и
//!   диспетчеризация.
//! - `subscription`: подписка и решение о соответствии сообщения.
//!
//! Публичный API переэкспортирует:
//! - `emission::*`
//! - `filter::*`
//! - `publisher::*`
//! - `subscription::*`

pub mod emission;
pub mod filter;
pub mod publisher;
pub mod subscription;

pub use emission::{Consumed, Emission};
pub use filter::{ContentFilter, FilterOptions, Topic, TopicPattern};
pub use publisher::{Emitter, Publisher, RevokeHandle, SubscriptionKey};
pub use subscription::{ConsumeFn, Subscription};
