use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{Consumed, Emission, FilterOptions, Subscription, Topic};
use crate::{config::Settings, EmitError};

/// Ключ подписки в арене издателя.
pub type SubscriptionKey = u64;

/// Арена живых подписок: монотонный счётчик ключей плюс упорядоченная
/// карта «ключ → подписка». Ключи растут строго, поэтому порядок ключей
/// совпадает с порядком регистрации. Удаление — по ключу, с ответом,
/// существовала ли запись.
struct Registry<M> {
    next_key: AtomicU64,
    subs: RwLock<BTreeMap<SubscriptionKey, Arc<Subscription<M>>>>,
    /// Общее количество проходов диспетчеризации.
    emit_count: AtomicUsize,
    /// Общее количество вызовов потребителей.
    delivered_count: AtomicUsize,
}

impl<M> Registry<M> {
    fn new() -> Self {
        Self {
            next_key: AtomicU64::new(0),
            subs: RwLock::new(BTreeMap::new()),
            emit_count: AtomicUsize::new(0),
            delivered_count: AtomicUsize::new(0),
        }
    }

    fn insert(&self, subscription: Subscription<M>) -> SubscriptionKey {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        self.subs.write().insert(key, Arc::new(subscription));
        debug!(key, "subscription registered");
        key
    }

    fn remove(&self, key: SubscriptionKey) -> bool {
        let existed = self.subs.write().remove(&key).is_some();
        if existed {
            debug!(key, "subscription revoked");
        }
        existed
    }

    fn len(&self) -> usize {
        self.subs.read().len()
    }

    fn clear(&self) -> usize {
        let mut subs = self.subs.write();
        let removed = subs.len();
        subs.clear();
        removed
    }

    /// Стабильный снимок живого набора в порядке регистрации.
    /// Блокировка отпускается до вызова потребителей, поэтому отзыв
    /// из побочного эффекта потребителя не трогает текущий проход.
    fn snapshot(&self) -> Vec<Arc<Subscription<M>>> {
        self.subs.read().values().cloned().collect()
    }
}

impl<M: Clone> Registry<M> {
    /// Один проход диспетчеризации: отбор по фильтрам, синхронные
    /// потребители — на месте и по порядку, отложенные завершения —
    /// в набор ожидания.
    ///
    /// Ошибка синхронного потребителя прерывает проход немедленно:
    /// оставшиеся подписчики не вызываются, ошибка уходит вызывающему.
    fn dispatch(&self, message: M, topic: Option<Topic>) -> Result<Emission, EmitError> {
        self.emit_count.fetch_add(1, Ordering::Relaxed);

        let snapshot = self.snapshot();
        let mut pending = Vec::new();
        for subscription in &snapshot {
            if !subscription.matches(&message, topic.as_ref()) {
                continue;
            }
            self.delivered_count.fetch_add(1, Ordering::Relaxed);
            match subscription.consume(message.clone())? {
                Consumed::Done => {}
                Consumed::Pending(fut) => pending.push(fut),
            }
        }

        trace!(
            candidates = snapshot.len(),
            pending = pending.len(),
            "dispatch pass complete"
        );

        if pending.is_empty() {
            Ok(Emission::Immediate)
        } else {
            Ok(Emission::Pending(pending))
        }
    }
}

/// Издатель: владеет набором живых подписок и раздаёт сообщения.
///
/// Регистрация возвращает ручку отзыва; одинаковые подписки никогда
/// не склеиваются — два вызова `subscribe` с одними и теми же
/// аргументами дают две независимые записи, отзываемые по отдельности.
pub struct Publisher<M> {
    registry: Arc<Registry<M>>,
    /// Строгость темы для подписок, не указавших флаг явно.
    default_strict: bool,
}

impl<M> Publisher<M> {
    /// Создаёт издателя без подписок.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            default_strict: false,
        }
    }

    /// Создаёт издателя, беря умолчание строгой фильтрации из настроек.
    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            default_strict: settings.strict_topic_filtering,
        }
    }

    /// Регистрирует потребителя без фильтра: получает каждое сообщение.
    pub fn subscribe<F>(&self, consume: F) -> RevokeHandle
    where
        F: Fn(M) -> Result<Consumed, EmitError> + Send + Sync + 'static,
        M: 'static,
    {
        self.subscribe_with_options(consume, FilterOptions::default())
    }

    /// Регистрирует потребителя с настройками фильтра.
    ///
    /// `options` принимает краткую форму (голая тема или шаблон) и
    /// явную (построенный [`FilterOptions`]); без флага строгости
    /// действует умолчание издателя.
    pub fn subscribe_with_options<F>(
        &self,
        consume: F,
        options: impl Into<FilterOptions<M>>,
    ) -> RevokeHandle
    where
        F: Fn(M) -> Result<Consumed, EmitError> + Send + Sync + 'static,
        M: 'static,
    {
        let mut options = options.into();
        if options.strict_topic_filtering.is_none() {
            options.strict_topic_filtering = Some(self.default_strict);
        }

        let key = self.registry.insert(Subscription::new(consume, options));
        let registry = Arc::downgrade(&self.registry);
        RevokeHandle {
            key,
            revoke: Box::new(move || match registry.upgrade() {
                Some(registry) => registry.remove(key),
                None => false,
            }),
        }
    }

    /// Количество живых (не отозванных) подписок.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Отзывает все живые подписки разом, возвращает сколько было.
    pub fn revoke_all(&self) -> usize {
        let removed = self.registry.clear();
        debug!(removed, "all subscriptions revoked");
        removed
    }

    /// Общее количество проходов диспетчеризации.
    pub fn emit_count(&self) -> usize {
        self.registry.emit_count.load(Ordering::Relaxed)
    }

    /// Общее количество вызовов потребителей.
    pub fn delivered_count(&self) -> usize {
        self.registry.delivered_count.load(Ordering::Relaxed)
    }

    /// Отсоединяемая функция эмиссии: дешёвая в клонировании ручка,
    /// разделяющая набор подписок с издателем. Живёт и работает даже
    /// после того, как сам издатель уронен.
    pub fn emitter(&self) -> Emitter<M> {
        Emitter {
            registry: self.registry.clone(),
        }
    }
}

impl<M: Clone> Publisher<M> {
    /// Раздаёт сообщение без темы всем совпавшим подпискам.
    pub fn emit(&self, message: M) -> Result<Emission, EmitError> {
        self.registry.dispatch(message, None)
    }

    /// Раздаёт сообщение с темой всем совпавшим подпискам.
    pub fn emit_with_topic(
        &self,
        message: M,
        topic: impl Into<Topic>,
    ) -> Result<Emission, EmitError> {
        self.registry.dispatch(message, Some(topic.into()))
    }
}

impl<M> Default for Publisher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Publisher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscriptions", &self.subscription_count())
            .field("default_strict", &self.default_strict)
            .finish()
    }
}

/// Ручка эмиссии, отделяемая от издателя.
pub struct Emitter<M> {
    registry: Arc<Registry<M>>,
}

impl<M> Clone for Emitter<M> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<M: Clone> Emitter<M> {
    /// Раздаёт сообщение без темы всем совпавшим подпискам.
    pub fn emit(&self, message: M) -> Result<Emission, EmitError> {
        self.registry.dispatch(message, None)
    }

    /// Раздаёт сообщение с темой всем совпавшим подпискам.
    pub fn emit_with_topic(
        &self,
        message: M,
        topic: impl Into<Topic>,
    ) -> Result<Emission, EmitError> {
        self.registry.dispatch(message, Some(topic.into()))
    }
}

impl<M> fmt::Debug for Emitter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscriptions", &self.registry.len())
            .finish()
    }
}

/// Ручка отзыва одной подписки.
///
/// Удаляет ровно ту запись, которую создал породивший её вызов
/// `subscribe`, и никогда — другую запись с равными параметрами.
/// Повторный вызов безопасен и ничего не делает. Ручка держит слабую
/// ссылку на арену: подписки не продлевают жизнь издателю.
pub struct RevokeHandle {
    key: SubscriptionKey,
    revoke: Box<dyn Fn() -> bool + Send + Sync>,
}

impl RevokeHandle {
    /// Отзывает подписку. Возвращает `true`, если запись ещё
    /// существовала, и `false` при повторном вызове или уже
    /// уроненном издателе.
    pub fn revoke(&self) -> bool {
        (self.revoke)()
    }

    /// Ключ подписки в арене издателя.
    pub fn key(&self) -> SubscriptionKey {
        self.key
    }
}

impl fmt::Debug for RevokeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevokeHandle").field("key", &self.key).finish()
    }
}
