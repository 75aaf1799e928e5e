use std::fmt;

use super::{
    filter::{ContentFilter, TopicMatcher},
    Consumed, FilterOptions, Topic,
};
use crate::EmitError;

/// Функция-потребитель: принимает сообщение и сообщает, завершилась
/// обработка синхронно ([`Consumed::Done`]) или продолжается в
/// отложенном future ([`Consumed::Pending`]).
pub type ConsumeFn<M> = Box<dyn Fn(M) -> Result<Consumed, EmitError> + Send + Sync>;

/// Одна подписка: потребитель плюс правило отбора сообщений.
///
/// Неизменяема после создания; матчер темы предвычислен в конструкторе
/// и не перестраивается на каждом сообщении. Подписка не знает о своём
/// издателе — удалением занимается только ручка отзыва.
pub struct Subscription<M> {
    consume: ConsumeFn<M>,
    matcher: Option<TopicMatcher>,
    strict: bool,
    content: Option<ContentFilter<M>>,
}

impl<M> Subscription<M> {
    /// Создаёт подписку из потребителя и настроек фильтра
    /// (любая из допустимых форм, см. [`FilterOptions`]).
    pub fn new<F>(consume: F, options: impl Into<FilterOptions<M>>) -> Self
    where
        F: Fn(M) -> Result<Consumed, EmitError> + Send + Sync + 'static,
    {
        let config = options.into().resolve();
        Self {
            consume: Box::new(consume),
            matcher: config.matcher,
            strict: config.strict,
            content: config.content,
        }
    }

    /// Чистая проверка соответствия: проходит ли сообщение с данной
    /// темой фильтр этой подписки. Побочных эффектов нет, вызывается
    /// сколько угодно раз.
    ///
    /// Правила темы:
    /// - шаблон не задан — тема не проверяется;
    /// - шаблон задан, темы нет — проходит только при нестрогой
    ///   фильтрации;
    /// - задано и то и другое — решает предвычисленный матчер.
    ///
    /// Предикат содержимого вызывается только если проверка темы
    /// прошла, чтобы не дёргать пользовательский код впустую.
    pub fn matches(&self, message: &M, topic: Option<&Topic>) -> bool {
        let topic_ok = match (&self.matcher, topic) {
            (None, _) => true,
            (Some(_), None) => !self.strict,
            (Some(matcher), Some(topic)) => matcher.accepts(topic),
        };
        if !topic_ok {
            return false;
        }
        match &self.content {
            None => true,
            Some(filter) => filter(message),
        }
    }

    /// Вызывает потребителя с сообщением.
    pub(crate) fn consume(&self, message: M) -> Result<Consumed, EmitError> {
        (self.consume)(message)
    }
}

impl<M> fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("matcher", &self.matcher)
            .field("strict", &self.strict)
            .field("content_filter", &self.content.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::TopicPattern;

    fn noop(_: &'static str) -> Result<Consumed, EmitError> {
        Ok(Consumed::Done)
    }

    /// Тест проверяет, что подписка без шаблона темы принимает любое
    /// сообщение с любой темой и без неё, независимо от строгости.
    #[test]
    fn test_no_pattern_matches_everything() {
        let strict = Subscription::new(noop, FilterOptions::new().strict(true));
        let lenient = Subscription::new(noop, FilterOptions::default());

        for sub in [&strict, &lenient] {
            assert!(sub.matches(&"msg", None));
            assert!(sub.matches(&"msg", Some(&Topic::from("anything"))));
            assert!(sub.matches(&"msg", Some(&Topic::from(99))));
        }
    }

    /// Тест проверяет точный шаблон при строгой фильтрации:
    /// без темы — отказ, своя тема — да, чужая — нет.
    #[test]
    fn test_exact_pattern_strict() {
        let sub = Subscription::new(noop, "topic1");
        assert!(!sub.matches(&"msg", None));
        assert!(sub.matches(&"msg", Some(&Topic::from("topic1"))));
        assert!(!sub.matches(&"msg", Some(&Topic::from("topic2"))));
    }

    /// Тест проверяет, что при нестрогой фильтрации сообщение без
    /// темы проходит независимо от шаблона.
    #[test]
    fn test_pattern_lenient_accepts_untagged() {
        let sub = Subscription::new(
            noop,
            FilterOptions::new()
                .topic(TopicPattern::exact("topic1"))
                .strict(false),
        );
        assert!(sub.matches(&"msg", None));
        assert!(sub.matches(&"msg", Some(&Topic::from("topic1"))));
        assert!(!sub.matches(&"msg", Some(&Topic::from("other"))));
    }

    /// Тест проверяет регулярный шаблон по строковой форме темы.
    #[test]
    fn test_regex_pattern() {
        let sub = Subscription::new(noop, TopicPattern::matching(r"^test-\d+$").unwrap());
        assert!(sub.matches(&"msg", Some(&Topic::from("test-123"))));
        assert!(!sub.matches(&"msg", Some(&Topic::from("test-abc"))));
    }

    /// Тест проверяет числовую тему: точное совпадение по значению.
    #[test]
    fn test_numeric_topic_exact() {
        let sub = Subscription::new(noop, 42i64);
        assert!(sub.matches(&"msg", Some(&Topic::from(42))));
        assert!(!sub.matches(&"msg", Some(&Topic::from(43))));
        // строковая тема "42" — другое значение
        assert!(!sub.matches(&"msg", Some(&Topic::from("42"))));
    }

    /// Тест проверяет предикат содержимого сам по себе.
    #[test]
    fn test_content_filter_alone() {
        let sub = Subscription::new(
            |_: serde_json::Value| Ok(Consumed::Done),
            FilterOptions::new().content(|m: &serde_json::Value| m.is_string()),
        );
        assert!(sub.matches(&serde_json::json!("hello"), None));
        assert!(!sub.matches(&serde_json::json!(42), None));
    }

    /// Тест проверяет композицию: и тема, и содержимое должны пройти.
    #[test]
    fn test_topic_and_content_compose() {
        let sub = Subscription::new(
            |_: serde_json::Value| Ok(Consumed::Done),
            FilterOptions::new()
                .topic(TopicPattern::exact("events"))
                .strict(true)
                .content(|m: &serde_json::Value| m.is_string()),
        );
        let events = Topic::from("events");
        assert!(sub.matches(&serde_json::json!("hello"), Some(&events)));
        assert!(!sub.matches(&serde_json::json!(42), Some(&events)));
        assert!(!sub.matches(&serde_json::json!("hello"), Some(&Topic::from("other"))));
        assert!(!sub.matches(&serde_json::json!("hello"), None));
    }

    /// Тест проверяет короткое замыкание: при непрошедшей теме
    /// предикат содержимого не вызывается.
    #[test]
    fn test_content_filter_short_circuit() {
        use std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        };

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let sub = Subscription::new(
            noop,
            FilterOptions::new()
                .topic(TopicPattern::exact("topic1"))
                .strict(true)
                .content(move |_: &&'static str| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    true
                }),
        );

        assert!(!sub.matches(&"msg", Some(&Topic::from("wrong"))));
        assert!(!sub.matches(&"msg", None));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(sub.matches(&"msg", Some(&Topic::from("topic1"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
