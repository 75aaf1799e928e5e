use std::{fmt, sync::Arc};

use regex::Regex;

use crate::FilterError;

/// Маршрутизирующая метка сообщения: строка или целое число.
///
/// Сообщение публикуется либо без темы, либо ровно с одной темой.
/// Для шаблонного сопоставления используется строковое представление
/// (`Display`): `Text` — сама строка, `Number` — десятичная запись.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Text(String),
    Number(i64),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Text(s) => f.write_str(s),
            Topic::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Topic {
    fn from(s: &str) -> Self {
        Topic::Text(s.to_string())
    }
}

impl From<String> for Topic {
    fn from(s: String) -> Self {
        Topic::Text(s)
    }
}

impl From<i64> for Topic {
    fn from(n: i64) -> Self {
        Topic::Number(n)
    }
}

/// Шаблон темы подписки.
///
/// Либо точное значение темы (сравнение на равенство), либо регулярное
/// выражение, проверяемое по строковому представлению входящей темы.
/// Проверка регулярным выражением — поиск вхождения, не полное совпадение:
/// якоря `^`/`$` при необходимости указывает сам шаблон.
///
/// Неизменяем после того, как подписка создана.
#[derive(Debug, Clone)]
pub enum TopicPattern {
    /// Точное совпадение значения темы.
    Exact(Topic),
    /// Поиск по регулярному выражению.
    Matching(Regex),
}

impl TopicPattern {
    /// Компилирует регулярное выражение в шаблон темы.
    ///
    /// Некорректное выражение возвращает ошибку нижележащего
    /// движка, обёрнутую в [`FilterError::InvalidPattern`].
    pub fn matching(pattern: &str) -> Result<Self, FilterError> {
        Ok(TopicPattern::Matching(Regex::new(pattern)?))
    }

    /// Шаблон точного совпадения с данной темой.
    pub fn exact(topic: impl Into<Topic>) -> Self {
        TopicPattern::Exact(topic.into())
    }
}

impl From<Topic> for TopicPattern {
    fn from(topic: Topic) -> Self {
        TopicPattern::Exact(topic)
    }
}

impl From<Regex> for TopicPattern {
    fn from(regex: Regex) -> Self {
        TopicPattern::Matching(regex)
    }
}

/// Предикат по содержимому сообщения, независимый от темы.
///
/// Паника внутри предиката не перехватывается и разматывается до
/// вызывающего эмиссию.
pub type ContentFilter<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;

/// Настройки фильтрации, принимаемые при подписке.
///
/// Допустимые формы вызова сводятся к одному типу через `From`:
/// голое значение темы (`&str`, `String`, `i64`, [`Topic`]) или шаблон
/// ([`Regex`], [`TopicPattern`]) — краткая форма, включающая строгую
/// фильтрацию; построенный через методы объект — явная форма;
/// `FilterOptions::default()` — подписка на всё.
pub struct FilterOptions<M> {
    /// Шаблон темы; отсутствие означает «тема не проверяется».
    pub topic_pattern: Option<TopicPattern>,
    /// Строгая фильтрация: сообщение без темы отклоняется, если задан
    /// шаблон. Отсутствие флага трактуется при нормализации как `false`.
    pub strict_topic_filtering: Option<bool>,
    /// Предикат по содержимому сообщения.
    pub content_filter: Option<ContentFilter<M>>,
}

impl<M> Default for FilterOptions<M> {
    fn default() -> Self {
        Self {
            topic_pattern: None,
            strict_topic_filtering: None,
            content_filter: None,
        }
    }
}

impl<M> fmt::Debug for FilterOptions<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("topic_pattern", &self.topic_pattern)
            .field("strict_topic_filtering", &self.strict_topic_filtering)
            .field("content_filter", &self.content_filter.is_some())
            .finish()
    }
}

impl<M> FilterOptions<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Задаёт шаблон темы.
    pub fn topic(mut self, pattern: impl Into<TopicPattern>) -> Self {
        self.topic_pattern = Some(pattern.into());
        self
    }

    /// Задаёт строгую фильтрацию темы.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_topic_filtering = Some(strict);
        self
    }

    /// Задаёт предикат по содержимому.
    pub fn content<F>(mut self, filter: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.content_filter = Some(Arc::new(filter));
        self
    }

    /// Нормализация: приводит любую допустимую форму к каноничной
    /// конфигурации. Матчер темы строится ровно один раз здесь,
    /// а не на каждом сообщении.
    pub(crate) fn resolve(self) -> FilterConfig<M> {
        FilterConfig {
            matcher: self.topic_pattern.map(TopicMatcher::build),
            strict: self.strict_topic_filtering.unwrap_or(false),
            content: self.content_filter,
        }
    }
}

// Краткие формы: голая тема или шаблон эквивалентны
// `{ topic_pattern, strict_topic_filtering: true }`.

impl<M> From<TopicPattern> for FilterOptions<M> {
    fn from(pattern: TopicPattern) -> Self {
        FilterOptions {
            topic_pattern: Some(pattern),
            strict_topic_filtering: Some(true),
            content_filter: None,
        }
    }
}

impl<M> From<Topic> for FilterOptions<M> {
    fn from(topic: Topic) -> Self {
        TopicPattern::Exact(topic).into()
    }
}

impl<M> From<&str> for FilterOptions<M> {
    fn from(s: &str) -> Self {
        Topic::from(s).into()
    }
}

impl<M> From<String> for FilterOptions<M> {
    fn from(s: String) -> Self {
        Topic::from(s).into()
    }
}

impl<M> From<i64> for FilterOptions<M> {
    fn from(n: i64) -> Self {
        Topic::from(n).into()
    }
}

impl<M> From<Regex> for FilterOptions<M> {
    fn from(regex: Regex) -> Self {
        TopicPattern::Matching(regex).into()
    }
}

/// Каноничная конфигурация фильтра после нормализации.
pub(crate) struct FilterConfig<M> {
    pub(crate) matcher: Option<TopicMatcher>,
    pub(crate) strict: bool,
    pub(crate) content: Option<ContentFilter<M>>,
}

/// Предвычисленный матчер темы.
///
/// Вариант выбирается один раз при создании подписки, чтобы не
/// разбирать шаблон заново на каждом сообщении.
#[derive(Debug, Clone)]
pub(crate) enum TopicMatcher {
    Exact(Topic),
    Pattern(Regex),
}

impl TopicMatcher {
    fn build(pattern: TopicPattern) -> Self {
        match pattern {
            TopicPattern::Exact(topic) => TopicMatcher::Exact(topic),
            TopicPattern::Matching(regex) => TopicMatcher::Pattern(regex),
        }
    }

    pub(crate) fn accepts(&self, topic: &Topic) -> bool {
        match self {
            TopicMatcher::Exact(expected) => expected == topic,
            TopicMatcher::Pattern(regex) => regex.is_match(&topic.to_string()),
        }
    }
}
