/// Library settings loading.
pub mod config;
/// Common error types: filter configuration, message delivery.
pub mod error;
/// Logging initialization (tracing, env filters, console sink).
pub mod logging;
/// Pub/Sub: Publisher, Subscription, Emitter, filtering.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use crate::config::Settings;
/// Operation errors.
pub use error::{EmitError, FilterError};
/// Pub/Sub API.
pub use pubsub::{
    Consumed, ContentFilter, Emission, Emitter, FilterOptions, Publisher, RevokeHandle,
    Subscription, Topic, TopicPattern,
};
