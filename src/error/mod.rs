pub mod pubsub;

pub use pubsub::{EmitError, FilterError};
