//! Error types for id generation.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The clock reported a time before the last generated id.
    #[error("clock moved backwards: last id at {last_millis}ms, clock now at {now_millis}ms")]
    ClockMovedBackwards { last_millis: i64, now_millis: i64 },

    /// The clock is outside the range the timestamp bits can hold.
    #[error("timestamp {millis}ms is outside the generator's range (epoch {epoch_millis}ms)")]
    TimestampOutOfRange { millis: i64, epoch_millis: i64 },

    /// A datacenter or worker id does not fit its bit field.
    #[error("invalid {field} {value}: must be at most {max}")]
    InvalidNode {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// No generator is registered.
    #[error("no id generator registered")]
    FactoryMissing,

    /// No generator is registered under the key.
    #[error("no id generator registered under key {0}")]
    UnknownGenerator(u32),
}

pub type Result<T> = std::result::Result<T, IdError>;
