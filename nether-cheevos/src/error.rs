//! Error types for script parsing and state handling

/// Errors produced while sizing or parsing a script, or while attaching a
/// state buffer to a parsed definition.
///
/// Evaluation never fails: every malformed script is rejected here, before
/// any byte of a caller's buffer is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid custom operand")]
    InvalidCustomOperand,

    #[error("Invalid memory operand")]
    InvalidMemoryOperand,

    #[error("Invalid constant operand")]
    InvalidConstOperand,

    #[error("Invalid floating-point operand")]
    InvalidFpOperand,

    #[error("Invalid condition type")]
    InvalidConditionType,

    #[error("Invalid operator")]
    InvalidOperator,

    #[error("Invalid required hits")]
    InvalidRequiredHits,

    #[error("Duplicated start condition")]
    DuplicatedStart,

    #[error("Duplicated cancel condition")]
    DuplicatedCancel,

    #[error("Duplicated submit condition")]
    DuplicatedSubmit,

    #[error("Duplicated value expression")]
    DuplicatedValue,

    #[error("Duplicated progress expression")]
    DuplicatedProgress,

    #[error("Missing start condition")]
    MissingStart,

    #[error("Missing cancel condition")]
    MissingCancel,

    #[error("Missing submit condition")]
    MissingSubmit,

    #[error("Missing value expression")]
    MissingValue,

    #[error("Invalid field in leaderboard")]
    InvalidLboardField,

    #[error("Missing display string")]
    MissingDisplayString,

    #[error("Multiple measured targets")]
    MultipleMeasured,

    #[error("Invalid lookup key")]
    InvalidLookupKey,

    #[error("Unexpected end of script")]
    UnexpectedEnd,

    #[error("Unexpected character at offset {0}")]
    UnexpectedInput(usize),

    #[error("Buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("State does not match this definition")]
    InvalidState,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
