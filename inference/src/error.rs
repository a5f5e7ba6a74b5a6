//! Internal scanner faults.
//!
//! None of these ever reach a caller of [`get_schema`](crate::get_schema):
//! the schema service downgrades every fault to the default schema.

use thiserror::Error;

/// Faults raised while scanning masked config text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The delimiter opened at this offset is never closed, or a closer of
    /// the wrong kind appears before its own.
    #[error("unbalanced delimiter opened at byte {0}")]
    Unbalanced(usize),

    /// Delimiter matching was asked about a byte that does not open a pair.
    #[error("byte {0} is not an opening delimiter")]
    NotAnOpener(usize),

    /// Masking produced invalid UTF-8.
    #[error("masked source is not valid UTF-8")]
    InvalidMask,
}
