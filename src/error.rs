use alloy_primitives::Selector;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Decoding error: {0}")]
    Decoding(#[from] DecodingError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Value out of range for {ty}: {msg}")]
    OutOfRange { ty: String, msg: String },

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Block {0} is referenced but was never placed")]
    UnplacedBlock(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodingError {
    #[error("Not enough data in the buf: expected at least {expected} bytes, found {found}. {msg}")]
    TruncatedInput {
        expected: usize,
        found: usize,
        msg: String,
    },

    #[error("Invalid pointer at byte {at}: {msg}")]
    InvalidPointer { at: usize, msg: String },

    #[error("Invalid data encountered during decoding: {0}")]
    InvalidData(String),

    #[error("Selector mismatch: expected {expected}, found {found}")]
    SelectorMismatch { expected: Selector, found: Selector },
}

impl CodecError {
    pub(crate) fn schema_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        EncodingError::SchemaMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
        .into()
    }

    pub(crate) fn out_of_range(ty: impl ToString, msg: impl Into<String>) -> Self {
        EncodingError::OutOfRange {
            ty: ty.to_string(),
            msg: msg.into(),
        }
        .into()
    }

    pub(crate) fn truncated(expected: usize, found: usize, msg: impl Into<String>) -> Self {
        DecodingError::TruncatedInput {
            expected,
            found,
            msg: msg.into(),
        }
        .into()
    }

    pub(crate) fn invalid_pointer(at: usize, msg: impl Into<String>) -> Self {
        DecodingError::InvalidPointer {
            at,
            msg: msg.into(),
        }
        .into()
    }

    pub(crate) fn invalid_data(msg: impl Into<String>) -> Self {
        DecodingError::InvalidData(msg.into()).into()
    }
}

pub type Result<T, E = CodecError> = core::result::Result<T, E>;
