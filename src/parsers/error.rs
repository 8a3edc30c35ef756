//! Error types for chatsync parsing
//!
//! [`ChatSyncError`] aborts the scan or parse of one file. [`MessageTextError`] only ever
//! causes a single message to be skipped.

use std::io;
use std::str::Utf8Error;

use thiserror::Error;

/// Fatal errors: the file cannot be turned into a chat log
#[derive(Error, Debug)]
pub enum ChatSyncError {
    #[error("Invalid signature {found:02x?}")]
    InvalidSignature { found: [u8; 5] },

    #[error("File too short while scanning {what}: expected {expected} bytes, got {actual}")]
    ShortRead { what: &'static str, expected: usize, actual: usize },

    #[error("Unexpected end of file while scanning {what}")]
    UnexpectedEof { what: &'static str },

    #[error("7-bit integer does not fit in 64 bits")]
    VarIntOverflow,

    #[error("Block #{index} has invalid type {block_type}")]
    InvalidBlockType { index: usize, block_type: u32 },

    #[error("Record expected to start with 'A', found {found:#04x}")]
    InvalidRecordSignature { found: u8 },

    #[error("Field of unexpected type {0} detected")]
    UnknownFieldType(u8),

    #[error("Expected exactly one block of type 6, found {0}")]
    MessageBlockCount(usize),

    #[error("Resource limit exceeded: more than {limit} {what}")]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("Malformed participant list: {0:?}")]
    MalformedParticipants(String),

    #[error("Unexpected block layout: {0}")]
    UnexpectedLayout(&'static str),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),
}

impl ChatSyncError {
    /// True for errors caused by the stream ending early
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::ShortRead { .. } | Self::UnexpectedEof { .. })
    }
}

/// Why the text of a single message could not be recovered
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MessageTextError {
    #[error("no text marker found")]
    MissingMarker,

    #[error("text field does not hold bytes")]
    NotBytes,

    #[error("text is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
}
