//! Data models for chatsync files.
//!
//! - [`structure`] - the structural tree as laid out on disk (header, blocks, records, fields)
//! - [`ChatLog`] / [`ConversationMessage`] - the conversation recovered from that tree
//!
//! Structural nodes are plain data. The output models derive serde so callers can hand them to
//! a viewer or dump them as JSON.

pub mod conversation;
pub mod structure;

pub use conversation::{ChatLog, ConversationMessage};
pub use structure::{
    Block, BlockData, BlockEntry, BlockHeader, Field, FieldType, FieldValue, FileHeader, Message,
    MessageHeader, Record, ScanResult,
};
