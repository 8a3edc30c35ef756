//! Scanner and parser for Skype chatsync files
//!
//! # Error Handling Strategy
//!
//! The chatsync format was reverse-engineered and is only partly understood, so this module
//! distinguishes three severities:
//!
//! - **Fatal** ([`ChatSyncError`]): conditions after which the byte stream cannot be interpreted
//!   (bad file or record signature, unknown field tag, truncated input, block type outside 1..6,
//!   missing or duplicate message block). Scanning or parsing of the file stops.
//!
//! - **Warnings** ([`ScanWarning`]): declared sizes that disagree with what was read, nonzero
//!   padding, unexpected block sets. They are collected in [`Diagnostics`] and returned with the
//!   scan result; the scan continues.
//!
//! - **Per-message failures** ([`MessageTextError`]): a message whose text cannot be recovered is
//!   skipped and counted in [`ChatLog::errors`](crate::models::ChatLog::errors).
//!
//! Nothing in this module prints. Reporting is left to the caller (see [`crate::profile`]).

pub mod conversation;
pub mod diagnostics;
pub mod error;
pub mod primitives;
pub mod scanner;

pub use conversation::{extract_message_text, parse_conversation, parse_participants};
pub use diagnostics::{Diagnostics, ScanWarning, WarningKind};
pub use error::{ChatSyncError, MessageTextError};
pub use scanner::{ChatSyncScanner, ScanLimits};
