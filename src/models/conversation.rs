use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parsers::diagnostics::ScanWarning;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: u32,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub text: String,
    pub is_edit: bool,
}

/// Conversation recovered from one chatsync file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLog {
    pub source: String,
    /// File creation time from the file header
    pub timestamp: DateTime<Utc>,
    pub is_empty: bool,
    pub participants: Option<[String; 2]>,
    pub conversation: Vec<ConversationMessage>,
    /// Messages that had the expected shape but whose text could not be decoded
    pub errors: usize,
    pub warnings: Vec<ScanWarning>,
}

impl ChatLog {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn edit_count(&self) -> usize {
        self.conversation.iter().filter(|m| m.is_edit).count()
    }
}
