//! Chatsync Reader - Recover conversation history from Skype chatsync files
//!
//! Skype stored conversation history in undocumented binary `chatsync/*/*.dat` files. This
//! library reads them on a best-effort basis:
//!
//! - Scanning the container structure (file header, blocks, records, tagged fields, messages)
//! - Recovering participants, authors, message text and edit flags from the scanned tree
//! - Parsing whole profile directories while isolating per-file failures
//!
//! The format is only partly understood. Inconsistencies that can be tolerated are reported as
//! warnings; a single undecodable message is skipped and counted.
//!
//! # Example
//!
//! ```no_run
//! use chatsync_reader::parse_chatsync_profile_dir;
//! use std::path::PathBuf;
//!
//! let chatsync_dir = PathBuf::from("/home/alice/.Skype/alice/chatsync");
//! for log in parse_chatsync_profile_dir(&chatsync_dir)? {
//!     println!("{}: {} messages", log.source, log.conversation.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod models;
pub mod parsers;
pub mod profile;
pub mod utils;

// Re-export commonly used types
pub use models::{ChatLog, ConversationMessage, ScanResult};
pub use parsers::{ChatSyncError, ChatSyncScanner, ScanLimits, parse_conversation};
pub use profile::{load_profile_dir, parse_chatsync_file, parse_chatsync_profile_dir};
