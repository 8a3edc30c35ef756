//! Reading chatsync files from disk
//!
//! - [`discovery`] finds `*/*.dat` candidates in a profile's chatsync directory
//! - [`loader`] runs scanner and parser per file and isolates failures per file

pub mod discovery;
pub mod loader;

pub use discovery::discover_chatsync_files;
pub use loader::{
    FileFailure, ProfileLoad, load_profile_dir, parse_chatsync_file,
    parse_chatsync_file_with_limits, parse_chatsync_profile_dir,
};
