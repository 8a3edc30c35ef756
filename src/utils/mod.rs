pub mod environment;
pub mod paths;
pub mod terminal;

pub use environment::get_chatsync_dir;
pub use paths::{safe_open_file, validate_file_size, validate_path_not_symlink};
pub use terminal::sanitize_for_terminal;
