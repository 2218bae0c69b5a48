//! Common utility functions.

pub mod data;
pub mod process;
pub mod fs;

// Re-export commonly used items
pub use data::{load_yaml_file, save_yaml_file, deep_merge};
pub use process::{run_script, ProcessOutput};
pub use fs::{expand_path, write_atomic, copy_dir_recursive, prune_empty_dirs, relative_slash_path};
