//! Snapshot persistence and scripts-folder import.

pub mod scripts;
pub mod snapshot;

pub use scripts::load_scripts_folder;
pub use snapshot::{load_snapshot, save_snapshot, SNAPSHOT_VERSION};
