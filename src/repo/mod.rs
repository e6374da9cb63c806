//! Repository acquisition and file discovery.
//!
//! Turns a user-supplied path or clone URL into a validated, walkable local
//! directory and answers structural questions about it: eligible files,
//! file languages, submodules, commit history.

mod history;
mod language;
mod manager;
mod submodules;
mod walker;

pub use history::commit_history;
pub use language::{file_language, UNKNOWN_LANGUAGE};
pub use manager::RepoManager;
pub use submodules::read_submodules;
pub use walker::IgnoreCache;
