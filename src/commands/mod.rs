//! CLI subcommands

pub mod ask;
pub mod clear;
pub mod restaurants;
pub mod status;
pub mod upload;

use std::path::PathBuf;

/// Database location, relative to the working directory
pub fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("askmenu.db")
}
