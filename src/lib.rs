pub mod command;
pub mod config;
pub mod contact;
pub mod database;
pub mod server;
pub mod store;
pub mod validate;

use std::env::var_os;
use std::path::PathBuf;

use crate::validate::ValidationError;

pub fn data_path_from_env() -> Option<PathBuf> {
    var_os("DATA_PATH").map(Into::into)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0:#}")]
    Persistence(#[from] anyhow::Error),
}
