//! Error types for edgestamp shared types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("Hex encoding error: {0}")]
    HexEncoding(#[from] hex::FromHexError),
}
