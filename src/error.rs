use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The program image does not fit in the core's program memory. The core is
/// left exactly as it was before the load was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("program is {size} bytes but program memory holds {capacity}")]
pub struct OversizedProgram {
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    OversizedProgram(#[from] OversizedProgram),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid register snapshot: {0}")]
    Registers(toml::de::Error),
}
