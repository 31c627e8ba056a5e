//! Crate-level error type.

use thiserror::Error;

use crate::cartridge::CartridgeError;
use crate::cpu::CpuError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cartridge: {0}")]
    Cartridge(#[from] CartridgeError),
    #[error("cpu: {0}")]
    Cpu(#[from] CpuError),
}

pub type Result<T> = std::result::Result<T, Error>;
