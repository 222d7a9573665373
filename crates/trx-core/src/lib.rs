//! Core utilities for the GSM transceiver connector
//!
//! This crate provides fundamental types and utilities used across the stack:
//! - FrameNumber for TDMA frame arithmetic over the hyperframe
//! - Burst geometry, training sequences and soft-bit conversion
//! - Physical channel configurations and band/ARFCN frequency mapping
//! - Logging setup and debug macros

use const_format::concatcp;
use git_version::git_version;

pub mod arfcn;
pub mod burst;
pub mod debug;
pub mod direction;
pub mod frame_number;
pub mod pchan;

// Re-export commonly used items
pub use burst::{SoftBit, UBit};
pub use direction::Direction;
pub use frame_number::FrameNumber;
pub use pchan::PchanConfig;

/// Version string reported in the startup banner and logs
pub const STACK_VERSION: &str = concatcp!(
    env!("CARGO_PKG_VERSION"),
    "-",
    git_version!(args = ["--always", "--dirty=-modified"], fallback = "unknown")
);

/// Number of timeslots on one radio carrier
pub const TRX_TS_COUNT: usize = 8;
