//! Configuration management for the transceiver connector
//!
//! This crate provides configuration loading and parsing:
//! - TOML configuration file parsing
//! - Stack configuration structures and validation

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;
