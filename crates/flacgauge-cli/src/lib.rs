//! FLAC decoder regression harness CLI library.
//!
//! Command implementations live here; the binary in `main.rs` only parses
//! arguments and dispatches.

pub mod cli_args;
pub mod commands;
