//! sdcgen CLI library
//!
//! This library exposes the command implementations for testing purposes.

pub mod commands;
pub mod exit;
pub mod logging;
