//! Common types, traits, and utilities for sdcgen
//!
//! This crate provides the foundational types shared across the sdcgen
//! workspace: the float width abstraction, error handling, and the
//! generation configuration.

pub mod config;
pub mod error;
pub mod width;

pub use config::*;
pub use error::*;
pub use width::*;
