//! Error types for sdcgen

use thiserror::Error;

use crate::config::ConfigError;
use crate::width::BitWidth;

/// Main error type for the generator.
///
/// Every variant except `Io` and `Parse` describes a precondition violation:
/// the operation that returns it has not mutated any of its inputs.
#[derive(Error, Debug)]
pub enum SdcError {
    #[error("Invalid bit range [{low}, {high}] for {width} (bits must satisfy low <= high < {bits})", bits = .width.bits())]
    InvalidBitRange { low: u32, high: u32, width: BitWidth },

    #[error("Fault budget {requested} exceeds population of {population}")]
    FaultBudgetExceeded { requested: usize, population: usize },

    #[error(
        "Sub-region rows {row_start}..{row_end}, cols {col_start}..{col_end} is empty or outside a {rows}x{cols} grid"
    )]
    RegionOutOfBounds {
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Grid side {side} is not divisible into {cells} cells per axis")]
    IndivisibleGrid { side: usize, cells: usize },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Invalid input domain: low ({low}) must be less than high ({high})")]
    InvalidDomain { low: f64, high: f64 },

    #[error("Multiplier {value} does not fit the signed integer paired with {width}")]
    InvalidMultiplier { value: i128, width: BitWidth },

    #[error("Unknown scalar function index {index} (registry has {available})")]
    UnknownFunction { index: usize, available: usize },

    #[error("Invalid float width: {0}")]
    InvalidWidth(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdcError {
    /// Whether the error describes a rejected configuration or caller
    /// contract violation rather than an I/O or data failure.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Parse { .. })
    }
}

/// Result type alias for sdcgen operations
pub type Result<T> = std::result::Result<T, SdcError>;
