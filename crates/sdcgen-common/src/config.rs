//! Generation configuration file format.
//!
//! Loads [`GenerationConfig`] from a TOML file (`sdcgen.toml`) with
//! environment variable overrides via `SDCGEN_*` prefixed variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::width::BitWidth;

/// Number of registered scalar functions (`0 = sin`, `1 = cos`).
pub const FUNCTION_COUNT: usize = 2;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. `info`, `sdcgen_core=debug`).
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Destination of the three parallel feature streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raw cell sums.
    pub raw: PathBuf,
    /// High words of the split products.
    pub high: PathBuf,
    /// Low words of the split products.
    pub low: PathBuf,
    /// Optional directory receiving CSV dumps of the norm grids.
    pub dump_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw: PathBuf::from("features_raw.txt"),
            high: PathBuf::from("features_high.txt"),
            low: PathBuf::from("features_low.txt"),
            dump_dir: None,
        }
    }
}

/// Parameters of one clean + corrupted generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Float representation.
    /// Override: `SDCGEN_WIDTH`
    pub width: BitWidth,

    /// Index into the scalar function registry.
    pub function: usize,

    /// Lower bound of the input domain.
    pub input_low: f64,

    /// Upper bound of the input domain (exclusive).
    pub input_high: f64,

    /// Coarse blocks per axis (H). One feature row is emitted per block.
    pub blocks: usize,

    /// Aggregation cells per block per axis (L).
    pub block_cells: usize,

    /// Side of the fine input grid (A).
    pub side: usize,

    /// Lowest bit index eligible for a flip.
    pub fault_low_bit: u32,

    /// Highest bit index eligible for a flip.
    pub fault_high_bit: u32,

    /// Total faults, spread evenly over the H×H blocks.
    /// Override: `SDCGEN_FAULT_COUNT`
    pub fault_count: usize,

    /// Integer multiplier applied to each bit-cast cell sum.
    /// Override: `SDCGEN_MULTIPLIER`
    pub multiplier: i64,

    /// RNG seed; `None` draws one from OS entropy.
    /// Override: `SDCGEN_SEED`
    pub seed: Option<u64>,

    pub output: OutputConfig,

    pub logging: LoggingConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: BitWidth::F32,
            function: 0,
            input_low: -std::f64::consts::PI,
            input_high: std::f64::consts::PI,
            blocks: 3,
            block_cells: 3,
            side: 90,
            fault_low_bit: 0,
            fault_high_bit: 22,
            fault_count: 9,
            multiplier: 3,
            seed: None,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Errors that can occur when loading or validating a [`GenerationConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride { key: String, value: String, reason: String },
}

impl GenerationConfig {
    /// Generate a default configuration TOML string.
    pub fn default_toml() -> String {
        let cfg = Self::default();
        toml::to_string_pretty(&cfg).unwrap_or_default()
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields, then apply environment variable overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: GenerationConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load only from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Number of aggregation cells per axis (G = H·L).
    ///
    /// Saturates at `usize::MAX`; `validate()` rejects configurations where
    /// the product overflows.
    pub fn cell_count(&self) -> usize {
        self.blocks.saturating_mul(self.block_cells)
    }

    /// Faults injected into each of the H×H blocks. The remainder of the
    /// integer division is dropped.
    pub fn faults_per_block(&self) -> usize {
        match self.blocks.checked_mul(self.blocks) {
            Some(0) | None => 0,
            Some(blocks) => self.fault_count / blocks,
        }
    }

    /// Validate the configuration, returning an error with a descriptive
    /// message on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.function >= FUNCTION_COUNT {
            return Err(ConfigError::Validation(format!(
                "function must be < {FUNCTION_COUNT}, got {}",
                self.function
            )));
        }
        if !self.input_low.is_finite() || !self.input_high.is_finite() {
            return Err(ConfigError::Validation("input bounds must be finite".into()));
        }
        if self.input_low >= self.input_high {
            return Err(ConfigError::Validation(format!(
                "input_low ({}) must be less than input_high ({})",
                self.input_low, self.input_high
            )));
        }
        if self.blocks == 0 || self.block_cells == 0 {
            return Err(ConfigError::Validation(
                "blocks and block_cells must be > 0".into(),
            ));
        }
        let cells = self.blocks.checked_mul(self.block_cells).ok_or_else(|| {
            ConfigError::Validation(format!(
                "blocks * block_cells overflows ({} x {})",
                self.blocks, self.block_cells
            ))
        })?;
        if self.side == 0 || self.side % cells != 0 {
            return Err(ConfigError::Validation(format!(
                "side ({}) must be a positive multiple of blocks * block_cells ({cells})",
                self.side
            )));
        }
        if self.fault_low_bit > self.fault_high_bit {
            return Err(ConfigError::Validation(format!(
                "fault_low_bit ({}) must be <= fault_high_bit ({})",
                self.fault_low_bit, self.fault_high_bit
            )));
        }
        if self.fault_high_bit >= self.width.bits() {
            return Err(ConfigError::Validation(format!(
                "fault_high_bit ({}) must be < {} for {}",
                self.fault_high_bit,
                self.width.bits(),
                self.width
            )));
        }
        if self.side.checked_mul(self.side).is_none() {
            return Err(ConfigError::Validation(format!(
                "a grid of side {} has more values than can be addressed",
                self.side
            )));
        }
        // block_side <= side, so this cannot overflow once side² fits
        let block_side = self.side / self.blocks;
        let block_population = block_side * block_side;
        if self.faults_per_block() > block_population {
            return Err(ConfigError::Validation(format!(
                "{} faults per block exceed the {block_population} values in each block",
                self.faults_per_block()
            )));
        }
        if !self.width.fits_signed(i128::from(self.multiplier)) {
            return Err(ConfigError::Validation(format!(
                "multiplier ({}) does not fit the signed integer paired with {}",
                self.multiplier, self.width
            )));
        }
        Ok(())
    }

    /// Apply `SDCGEN_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("SDCGEN_WIDTH") {
            self.width = val.parse::<BitWidth>().map_err(|e| ConfigError::EnvOverride {
                key: "SDCGEN_WIDTH".into(),
                value: val.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Ok(val) = std::env::var("SDCGEN_SEED") {
            self.seed = Some(val.parse::<u64>().map_err(|e| ConfigError::EnvOverride {
                key: "SDCGEN_SEED".into(),
                value: val.clone(),
                reason: e.to_string(),
            })?);
        }

        if let Ok(val) = std::env::var("SDCGEN_FAULT_COUNT") {
            self.fault_count = val.parse::<usize>().map_err(|e| ConfigError::EnvOverride {
                key: "SDCGEN_FAULT_COUNT".into(),
                value: val.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Ok(val) = std::env::var("SDCGEN_MULTIPLIER") {
            self.multiplier = val.parse::<i64>().map_err(|e| ConfigError::EnvOverride {
                key: "SDCGEN_MULTIPLIER".into(),
                value: val.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = GenerationConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cell_count(), 9);
        assert_eq!(cfg.faults_per_block(), 1);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = GenerationConfig::default_toml();
        let cfg: GenerationConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg, GenerationConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_toml_partial_uses_defaults() {
        let toml_str = r#"
width = "f64"
side = 18
blocks = 2
fault_high_bit = 51

[output]
raw = "r.txt"
"#;
        let cfg = GenerationConfig::from_toml(toml_str).unwrap();
        assert_eq!(cfg.width, BitWidth::F64);
        assert_eq!(cfg.side, 18);
        assert_eq!(cfg.block_cells, 3);
        assert_eq!(cfg.output.raw, PathBuf::from("r.txt"));
        assert_eq!(cfg.output.high, PathBuf::from("features_high.txt"));
    }

    #[test]
    fn test_rejects_indivisible_side() {
        let cfg = GenerationConfig { side: 91, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_inverted_bit_range() {
        let cfg = GenerationConfig { fault_low_bit: 5, fault_high_bit: 4, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_high_bit_beyond_width() {
        let cfg = GenerationConfig { fault_high_bit: 32, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = GenerationConfig { width: BitWidth::F64, fault_high_bit: 32, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_domain() {
        let cfg = GenerationConfig { input_low: 1.0, input_high: 1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_fault_budget() {
        // 3x3 blocks of 2x2 values: at most 4 faults per block.
        let cfg = GenerationConfig {
            side: 6,
            blocks: 3,
            block_cells: 1,
            fault_count: 45,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = GenerationConfig { fault_count: 36, ..cfg };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_multiplier_outside_width() {
        let cfg = GenerationConfig { multiplier: i64::from(i32::MAX) + 1, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = GenerationConfig { width: BitWidth::F64, ..cfg };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_function() {
        let cfg = GenerationConfig { function: FUNCTION_COUNT, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_overflowing_sizes() {
        let cfg = GenerationConfig {
            blocks: usize::MAX / 2 + 1,
            block_cells: 2,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
        assert_eq!(cfg.cell_count(), usize::MAX);
        assert_eq!(cfg.faults_per_block(), 0);

        let side = 1usize << (usize::BITS / 2);
        let cfg = GenerationConfig { side, blocks: 1, block_cells: 1, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));

        let cfg = GenerationConfig { blocks: side, block_cells: 1, side, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sdcgen.toml");
        std::fs::write(&path, "function = 1\nmultiplier = -5\nseed = 8\n").unwrap();

        let cfg = GenerationConfig::load(&path).unwrap();
        assert_eq!(cfg.function, 1);
        assert_eq!(cfg.multiplier, -5);
        assert_eq!(cfg.seed, Some(8));
        assert_eq!(cfg.side, 90);

        std::fs::write(&path, "side = 91\n").unwrap();
        assert!(matches!(GenerationConfig::load(&path), Err(ConfigError::Validation(_))));

        std::fs::write(&path, "side = \"ninety\"\n").unwrap();
        assert!(matches!(GenerationConfig::load(&path), Err(ConfigError::Parse(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(GenerationConfig::load(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("SDCGEN_SEED", "42");
        std::env::set_var("SDCGEN_MULTIPLIER", "-7");
        let cfg = GenerationConfig::from_env();
        std::env::remove_var("SDCGEN_SEED");
        std::env::remove_var("SDCGEN_MULTIPLIER");

        let cfg = cfg.unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.multiplier, -7);
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_value() {
        std::env::set_var("SDCGEN_WIDTH", "f16");
        let result = GenerationConfig::from_env();
        std::env::remove_var("SDCGEN_WIDTH");

        match result {
            Err(ConfigError::EnvOverride { key, value, .. }) => {
                assert_eq!(key, "SDCGEN_WIDTH");
                assert_eq!(value, "f16");
            }
            other => panic!("expected EnvOverride error, got {other:?}"),
        }
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
