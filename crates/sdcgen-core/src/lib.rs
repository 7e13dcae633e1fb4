//! Core algorithms for synthesising silent-data-corruption training data
//!
//! This crate provides the bit-exact pieces of the generator:
//! - `bitcast`: float ⇄ integer reinterpretation that preserves every bit
//! - `split`: high/low decomposition of double-width products
//! - `fault`: collision-free single-bit fault injection
//! - `aggregate`: reduction of a fine grid to coarse cell sums
//!
//! and the glue that turns them into labeled feature files (`features`,
//! `pipeline`), plus the `compare` report and the `filter` post-processor.
//!
//! Every function is generic over [`FloatWidth`], so the 32-bit and 64-bit
//! generators share one code path.

pub mod aggregate;
pub mod bitcast;
pub mod compare;
pub mod fault;
pub mod features;
pub mod filter;
pub mod grid;
pub mod input;
pub mod pipeline;
pub mod split;

pub use aggregate::aggregate;
pub use compare::{compare, CompareParams, CompareRow};
pub use fault::{flip_bit, FaultInjector, FaultRecord};
pub use features::{FeatureEmitter, FeatureRow, FeatureSink, Label};
pub use filter::{FilterSummary, TauFilter};
pub use grid::{CellPartition, Grid, SubRegion};
pub use input::{generate_grid, generate_ramp, ScalarFunction};
pub use pipeline::{generate, run, seeded_rng, GeneratedExamples, GenerationReport};
pub use split::{split, split_array, split_grid, SplitWord};

pub use sdcgen_common::{BitWidth, FloatWidth, Result, SdcError};
