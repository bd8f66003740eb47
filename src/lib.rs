//! Packs rectangular countertop pieces onto as few stock slabs as possible.
//!
//! Pieces are first preprocessed (kerf added, over-long pieces split into
//! sections), then laid out by one of five algorithms: three greedy
//! guillotine variants, an exact branch-and-bound search and a genetic
//! search. [`solver::Solver`] is the entry point.

pub mod compare;
pub mod config;
pub mod error;
pub mod exact;
pub mod genetic;
pub mod guillotine;
pub mod layout;
pub mod orientation;
pub mod preprocess;
pub mod presets;
pub mod progress;
pub mod solver;
pub mod spaces;
pub mod types;

pub use config::OptimizerConfig;
pub use error::{OptimizeError, Result};
pub use solver::Solver;
pub use types::{Algorithm, PieceRequest, Solution};
