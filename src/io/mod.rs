//! Input/output boundary of the crate
//!
//! Everything that touches the file system, the terminal or the command line
//! lives here; the geometry and fragment stages only see in-memory buffers.

/// Command-line parsing and batch processing
pub mod cli;
/// Constants and run parameters
pub mod configuration;
/// Error types and context annotation
pub mod error;
/// Image loading and PNG export
pub mod image;
/// Placement ledger format
pub mod ledger;
/// Dataset folder layout, writing and integrity checks
pub mod output;
/// Progress reporting
pub mod progress;
