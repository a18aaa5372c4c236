//! End-to-end fragmentation and reconstruction
//!
//! The executor chains the geometry and fragment stages for one image and
//! hands the result to the dataset writer. The reconstructor reads a
//! dataset back and composites it over the original.

/// Stage sequencing for one image
pub mod executor;
/// Ledger-driven compositing of a dataset
pub mod reconstruction;

pub use executor::{Dataset, FragmentationOutcome, Fragmenter, StageOptions};
pub use reconstruction::{Reconstruction, reconstruct, reconstruct_dataset};
