//! Dataset preparation for the CoronaHack chest X-ray images:
//! fetch the archive, relabel the metadata table, resize the images.

pub mod dataset;
pub mod fetch;
pub mod relabel;
pub mod resize;
pub mod utils;

pub use utils::error::{PrepError, Result};
