//! The generic spectrum and chromatogram records WIFF data is translated into.
pub mod arrays;
pub mod chromatogram;
pub mod scan_properties;
#[allow(clippy::module_inception)]
pub mod spectrum;

pub use crate::spectrum::arrays::{ArrayType, BinaryArrayMap, DataArray};
pub use crate::spectrum::chromatogram::Chromatogram;
pub use crate::spectrum::scan_properties::*;
pub use crate::spectrum::spectrum::Spectrum;
