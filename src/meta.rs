//! Metadata describing the run a list of spectra and chromatograms came from.
mod data_processing;
mod file_description;
mod instrument;
mod run;
mod software;
mod traits;

pub use data_processing::{DataProcessing, ProcessingMethod};
pub use file_description::{FileDescription, SourceFile};
pub use instrument::InstrumentConfiguration;
pub use run::MassSpectrometryRun;
pub use software::Software;
pub use traits::MSDataFileMetadata;
