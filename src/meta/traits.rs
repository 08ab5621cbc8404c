use std::collections::HashMap;

use super::{
    DataProcessing, FileDescription, InstrumentConfiguration, MassSpectrometryRun, Software,
};

/// Common access to the run-level metadata of a data source
pub trait MSDataFileMetadata {
    fn data_processings(&self) -> &Vec<DataProcessing>;
    fn instrument_configurations(&self) -> &HashMap<u32, InstrumentConfiguration>;
    fn file_description(&self) -> &FileDescription;
    fn softwares(&self) -> &Vec<Software>;

    fn run_description(&self) -> Option<&MassSpectrometryRun> {
        None
    }

    /// The name of the file the run was read from, if known
    fn source_file_name(&self) -> Option<&str> {
        None
    }

    /// A hint for the number of spectra, which may require building an index
    fn spectrum_count_hint(&self) -> Option<u64> {
        None
    }
}
