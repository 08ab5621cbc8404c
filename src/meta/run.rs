use chrono::{DateTime, FixedOffset};

/// Metadata describing the experiment that does not belong in any other section
/// that covers some default options.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MassSpectrometryRun {
    pub id: Option<String>,
    pub default_data_processing_id: Option<String>,
    pub default_instrument_id: Option<u32>,
    pub default_source_file_id: Option<String>,
    pub start_time: Option<DateTime<FixedOffset>>,
}
