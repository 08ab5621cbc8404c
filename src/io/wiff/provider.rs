//! The capability set a WIFF vendor backend provides.
//!
//! Sample, period and experiment numbers are 1-based as the vendor library reports them;
//! cycle numbers are 1-based too. SRM/SIM transition and ADC trace indices are 0-based.
use std::fmt::Debug;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::spectrum::{ScanPolarity, SpectrumType};

/// A failure reported by the vendor library or the provider wrapping it
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Vendor library error: {0}")]
    Vendor(String),
    #[error("No such {0} in the acquisition")]
    NotFound(String),
    #[error("I/O error in vendor library: {0}")]
    IO(Arc<io::Error>),
}

impl From<io::Error> for ProviderError {
    fn from(value: io::Error) -> Self {
        Self::IO(Arc::new(value))
    }
}

/// The acquisition mode of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExperimentType {
    #[default]
    Unknown,
    /// Full scan MS1
    MS,
    /// Product ion scan
    Product,
    /// Precursor ion scan
    Precursor,
    NeutralGainOrLoss,
    SIM,
    MRM,
}

impl ExperimentType {
    /// The kind of spectrum this experiment produces
    pub fn spectrum_type(&self) -> SpectrumType {
        match self {
            Self::MS => SpectrumType::MS1Spectrum,
            Self::Product => SpectrumType::MSnSpectrum,
            Self::Precursor => SpectrumType::PrecursorIonSpectrum,
            Self::NeutralGainOrLoss => SpectrumType::ConstantNeutralLossSpectrum,
            Self::SIM => SpectrumType::SIMSpectrum,
            Self::MRM => SpectrumType::SRMSpectrum,
            Self::Unknown => SpectrumType::Unknown,
        }
    }
}

/// How a precursor ion was fragmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FragmentationMode {
    #[default]
    CID,
    EAD,
}

/// One SRM or SIM transition of an experiment. `q3` is zero for SIM transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub q1: f64,
    pub q3: f64,
    /// Milliseconds
    pub dwell_time: f64,
    pub collision_energy: f64,
    pub declustering_potential: f64,
}

impl Target {
    pub fn new(q1: f64, q3: f64) -> Self {
        Self {
            q1,
            q3,
            ..Default::default()
        }
    }
}

/// The precursor a spectrum was acquired from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrecursorInfo {
    pub selected_mz: f64,
    pub intensity: f64,
    /// Zero when the charge state is unknown
    pub charge: i32,
}

/// The isolation window reported for a spectrum, as absolute bounds, along with
/// how the isolated ions were activated
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsolationInfo {
    pub center_mz: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub collision_energy: f64,
    /// Electron kinetic energy for electron activated dissociation, zero otherwise
    pub electron_kinetic_energy: f64,
    pub fragmentation_mode: FragmentationMode,
}

impl IsolationInfo {
    pub fn new(center_mz: f64, lower_limit: f64, upper_limit: f64) -> Self {
        Self {
            center_mz,
            lower_limit,
            upper_limit,
            ..Default::default()
        }
    }
}

/// A selected ion chromatogram of one transition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectedIonTrace {
    /// Minutes
    pub times: Vec<f64>,
    pub intensities: Vec<f64>,
    pub base_peak_x: f64,
    pub base_peak_y: f64,
}

/// An auxiliary analog channel recording
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdcTrace {
    /// Minutes
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub units: String,
}

/// A decoded vendor spectrum
pub trait VendorSpectrum: Send + Sync {
    fn ms_level(&self) -> u8;

    /// Minutes
    fn start_time(&self) -> f64;

    fn has_precursor_info(&self) -> bool;
    fn precursor_info(&self) -> Result<PrecursorInfo, ProviderError>;

    fn has_isolation_info(&self) -> bool;
    fn isolation_info(&self) -> Result<IsolationInfo, ProviderError>;

    fn data_is_continuous(&self) -> bool;

    /// The m/z and intensity arrays, optionally centroided and without zero intensity points
    fn data(&self, centroid: bool, ignore_zeros: bool)
        -> Result<(Vec<f64>, Vec<f64>), ProviderError>;

    /// The number of points [`VendorSpectrum::data`] would return
    fn data_size(&self, centroid: bool, ignore_zeros: bool) -> Result<usize, ProviderError>;

    fn sum_y(&self) -> f64;
    fn base_peak_x(&self) -> f64;
    fn base_peak_y(&self) -> f64;
}

/// One experiment of a period of a sample
pub trait Experiment: Send + Sync {
    fn sample_number(&self) -> usize;
    fn period_number(&self) -> usize;
    fn experiment_number(&self) -> usize;

    fn experiment_type(&self) -> ExperimentType;
    fn polarity(&self) -> ScanPolarity;

    /// The (start, stop) m/z range the experiment scans
    fn acquisition_mass_range(&self) -> (f64, f64);

    /// Per-cycle total ion current, as (times, intensities)
    fn tic(&self) -> Result<(Vec<f64>, Vec<f64>), ProviderError>;

    /// Per-cycle base peak intensity, as (times, intensities). May be empty when
    /// the vendor library did not record it.
    fn bpc(&self) -> Result<(Vec<f64>, Vec<f64>), ProviderError>;

    fn srm_count(&self) -> usize;
    fn srm(&self, index: usize) -> Result<Target, ProviderError>;

    fn sim_count(&self) -> usize;
    fn sim(&self, index: usize) -> Result<Target, ProviderError>;

    /// The chromatogram of transition `index`. An experiment is either MRM or SIM, so the
    /// index addresses whichever kind of transition it has.
    fn sic(&self, index: usize) -> Result<SelectedIonTrace, ProviderError>;
}

/// An opened WIFF file
pub trait WiffFile: Send + Sync {
    /// The path the file was opened from
    fn wiff_path(&self) -> &Path;

    fn sample_count(&self) -> usize;
    fn sample_names(&self) -> Vec<String>;
    fn period_count(&self, sample: usize) -> Result<usize, ProviderError>;
    fn experiment_count(&self, sample: usize, period: usize) -> Result<usize, ProviderError>;
    fn cycle_count(
        &self,
        sample: usize,
        period: usize,
        experiment: usize,
    ) -> Result<usize, ProviderError>;

    fn experiment(
        &self,
        sample: usize,
        period: usize,
        experiment: usize,
    ) -> Result<Arc<dyn Experiment>, ProviderError>;

    fn spectrum(
        &self,
        experiment: &Arc<dyn Experiment>,
        cycle: usize,
    ) -> Result<Arc<dyn VendorSpectrum>, ProviderError>;

    fn adc_trace_count(&self, sample: usize) -> Result<usize, ProviderError>;
    fn adc_trace_name(&self, sample: usize, index: usize) -> Result<String, ProviderError>;
    fn adc_trace(&self, sample: usize, index: usize) -> Result<AdcTrace, ProviderError>;

    /// The instrument model name, failing when the vendor library does not know it
    fn instrument_model(&self) -> Result<String, ProviderError>;

    fn sample_acquisition_time(&self, sample: usize) -> Result<Option<DateTime<FixedOffset>>, ProviderError>;
}

/// Opens WIFF files into [`WiffFile`] handles
pub trait WiffBackend: Send + Sync + Debug {
    fn open(&self, path: &Path) -> Result<Arc<dyn WiffFile>, ProviderError>;
}

/// The experiments of one sample, keyed by (period, experiment) in hierarchy order
pub type ExperimentsMap = Vec<((usize, usize), Arc<dyn Experiment>)>;

/// Walk every period and experiment of `sample` once, collecting its experiment handles
pub fn load_experiments(
    file: &dyn WiffFile,
    sample: usize,
) -> Result<ExperimentsMap, ProviderError> {
    let mut experiments = ExperimentsMap::new();
    for period in 1..=file.period_count(sample)? {
        for experiment in 1..=file.experiment_count(sample, period)? {
            experiments.push((
                (period, experiment),
                file.experiment(sample, period, experiment)?,
            ));
        }
    }
    log::trace!(
        "Loaded {} experiments for sample {sample} of {}",
        experiments.len(),
        file.wiff_path().display()
    );
    Ok(experiments)
}
