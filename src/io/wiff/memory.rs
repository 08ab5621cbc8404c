/*!
A fully in-memory [`WiffFile`] for tests, benchmarks and for feeding data from a vendor
library binding that has already been drained.

Every vendor call that costs something in a real backend is counted in [`CallCounters`],
so callers can check how often a list touches the provider.
*/
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use super::provider::{
    AdcTrace, Experiment, ExperimentType, IsolationInfo, PrecursorInfo, ProviderError,
    SelectedIonTrace, Target, VendorSpectrum, WiffFile,
};
use crate::spectrum::ScanPolarity;

/// Counts of the provider calls a real vendor library would pay for
#[derive(Debug, Default)]
pub struct CallCounters {
    spectrum_decodes: AtomicUsize,
    tic_reads: AtomicUsize,
    bpc_reads: AtomicUsize,
    sic_reads: AtomicUsize,
    adc_trace_listings: AtomicUsize,
}

impl CallCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Calls to [`WiffFile::spectrum`]
    pub fn spectrum_decodes(&self) -> usize {
        self.spectrum_decodes.load(Ordering::SeqCst)
    }

    /// Calls to [`Experiment::tic`]
    pub fn tic_reads(&self) -> usize {
        self.tic_reads.load(Ordering::SeqCst)
    }

    /// Calls to [`Experiment::bpc`]
    pub fn bpc_reads(&self) -> usize {
        self.bpc_reads.load(Ordering::SeqCst)
    }

    /// Calls to [`Experiment::sic`]
    pub fn sic_reads(&self) -> usize {
        self.sic_reads.load(Ordering::SeqCst)
    }

    /// Calls to [`WiffFile::adc_trace_count`]
    pub fn adc_trace_listings(&self) -> usize {
        self.adc_trace_listings.load(Ordering::SeqCst)
    }
}

/// A spectrum held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySpectrum {
    pub ms_level: u8,
    pub start_time: f64,
    pub precursor: Option<PrecursorInfo>,
    pub isolation: Option<IsolationInfo>,
    pub continuous: bool,
    pub mzs: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl MemorySpectrum {
    pub fn new(ms_level: u8, start_time: f64) -> Self {
        Self {
            ms_level,
            start_time,
            ..Default::default()
        }
    }

    pub fn with_data(mut self, mzs: Vec<f64>, intensities: Vec<f64>) -> Self {
        self.mzs = mzs;
        self.intensities = intensities;
        self
    }

    /// Mark the data as profile mode, so centroiding picks local maxima
    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_precursor(mut self, precursor: PrecursorInfo) -> Self {
        self.precursor = Some(precursor);
        self
    }

    pub fn with_isolation(mut self, isolation: IsolationInfo) -> Self {
        self.isolation = Some(isolation);
        self
    }

    fn points(&self, centroid: bool, ignore_zeros: bool) -> Vec<(f64, f64)> {
        let n = self.mzs.len().min(self.intensities.len());
        let is_apex = |i: usize| {
            let y = self.intensities[i];
            let left = if i > 0 { self.intensities[i - 1] } else { f64::MIN };
            let right = if i + 1 < n {
                self.intensities[i + 1]
            } else {
                f64::MIN
            };
            y > 0.0 && y >= left && y > right
        };
        (0..n)
            .filter(|i| !(centroid && self.continuous) || is_apex(*i))
            .filter(|i| !ignore_zeros || self.intensities[*i] != 0.0)
            .map(|i| (self.mzs[i], self.intensities[i]))
            .collect()
    }
}

impl VendorSpectrum for MemorySpectrum {
    fn ms_level(&self) -> u8 {
        self.ms_level
    }

    fn start_time(&self) -> f64 {
        self.start_time
    }

    fn has_precursor_info(&self) -> bool {
        self.precursor.is_some()
    }

    fn precursor_info(&self) -> Result<PrecursorInfo, ProviderError> {
        self.precursor
            .ok_or_else(|| ProviderError::NotFound("precursor information".into()))
    }

    fn has_isolation_info(&self) -> bool {
        self.isolation.is_some()
    }

    fn isolation_info(&self) -> Result<IsolationInfo, ProviderError> {
        self.isolation
            .ok_or_else(|| ProviderError::NotFound("isolation information".into()))
    }

    fn data_is_continuous(&self) -> bool {
        self.continuous
    }

    fn data(
        &self,
        centroid: bool,
        ignore_zeros: bool,
    ) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
        Ok(self.points(centroid, ignore_zeros).into_iter().unzip())
    }

    fn data_size(&self, centroid: bool, ignore_zeros: bool) -> Result<usize, ProviderError> {
        Ok(self.points(centroid, ignore_zeros).len())
    }

    fn sum_y(&self) -> f64 {
        self.intensities.iter().sum()
    }

    fn base_peak_x(&self) -> f64 {
        self.base_peak().map(|(x, _)| x).unwrap_or_default()
    }

    fn base_peak_y(&self) -> f64 {
        self.base_peak().map(|(_, y)| y).unwrap_or_default()
    }
}

impl MemorySpectrum {
    fn base_peak(&self) -> Option<(f64, f64)> {
        self.mzs
            .iter()
            .copied()
            .zip(self.intensities.iter().copied())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// An experiment held in memory. Cycle `n` is the `n - 1`th spectrum added.
#[derive(Debug, Clone, Default)]
pub struct MemoryExperiment {
    sample: usize,
    period: usize,
    number: usize,
    experiment_type: ExperimentType,
    polarity: ScanPolarity,
    mass_range: (f64, f64),
    cycles: Vec<Arc<MemorySpectrum>>,
    tic: Option<(Vec<f64>, Vec<f64>)>,
    bpc: Option<(Vec<f64>, Vec<f64>)>,
    record_bpc: bool,
    transitions: Vec<(Target, SelectedIonTrace)>,
    failure: Option<String>,
    counters: Arc<CallCounters>,
}

impl MemoryExperiment {
    pub fn new(experiment_type: ExperimentType) -> Self {
        Self {
            experiment_type,
            record_bpc: true,
            ..Default::default()
        }
    }

    pub fn with_polarity(mut self, polarity: ScanPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_mass_range(mut self, start: f64, stop: f64) -> Self {
        self.mass_range = (start, stop);
        self
    }

    pub fn add_cycle(mut self, spectrum: MemorySpectrum) -> Self {
        self.cycles.push(Arc::new(spectrum));
        self
    }

    /// Report this TIC instead of one summed from the cycles
    pub fn with_tic(mut self, times: Vec<f64>, intensities: Vec<f64>) -> Self {
        self.tic = Some((times, intensities));
        self
    }

    /// Report this BPC instead of one taken from the cycles' base peaks
    pub fn with_bpc(mut self, times: Vec<f64>, intensities: Vec<f64>) -> Self {
        self.bpc = Some((times, intensities));
        self
    }

    /// Report an empty BPC, as older acquisitions do
    pub fn without_bpc(mut self) -> Self {
        self.record_bpc = false;
        self
    }

    /// Add an SRM transition to an MRM experiment or a SIM transition to a SIM experiment
    pub fn add_transition(mut self, target: Target, trace: SelectedIonTrace) -> Self {
        self.transitions.push((target, trace));
        self
    }

    /// Make every TIC and BPC read fail with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        match &self.failure {
            Some(message) => Err(ProviderError::Vendor(message.clone())),
            None => Ok(()),
        }
    }

    fn transition(&self, index: usize) -> Result<&(Target, SelectedIonTrace), ProviderError> {
        self.transitions.get(index).ok_or_else(|| {
            ProviderError::NotFound(format!(
                "transition {index} of experiment {}",
                self.number
            ))
        })
    }

    fn cycle_times(&self) -> Vec<f64> {
        self.cycles.iter().map(|s| s.start_time).collect()
    }
}

impl Experiment for MemoryExperiment {
    fn sample_number(&self) -> usize {
        self.sample
    }

    fn period_number(&self) -> usize {
        self.period
    }

    fn experiment_number(&self) -> usize {
        self.number
    }

    fn experiment_type(&self) -> ExperimentType {
        self.experiment_type
    }

    fn polarity(&self) -> ScanPolarity {
        self.polarity
    }

    fn acquisition_mass_range(&self) -> (f64, f64) {
        self.mass_range
    }

    fn tic(&self) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
        CallCounters::bump(&self.counters.tic_reads);
        self.check_failure()?;
        if let Some(tic) = &self.tic {
            return Ok(tic.clone());
        }
        Ok((
            self.cycle_times(),
            self.cycles.iter().map(|s| s.sum_y()).collect(),
        ))
    }

    fn bpc(&self) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
        CallCounters::bump(&self.counters.bpc_reads);
        self.check_failure()?;
        if !self.record_bpc {
            return Ok((Vec::new(), Vec::new()));
        }
        if let Some(bpc) = &self.bpc {
            return Ok(bpc.clone());
        }
        Ok((
            self.cycle_times(),
            self.cycles.iter().map(|s| s.base_peak_y()).collect(),
        ))
    }

    fn srm_count(&self) -> usize {
        if self.experiment_type == ExperimentType::MRM {
            self.transitions.len()
        } else {
            0
        }
    }

    fn srm(&self, index: usize) -> Result<Target, ProviderError> {
        Ok(self.transition(index)?.0)
    }

    fn sim_count(&self) -> usize {
        if self.experiment_type == ExperimentType::SIM {
            self.transitions.len()
        } else {
            0
        }
    }

    fn sim(&self, index: usize) -> Result<Target, ProviderError> {
        Ok(self.transition(index)?.0)
    }

    fn sic(&self, index: usize) -> Result<SelectedIonTrace, ProviderError> {
        CallCounters::bump(&self.counters.sic_reads);
        Ok(self.transition(index)?.1.clone())
    }
}

/// A sample held in memory, a list of periods each holding a list of experiments
#[derive(Debug, Clone, Default)]
pub struct MemorySample {
    pub name: String,
    pub acquisition_time: Option<DateTime<FixedOffset>>,
    periods: Vec<Vec<MemoryExperiment>>,
    adc_traces: Vec<(String, AdcTrace)>,
}

impl MemorySample {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_period(mut self, experiments: Vec<MemoryExperiment>) -> Self {
        self.periods.push(experiments);
        self
    }

    pub fn add_adc_trace(mut self, name: &str, trace: AdcTrace) -> Self {
        self.adc_traces.push((name.to_string(), trace));
        self
    }

    pub fn with_acquisition_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.acquisition_time = Some(time);
        self
    }
}

#[derive(Debug, Default)]
struct StoredSample {
    name: String,
    acquisition_time: Option<DateTime<FixedOffset>>,
    periods: Vec<Vec<Arc<MemoryExperiment>>>,
    adc_traces: Vec<(String, AdcTrace)>,
}

/// A [`WiffFile`] whose whole acquisition hierarchy lives in memory
#[derive(Debug, Default)]
pub struct MemoryWiffFile {
    path: PathBuf,
    samples: Vec<StoredSample>,
    instrument_model: Option<String>,
    counters: Arc<CallCounters>,
}

impl MemoryWiffFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_instrument_model(mut self, model: &str) -> Self {
        self.instrument_model = Some(model.to_string());
        self
    }

    /// Append a sample, numbering it and its periods and experiments from 1
    pub fn add_sample(mut self, sample: MemorySample) -> Self {
        let sample_number = self.samples.len() + 1;
        let periods = sample
            .periods
            .into_iter()
            .enumerate()
            .map(|(p, experiments)| {
                experiments
                    .into_iter()
                    .enumerate()
                    .map(|(e, mut experiment)| {
                        experiment.sample = sample_number;
                        experiment.period = p + 1;
                        experiment.number = e + 1;
                        experiment.counters = self.counters.clone();
                        Arc::new(experiment)
                    })
                    .collect()
            })
            .collect();
        self.samples.push(StoredSample {
            name: sample.name,
            acquisition_time: sample.acquisition_time,
            periods,
            adc_traces: sample.adc_traces,
        });
        self
    }

    pub fn counters(&self) -> &CallCounters {
        &self.counters
    }

    fn get_sample(&self, sample: usize) -> Result<&StoredSample, ProviderError> {
        sample
            .checked_sub(1)
            .and_then(|i| self.samples.get(i))
            .ok_or_else(|| ProviderError::NotFound(format!("sample {sample}")))
    }

    fn get_period(
        &self,
        sample: usize,
        period: usize,
    ) -> Result<&Vec<Arc<MemoryExperiment>>, ProviderError> {
        period
            .checked_sub(1)
            .and_then(|i| self.get_sample(sample).ok()?.periods.get(i))
            .ok_or_else(|| ProviderError::NotFound(format!("period {period} of sample {sample}")))
    }

    fn get_experiment(
        &self,
        sample: usize,
        period: usize,
        experiment: usize,
    ) -> Result<&Arc<MemoryExperiment>, ProviderError> {
        experiment
            .checked_sub(1)
            .and_then(|i| self.get_period(sample, period).ok()?.get(i))
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "experiment {experiment} of sample {sample} period {period}"
                ))
            })
    }

    fn get_adc_trace(&self, sample: usize, index: usize) -> Result<&(String, AdcTrace), ProviderError> {
        self.get_sample(sample)?
            .adc_traces
            .get(index)
            .ok_or_else(|| ProviderError::NotFound(format!("ADC trace {index} of sample {sample}")))
    }
}

impl WiffFile for MemoryWiffFile {
    fn wiff_path(&self) -> &Path {
        &self.path
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn sample_names(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.name.clone()).collect()
    }

    fn period_count(&self, sample: usize) -> Result<usize, ProviderError> {
        Ok(self.get_sample(sample)?.periods.len())
    }

    fn experiment_count(&self, sample: usize, period: usize) -> Result<usize, ProviderError> {
        Ok(self.get_period(sample, period)?.len())
    }

    fn cycle_count(
        &self,
        sample: usize,
        period: usize,
        experiment: usize,
    ) -> Result<usize, ProviderError> {
        Ok(self.get_experiment(sample, period, experiment)?.cycles.len())
    }

    fn experiment(
        &self,
        sample: usize,
        period: usize,
        experiment: usize,
    ) -> Result<Arc<dyn Experiment>, ProviderError> {
        let handle: Arc<dyn Experiment> = self.get_experiment(sample, period, experiment)?.clone();
        Ok(handle)
    }

    fn spectrum(
        &self,
        experiment: &Arc<dyn Experiment>,
        cycle: usize,
    ) -> Result<Arc<dyn VendorSpectrum>, ProviderError> {
        CallCounters::bump(&self.counters.spectrum_decodes);
        let stored = self.get_experiment(
            experiment.sample_number(),
            experiment.period_number(),
            experiment.experiment_number(),
        )?;
        let spectrum = cycle
            .checked_sub(1)
            .and_then(|i| stored.cycles.get(i))
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "cycle {cycle} of experiment {}",
                    stored.number
                ))
            })?;
        let handle: Arc<dyn VendorSpectrum> = spectrum.clone();
        Ok(handle)
    }

    fn adc_trace_count(&self, sample: usize) -> Result<usize, ProviderError> {
        CallCounters::bump(&self.counters.adc_trace_listings);
        Ok(self.get_sample(sample)?.adc_traces.len())
    }

    fn adc_trace_name(&self, sample: usize, index: usize) -> Result<String, ProviderError> {
        Ok(self.get_adc_trace(sample, index)?.0.clone())
    }

    fn adc_trace(&self, sample: usize, index: usize) -> Result<AdcTrace, ProviderError> {
        Ok(self.get_adc_trace(sample, index)?.1.clone())
    }

    fn instrument_model(&self) -> Result<String, ProviderError> {
        self.instrument_model
            .clone()
            .ok_or_else(|| ProviderError::NotFound("instrument model".into()))
    }

    fn sample_acquisition_time(
        &self,
        sample: usize,
    ) -> Result<Option<DateTime<FixedOffset>>, ProviderError> {
        Ok(self.get_sample(sample)?.acquisition_time)
    }
}
