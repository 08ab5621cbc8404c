use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::config::WiffConfig;
use super::provider::{
    Experiment, ExperimentType, ExperimentsMap, FragmentationMode, ProviderError, VendorSpectrum,
    WiffFile,
};
use crate::io::id_index::ListIndex;
use crate::io::traits::{ListAccessError, ListEntry, SpectrumList};
use crate::io::utils::{DetailLevel, OneShotWarning};
use crate::params::{ControlledVocabulary, ParamDescribed, Unit};
use crate::spectrum::{
    ActivationMethod, ArrayType, BinaryArrayMap, DataArray, IsolationWindow, Precursor, Product,
    ScanWindow, SelectedIon, SignalContinuity, Spectrum, SpectrumDescription, SpectrumType,
};

/// The position and vendor coordinates of one spectrum in a [`SpectrumListWiff`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpectrumIdentity {
    pub index: usize,
    /// `sample=S period=P cycle=C experiment=E`
    pub id: String,
    pub sample: usize,
    pub period: usize,
    pub cycle: usize,
    pub experiment: usize,
}

impl ListEntry for SpectrumIdentity {
    fn index(&self) -> usize {
        self.index
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Format the native ID of a WIFF spectrum
pub fn make_native_id(sample: usize, period: usize, cycle: usize, experiment: usize) -> String {
    format!("sample={sample} period={period} cycle={cycle} experiment={experiment}")
}

struct SpectrumEntry {
    identity: SpectrumIdentity,
    experiment: Arc<dyn Experiment>,
}

impl Debug for SpectrumEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumEntry")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

/// Whether `path` names a WIFF2 file, which some acquisition modes can't be read from
pub fn is_wiff2(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("wiff2"))
        .unwrap_or_default()
}

pub(crate) static WIFF2_TARGETED_WARNING: OneShotWarning = OneShotWarning::new(
    "The WIFF2 reader does not support SIM/MRM chromatograms or spectra; point at the WIFF file instead",
);

/// Whether an experiment is unreadable because it is an MRM or SIM experiment of a WIFF2 file.
/// Both lists skip these experiments and share one warning about them.
pub(crate) fn wiff2_skips(experiment_type: ExperimentType, wiff2: bool) -> bool {
    let skipped = wiff2 && matches!(experiment_type, ExperimentType::MRM | ExperimentType::SIM);
    if skipped {
        WIFF2_TARGETED_WARNING.warn();
    }
    skipped
}

/// Whether an experiment of `experiment_type` is left out of the spectrum list entirely
pub fn experiment_excluded(experiment_type: ExperimentType, wiff2: bool, config: &WiffConfig) -> bool {
    if wiff2_skips(experiment_type, wiff2) {
        return true;
    }
    match experiment_type {
        ExperimentType::MRM => !config.srm_as_spectra,
        ExperimentType::SIM => !config.sim_as_spectra,
        _ => false,
    }
}

/**
Inclusion rule when zero length spectra are accepted: a cycle is kept unless it is an empty
WIFF2 cycle, and product ion cycles are kept only when they carry precursor information.

`has_precursor` is only called when the other conditions hold, since it decodes the spectrum.
*/
pub fn zero_length_policy_includes(
    intensity: f64,
    wiff2: bool,
    experiment_type: ExperimentType,
    has_precursor: impl FnOnce() -> Result<bool, ProviderError>,
) -> Result<bool, ProviderError> {
    if wiff2 && intensity <= 0.0 {
        return Ok(false);
    }
    if experiment_type != ExperimentType::Product {
        return Ok(true);
    }
    has_precursor()
}

/**
Default inclusion rule: a cycle is kept when its chromatogram intensity is non-zero and
the decoded spectrum has at least one non-zero point.

`data_size` is only called for cycles with non-zero intensity.
*/
pub fn default_policy_includes(
    intensity: f64,
    data_size: impl FnOnce() -> Result<usize, ProviderError>,
) -> Result<bool, ProviderError> {
    if intensity <= 0.0 {
        return Ok(false);
    }
    Ok(data_size()? > 0)
}

struct SpectrumSource {
    file: Arc<dyn WiffFile>,
    sample: usize,
    experiments: Arc<ExperimentsMap>,
    config: WiffConfig,
    instrument_configuration_id: u32,
    index: OnceLock<Result<ListIndex<SpectrumEntry>, ProviderError>>,
    /// Serializes every call into the vendor library
    read_lock: Mutex<()>,
    /// The most recently decoded spectrum and its flat index
    cache: Mutex<Option<(usize, Arc<dyn VendorSpectrum>)>>,
}

/**
The spectra of one sample of a WIFF file, ordered by acquisition time.

The index is built the first time any accessor is called, exactly once, and is
immutable afterwards. A failed build is permanent: every later call reports the same
[`ListAccessError::IndexBuild`].

Reading records takes a lock around the vendor library, so concurrent readers are
serialized. The most recently decoded spectrum is kept, which makes reading in
ascending index order, or re-reading the same index, cheaper than random access.
*/
pub struct SpectrumListWiff {
    source: Option<SpectrumSource>,
}

impl Debug for SpectrumListWiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => f
                .debug_struct("SpectrumListWiff")
                .field("path", &source.file.wiff_path())
                .field("sample", &source.sample)
                .field("config", &source.config)
                .finish_non_exhaustive(),
            None => f.write_str("SpectrumListWiff(unavailable)"),
        }
    }
}

impl SpectrumListWiff {
    /// Create a list over `sample` (1-based) using an already loaded experiments map
    pub fn new(
        file: Arc<dyn WiffFile>,
        sample: usize,
        experiments: Arc<ExperimentsMap>,
        config: WiffConfig,
    ) -> Self {
        Self {
            source: Some(SpectrumSource {
                file,
                sample,
                experiments,
                config,
                instrument_configuration_id: 0,
                index: OnceLock::new(),
                read_lock: Mutex::new(()),
                cache: Mutex::new(None),
            }),
        }
    }

    /// A list for a build without a vendor library. It is always empty, and reading
    /// from it yields nothing instead of failing.
    pub fn unavailable() -> Self {
        Self { source: None }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Set the instrument configuration every scan refers to
    pub fn with_instrument_configuration_id(mut self, id: u32) -> Self {
        if let Some(source) = self.source.as_mut() {
            source.instrument_configuration_id = id;
        }
        self
    }
}

impl SpectrumSource {
    fn index(&self) -> Result<&ListIndex<SpectrumEntry>, ListAccessError> {
        self.index
            .get_or_init(|| self.build_index())
            .as_ref()
            .map_err(|e| ListAccessError::IndexBuild(e.clone()))
    }

    fn build_index(&self) -> Result<ListIndex<SpectrumEntry>, ProviderError> {
        let wiff2 = is_wiff2(self.file.wiff_path());
        let mut by_time: Vec<(f64, &Arc<dyn Experiment>, usize)> = Vec::new();

        for (_, experiment) in self.experiments.iter() {
            let experiment_type = experiment.experiment_type();
            if experiment_excluded(experiment_type, wiff2, &self.config) {
                continue;
            }

            if self.config.accept_zero_length_spectra {
                let (times, intensities) = experiment.tic()?;
                for (i, (time, intensity)) in times.iter().zip(intensities.iter()).enumerate() {
                    let cycle = i + 1;
                    let keep = zero_length_policy_includes(*intensity, wiff2, experiment_type, || {
                        Ok(self.file.spectrum(experiment, cycle)?.has_precursor_info())
                    })?;
                    if keep {
                        by_time.push((*time, experiment, cycle));
                    }
                }
            } else {
                let (mut times, mut intensities) = experiment.bpc()?;
                if times.is_empty() {
                    (times, intensities) = experiment.tic()?;
                }
                for (i, (time, intensity)) in times.iter().zip(intensities.iter()).enumerate() {
                    let cycle = i + 1;
                    let keep = default_policy_includes(*intensity, || {
                        self.file.spectrum(experiment, cycle)?.data_size(false, true)
                    })?;
                    if keep {
                        by_time.push((*time, experiment, cycle));
                    }
                }
            }
        }

        // Stable, so cycles sharing a time keep hierarchy order
        by_time.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut index = ListIndex::new("spectrum", by_time.len());
        for (_, experiment, cycle) in by_time {
            let period = experiment.period_number();
            let experiment_number = experiment.experiment_number();
            let id = make_native_id(self.sample, period, cycle, experiment_number);
            index.push(id, |i, id| SpectrumEntry {
                identity: SpectrumIdentity {
                    index: i,
                    id,
                    sample: self.sample,
                    period,
                    cycle,
                    experiment: experiment_number,
                },
                experiment: experiment.clone(),
            });
        }
        log::debug!(
            "Indexed {} spectra for sample {} of {}",
            index.len(),
            self.sample,
            self.file.wiff_path().display()
        );
        Ok(index)
    }

    fn entry(&self, index: usize) -> Result<&SpectrumEntry, ListAccessError> {
        let list_index = self.index()?;
        list_index.get(index).ok_or(ListAccessError::OutOfRange {
            index,
            size: list_index.len(),
        })
    }

    /// Decode the spectrum at `index`, or reuse it if it was the last one decoded
    fn decoded(
        &self,
        index: usize,
        entry: &SpectrumEntry,
    ) -> Result<Arc<dyn VendorSpectrum>, ProviderError> {
        let mut slot = self.cache.lock();
        if let Some((cached_index, spectrum)) = slot.as_ref() {
            if *cached_index == index {
                return Ok(spectrum.clone());
            }
        }
        let spectrum = self
            .file
            .spectrum(&entry.experiment, entry.identity.cycle)?;
        *slot = Some((index, spectrum.clone()));
        Ok(spectrum)
    }

    fn read_spectrum(
        &self,
        index: usize,
        detail_level: DetailLevel,
        centroid_ms_levels: &[u8],
    ) -> Result<Spectrum, ListAccessError> {
        let _guard = self.read_lock.lock();
        let entry = self.entry(index)?;

        let mut description = SpectrumDescription {
            id: entry.identity.id.clone(),
            index,
            ..Default::default()
        };
        if detail_level == DetailLevel::IdentityOnly {
            return Ok(Spectrum::new(description));
        }

        let experiment = &entry.experiment;
        let spectrum = self.decoded(index, entry)?;

        description
            .acquisition
            .add_param(ControlledVocabulary::MS.param(1000795, "no combination"));
        let scan = description.acquisition.first_scan_mut();
        let start_time = spectrum.start_time();
        if start_time > 0.0 {
            scan.start_time = start_time;
            scan.add_param(
                ControlledVocabulary::MS
                    .param_val(1000016, "scan start time", start_time)
                    .with_unit_t(&Unit::Minute),
            );
        }
        scan.add_param(ControlledVocabulary::MS.param_val(
            1000616,
            "preset scan configuration",
            experiment.experiment_number(),
        ));
        scan.instrument_configuration_id = self.instrument_configuration_id;
        let (start_mz, stop_mz) = experiment.acquisition_mass_range();
        scan.scan_windows
            .push(ScanWindow::new(start_mz as f32, stop_mz as f32));

        let ms_level = spectrum.ms_level();
        description.ms_level = ms_level;
        description.spectrum_type = experiment.experiment_type().spectrum_type();
        description.polarity = experiment.polarity();

        let do_centroid = centroid_ms_levels.contains(&ms_level);
        description.signal_continuity = if !do_centroid && spectrum.data_is_continuous() {
            SignalContinuity::Profile
        } else {
            SignalContinuity::Centroid
        };

        if spectrum.has_precursor_info() {
            populate_precursor(&mut description, spectrum.as_ref())?;
        }

        let mut result = Spectrum::new(description);
        if detail_level == DetailLevel::InstantMetadata {
            return Ok(result);
        }

        let base_peak_y = spectrum.base_peak_y();
        if !self.config.accept_zero_length_spectra && base_peak_y > 0.0 {
            result.add_param(
                ControlledVocabulary::MS
                    .param_val(1000505, "base peak intensity", base_peak_y)
                    .with_unit_t(&Unit::DetectorCounts),
            );
            result.add_param(
                ControlledVocabulary::MS
                    .param_val(1000504, "base peak m/z", spectrum.base_peak_x())
                    .with_unit_t(&Unit::MZ),
            );
        }
        result.add_param(
            ControlledVocabulary::MS
                .param_val(1000285, "total ion current", spectrum.sum_y())
                .with_unit_t(&Unit::DetectorCounts),
        );

        let ignore_zeros = self.config.ignore_zero_intensity_points;
        if detail_level == DetailLevel::FullData {
            let (mzs, intensities) = spectrum.data(do_centroid, ignore_zeros)?;
            let mut arrays = BinaryArrayMap::new();
            arrays.add(DataArray::try_from_iter(ArrayType::MZArray, mzs.into_iter())?);
            arrays.add(DataArray::try_from_iter(
                ArrayType::IntensityArray,
                intensities.into_iter(),
            )?);
            result.arrays = Some(arrays);
            if do_centroid {
                // Marks the source as profile data so it is not picked again downstream
                result.description.signal_continuity = SignalContinuity::Profile;
                result.vendor_centroided = true;
            }
        }

        // There is no cheaper way to learn the point count than decoding
        result.default_array_length = spectrum.data_size(do_centroid, ignore_zeros)?;
        Ok(result)
    }
}

fn populate_precursor(
    description: &mut SpectrumDescription,
    spectrum: &dyn VendorSpectrum,
) -> Result<(), ProviderError> {
    let precursor_info = spectrum.precursor_info()?;
    let mut selected_mz = precursor_info.selected_mz;
    let isolation = if spectrum.has_isolation_info() {
        let isolation = spectrum.isolation_info()?;
        selected_mz = isolation.center_mz;
        Some(isolation)
    } else {
        None
    };

    let isolation_window = match isolation {
        Some(iso) if iso.center_mz > 0.0 => {
            if iso.lower_limit > 0.0 && iso.upper_limit > 0.0 {
                IsolationWindow::new(
                    iso.center_mz as f32,
                    iso.lower_limit as f32,
                    iso.upper_limit as f32,
                )
            } else {
                IsolationWindow::around(iso.center_mz as f32)
            }
        }
        _ => IsolationWindow::default(),
    };

    if description.spectrum_type == SpectrumType::PrecursorIonSpectrum {
        description.product = Some(Product {
            isolation_window,
            ..Default::default()
        });
        return Ok(());
    }

    let mut precursor = Precursor {
        isolation_window,
        ..Default::default()
    };

    let mut ion = SelectedIon {
        mz: selected_mz,
        intensity: precursor_info.intensity as f32,
        ..Default::default()
    };
    if precursor_info.charge > 0 {
        ion.charge = Some(precursor_info.charge);
    }
    precursor.add_ion(ion);

    let (fragmentation_mode, collision_energy, electron_kinetic_energy) = isolation
        .map(|iso| {
            (
                iso.fragmentation_mode,
                iso.collision_energy,
                iso.electron_kinetic_energy,
            )
        })
        .unwrap_or_default();

    let activation = &mut precursor.activation;
    match fragmentation_mode {
        // SCIEX instruments that write WIFF files are QqTOF or QqLIT, so CID is beam-type
        FragmentationMode::CID => {
            activation.method = Some(ActivationMethod::BeamTypeCollisionInducedDissociation);
        }
        FragmentationMode::EAD => {
            activation.method = Some(ActivationMethod::ElectronActivatedDissociation);
            if electron_kinetic_energy > 0.0 {
                activation.add_param(
                    ControlledVocabulary::MS
                        .param_val(1003410, "electron beam energy", electron_kinetic_energy)
                        .with_unit_t(&Unit::Electronvolt),
                );
            }
        }
    }
    if collision_energy > 0.0 {
        activation.energy = collision_energy as f32;
        activation.add_param(
            ControlledVocabulary::MS
                .param_val(1000045, "collision energy", collision_energy)
                .with_unit_t(&Unit::Electronvolt),
        );
    }

    description.precursor = Some(precursor);
    Ok(())
}

impl SpectrumList for SpectrumListWiff {
    type Identity = SpectrumIdentity;

    fn len(&self) -> Result<usize, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.index()?.len()),
            None => Ok(0),
        }
    }

    fn spectrum_identity(&self, index: usize) -> Result<SpectrumIdentity, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.entry(index)?.identity.clone()),
            None => Ok(SpectrumIdentity::default()),
        }
    }

    fn find(&self, id: &str) -> Result<usize, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.index()?.find(id)),
            None => Ok(0),
        }
    }

    fn spectrum(
        &self,
        index: usize,
        detail_level: DetailLevel,
        centroid_ms_levels: &[u8],
    ) -> Result<Option<Spectrum>, ListAccessError> {
        match &self.source {
            Some(source) => source
                .read_spectrum(index, detail_level, centroid_ms_levels)
                .map(Some),
            None => Ok(None),
        }
    }
}
