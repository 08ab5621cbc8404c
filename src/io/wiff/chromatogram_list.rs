use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use regex::Regex;

use super::config::WiffConfig;
use super::provider::{Experiment, ExperimentType, ExperimentsMap, ProviderError, Target, WiffFile};
use super::spectrum_list::{is_wiff2, wiff2_skips};
use crate::io::id_index::ListIndex;
use crate::io::traits::{ChromatogramList, ListAccessError, ListEntry};
use crate::io::utils::DetailLevel;
use crate::params::{ControlledVocabulary, Param, ParamDescribed, Unit};
use crate::spectrum::{
    ActivationMethod, ArrayType, BinaryArrayMap, Chromatogram, ChromatogramDescription,
    ChromatogramType, DataArray, IsolationWindow, Precursor, Product,
};

/// The name prefix the vendor library puts on ADC channel traces
pub const ADC_TRACE_PREFIX: &str = "ADC:";

/// The position and kind of one chromatogram in a [`ChromatogramListWiff`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromatogramIdentity {
    pub index: usize,
    pub id: String,
    pub chromatogram_type: ChromatogramType,
}

impl ListEntry for ChromatogramIdentity {
    fn index(&self) -> usize {
        self.index
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Where a chromatogram's data comes from
#[derive(Clone)]
enum ChromatogramSourceKind {
    TotalIonCurrent,
    BasePeak,
    SelectedReaction {
        experiment: Arc<dyn Experiment>,
        transition: usize,
        target: Target,
    },
    SelectedIon {
        experiment: Arc<dyn Experiment>,
        transition: usize,
        target: Target,
    },
    Pressure {
        trace: usize,
    },
    FlowRate {
        trace: usize,
    },
}

impl Debug for ChromatogramSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalIonCurrent => write!(f, "TotalIonCurrent"),
            Self::BasePeak => write!(f, "BasePeak"),
            Self::SelectedReaction {
                experiment,
                transition,
                target,
            } => f
                .debug_struct("SelectedReaction")
                .field("experiment", &experiment.experiment_number())
                .field("transition", transition)
                .field("target", target)
                .finish(),
            Self::SelectedIon {
                experiment,
                transition,
                target,
            } => f
                .debug_struct("SelectedIon")
                .field("experiment", &experiment.experiment_number())
                .field("transition", transition)
                .field("target", target)
                .finish(),
            Self::Pressure { trace } => f.debug_struct("Pressure").field("trace", trace).finish(),
            Self::FlowRate { trace } => f.debug_struct("FlowRate").field("trace", trace).finish(),
        }
    }
}

impl ChromatogramSourceKind {
    fn chromatogram_type(&self) -> ChromatogramType {
        match self {
            Self::TotalIonCurrent => ChromatogramType::TotalIonCurrentChromatogram,
            Self::BasePeak => ChromatogramType::BasePeakChromatogram,
            Self::SelectedReaction { .. } => {
                ChromatogramType::SelectedReactionMonitoringChromatogram
            }
            Self::SelectedIon { .. } => ChromatogramType::SelectedIonMonitoringChromatogram,
            Self::Pressure { .. } => ChromatogramType::PressureChromatogram,
            Self::FlowRate { .. } => ChromatogramType::FlowRateChromatogram,
        }
    }
}

#[derive(Debug)]
struct ChromatogramEntry {
    identity: ChromatogramIdentity,
    kind: ChromatogramSourceKind,
}

/// Format the native ID of an SRM transition chromatogram
pub fn make_srm_id(
    experiment: &dyn Experiment,
    target: &Target,
    sample: usize,
    transition: usize,
) -> String {
    format!(
        "{}SRM SIC Q1={} Q3={} sample={sample} period={} experiment={} transition={transition}",
        experiment.polarity().filter_prefix(),
        target.q1,
        target.q3,
        experiment.period_number(),
        experiment.experiment_number(),
    )
}

/// Format the native ID of a SIM transition chromatogram
pub fn make_sim_id(
    experiment: &dyn Experiment,
    target: &Target,
    sample: usize,
    transition: usize,
) -> String {
    format!(
        "{}SIM SIC Q1={} sample={sample} period={} experiment={} transition={transition}",
        experiment.polarity().filter_prefix(),
        target.q1,
        experiment.period_number(),
        experiment.experiment_number(),
    )
}

/// Classify an ADC trace by its name. Only pressure and flow rate traces are exposed.
fn adc_trace_type(name: &str) -> Option<ChromatogramType> {
    static PRESSURE: OnceLock<Regex> = OnceLock::new();
    static FLOW: OnceLock<Regex> = OnceLock::new();
    let pressure = PRESSURE.get_or_init(|| Regex::new("(?i)pressure").expect("valid pressure pattern"));
    let flow = FLOW.get_or_init(|| Regex::new("(?i)flow").expect("valid flow pattern"));
    if pressure.is_match(name) {
        Some(ChromatogramType::PressureChromatogram)
    } else if flow.is_match(name) {
        Some(ChromatogramType::FlowRateChromatogram)
    } else {
        None
    }
}

/// Strip the vendor prefix from an ADC trace name and label it with its 1-based channel
pub fn clean_adc_trace_name(name: &str, trace: usize) -> String {
    let name = name.strip_prefix(ADC_TRACE_PREFIX).unwrap_or(name).trim();
    format!("{name} (channel {})", trace + 1)
}

struct ChromatogramSource {
    file: Arc<dyn WiffFile>,
    sample: usize,
    experiments: Arc<ExperimentsMap>,
    config: WiffConfig,
    index: OnceLock<Result<ListIndex<ChromatogramEntry>, ProviderError>>,
    read_lock: Mutex<()>,
}

/**
The chromatograms of one sample of a WIFF file.

The list always starts with the whole-run TIC and BPC, followed by one chromatogram per
SRM or SIM transition in acquisition hierarchy order, then the pressure and flow rate
ADC traces in trace order.

Like [`SpectrumListWiff`](super::SpectrumListWiff), the index is built once on first use and
record reads are serialized around the vendor library. Chromatograms are not cached.
*/
pub struct ChromatogramListWiff {
    source: Option<ChromatogramSource>,
}

impl Debug for ChromatogramListWiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => f
                .debug_struct("ChromatogramListWiff")
                .field("path", &source.file.wiff_path())
                .field("sample", &source.sample)
                .field("config", &source.config)
                .finish_non_exhaustive(),
            None => f.write_str("ChromatogramListWiff(unavailable)"),
        }
    }
}

impl ChromatogramListWiff {
    pub fn new(
        file: Arc<dyn WiffFile>,
        sample: usize,
        experiments: Arc<ExperimentsMap>,
        config: WiffConfig,
    ) -> Self {
        Self {
            source: Some(ChromatogramSource {
                file,
                sample,
                experiments,
                config,
                index: OnceLock::new(),
                read_lock: Mutex::new(()),
            }),
        }
    }

    /// A list for a build without a vendor library, which is always empty
    pub fn unavailable() -> Self {
        Self { source: None }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }
}

impl ChromatogramSource {
    fn index(&self) -> Result<&ListIndex<ChromatogramEntry>, ListAccessError> {
        self.index
            .get_or_init(|| self.build_index())
            .as_ref()
            .map_err(|e| ListAccessError::IndexBuild(e.clone()))
    }

    fn push(index: &mut ListIndex<ChromatogramEntry>, id: String, kind: ChromatogramSourceKind) {
        index.push(id, |i, id| ChromatogramEntry {
            identity: ChromatogramIdentity {
                index: i,
                id,
                chromatogram_type: kind.chromatogram_type(),
            },
            kind,
        });
    }

    fn build_index(&self) -> Result<ListIndex<ChromatogramEntry>, ProviderError> {
        let mut index = ListIndex::new("chromatogram", 2);
        Self::push(&mut index, "TIC".into(), ChromatogramSourceKind::TotalIonCurrent);
        Self::push(&mut index, "BPC".into(), ChromatogramSourceKind::BasePeak);

        let wiff2 = is_wiff2(self.file.wiff_path());
        for (_, experiment) in self.experiments.iter() {
            if wiff2_skips(experiment.experiment_type(), wiff2) {
                continue;
            }
            for transition in 0..experiment.srm_count() {
                let target = experiment.srm(transition)?;
                let id = make_srm_id(experiment.as_ref(), &target, self.sample, transition);
                Self::push(
                    &mut index,
                    id,
                    ChromatogramSourceKind::SelectedReaction {
                        experiment: experiment.clone(),
                        transition,
                        target,
                    },
                );
            }
            for transition in 0..experiment.sim_count() {
                let target = experiment.sim(transition)?;
                let id = make_sim_id(experiment.as_ref(), &target, self.sample, transition);
                Self::push(
                    &mut index,
                    id,
                    ChromatogramSourceKind::SelectedIon {
                        experiment: experiment.clone(),
                        transition,
                        target,
                    },
                );
            }
        }

        for trace in 0..self.file.adc_trace_count(self.sample)? {
            let name = self.file.adc_trace_name(self.sample, trace)?;
            let kind = match adc_trace_type(&name) {
                Some(ChromatogramType::PressureChromatogram) => {
                    ChromatogramSourceKind::Pressure { trace }
                }
                Some(ChromatogramType::FlowRateChromatogram) => {
                    ChromatogramSourceKind::FlowRate { trace }
                }
                _ => {
                    log::trace!("Skipping ADC trace {name}");
                    continue;
                }
            };
            Self::push(&mut index, clean_adc_trace_name(&name, trace), kind);
        }

        log::debug!(
            "Indexed {} chromatograms for sample {} of {}",
            index.len(),
            self.sample,
            self.file.wiff_path().display()
        );
        Ok(index)
    }

    fn entry(&self, index: usize) -> Result<&ChromatogramEntry, ListAccessError> {
        let list_index = self.index()?;
        list_index.get(index).ok_or(ListAccessError::OutOfRange {
            index,
            size: list_index.len(),
        })
    }

    fn experiment_is_eligible(&self, experiment: &dyn Experiment) -> bool {
        !self.config.global_chromatograms_are_ms1_only
            || experiment.experiment_type() == ExperimentType::MS
    }

    /// Merge the per-experiment TIC or BPC of every eligible experiment by time, summing the
    /// intensities of experiments that share a time point
    fn aggregate(&self, kind: ChromatogramType) -> Result<BTreeMap<OrderedFloat<f64>, f64>, ProviderError> {
        let wiff2 = is_wiff2(self.file.wiff_path());
        let mut by_time: BTreeMap<OrderedFloat<f64>, f64> = BTreeMap::new();
        for (_, experiment) in self.experiments.iter() {
            if !self.experiment_is_eligible(experiment.as_ref())
                || wiff2_skips(experiment.experiment_type(), wiff2)
            {
                continue;
            }
            let (times, intensities) = if kind == ChromatogramType::BasePeakChromatogram {
                experiment.bpc()?
            } else {
                experiment.tic()?
            };
            for (time, intensity) in times.into_iter().zip(intensities) {
                *by_time.entry(OrderedFloat(time)).or_default() += intensity;
            }
        }
        Ok(by_time)
    }

    fn read_chromatogram(
        &self,
        index: usize,
        detail_level: DetailLevel,
    ) -> Result<Chromatogram, ListAccessError> {
        let _guard = self.read_lock.lock();
        let entry = self.entry(index)?;
        let description = ChromatogramDescription {
            id: entry.identity.id.clone(),
            index,
            chromatogram_type: entry.identity.chromatogram_type,
            ..Default::default()
        };
        let mut result = Chromatogram::new(description);

        match &entry.kind {
            ChromatogramSourceKind::TotalIonCurrent | ChromatogramSourceKind::BasePeak => {
                if detail_level < DetailLevel::FullMetadata {
                    return Ok(result);
                }
                let by_time = self.aggregate(entry.identity.chromatogram_type)?;
                result.default_array_length = by_time.len();
                if detail_level == DetailLevel::FullData {
                    let mut arrays = BinaryArrayMap::new();
                    arrays.add(DataArray::try_from_iter(
                        ArrayType::TimeArray,
                        by_time.keys().map(|t| t.0),
                    )?);
                    arrays.add(DataArray::try_from_iter(
                        ArrayType::IntensityArray,
                        by_time.values().copied(),
                    )?);
                    result.arrays = Some(arrays);
                }
            }
            ChromatogramSourceKind::SelectedReaction {
                experiment,
                transition,
                target,
            }
            | ChromatogramSourceKind::SelectedIon {
                experiment,
                transition,
                target,
            } => {
                let is_srm = matches!(entry.kind, ChromatogramSourceKind::SelectedReaction { .. });
                populate_transition(&mut result, experiment.as_ref(), target, is_srm);
                if detail_level < DetailLevel::FullMetadata {
                    return Ok(result);
                }
                let trace = experiment.sic(*transition)?;
                result.default_array_length = trace.times.len();
                if detail_level == DetailLevel::FullData {
                    let mut arrays = BinaryArrayMap::new();
                    arrays.add(DataArray::try_from_iter(
                        ArrayType::TimeArray,
                        trace.times.into_iter(),
                    )?);
                    arrays.add(DataArray::try_from_iter(
                        ArrayType::IntensityArray,
                        trace.intensities.into_iter(),
                    )?);
                    result.arrays = Some(arrays);
                }
            }
            ChromatogramSourceKind::Pressure { trace }
            | ChromatogramSourceKind::FlowRate { trace } => {
                if detail_level < DetailLevel::FullData {
                    return Ok(result);
                }
                let adc = self.file.adc_trace(self.sample, *trace)?;
                result.add_param(Param::new_key_value("units", &adc.units));
                result.default_array_length = adc.x.len();
                let unit = if entry.identity.chromatogram_type
                    == ChromatogramType::PressureChromatogram
                {
                    Unit::Pressure
                } else {
                    Unit::FlowRate
                };
                let mut arrays = BinaryArrayMap::new();
                arrays.add(DataArray::try_from_iter(ArrayType::TimeArray, adc.x.into_iter())?);
                let mut values =
                    DataArray::try_from_iter(ArrayType::NonStandardDataArray, adc.y.into_iter())?;
                values.unit = unit;
                arrays.add(values);
                result.arrays = Some(arrays);
            }
        }
        Ok(result)
    }
}

/// Describe the isolation and activation of an SRM or SIM transition. These come from the
/// vendor's transition table, so they are filled in at every detail level.
fn populate_transition(
    result: &mut Chromatogram,
    experiment: &dyn Experiment,
    target: &Target,
    is_srm: bool,
) {
    result.add_param(
        Param::new_key_value("dwell time", target.dwell_time / 1000.0).with_unit_t(&Unit::Second),
    );

    let mut precursor = Precursor {
        isolation_window: IsolationWindow::around(target.q1 as f32),
        ..Default::default()
    };
    let activation = &mut precursor.activation;
    activation.method = Some(ActivationMethod::CollisionInducedDissociation);
    activation.energy = target.collision_energy as f32;
    activation.add_param(
        ControlledVocabulary::MS
            .param_val(1000045, "collision energy", target.collision_energy)
            .with_unit_t(&Unit::Electronvolt),
    );
    activation.add_param(
        Param::new_key_value("declustering potential", target.declustering_potential)
            .with_unit_t(&Unit::Volt),
    );
    result.description.precursor = Some(precursor);

    if is_srm {
        result.description.product = Some(Product {
            isolation_window: IsolationWindow::around(target.q3 as f32),
            ..Default::default()
        });
    }
    result.description.polarity = experiment.polarity();
}

impl ChromatogramList for ChromatogramListWiff {
    type Identity = ChromatogramIdentity;

    fn len(&self) -> Result<usize, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.index()?.len()),
            None => Ok(0),
        }
    }

    fn chromatogram_identity(&self, index: usize) -> Result<ChromatogramIdentity, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.entry(index)?.identity.clone()),
            None => Ok(ChromatogramIdentity::default()),
        }
    }

    fn find(&self, id: &str) -> Result<usize, ListAccessError> {
        match &self.source {
            Some(source) => Ok(source.index()?.find(id)),
            None => Ok(0),
        }
    }

    fn chromatogram(
        &self,
        index: usize,
        detail_level: DetailLevel,
    ) -> Result<Option<Chromatogram>, ListAccessError> {
        match &self.source {
            Some(source) => source.read_chromatogram(index, detail_level).map(Some),
            None => Ok(None),
        }
    }
}
