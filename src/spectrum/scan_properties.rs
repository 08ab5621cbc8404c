use crate::impl_param_described;
use crate::params::{ControlledVocabulary, Param, ParamList};

macro_rules! ms_term {
    ($acc:expr, $name:expr) => {
        ControlledVocabulary::MS.param($acc, $name)
    };
}

/**
Describe the initialization stage of an isolation window
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum IsolationWindowState {
    #[default]
    Unknown = 0,
    /// Only the target is known
    Explicit,
    /// The target and both bounds are known
    Complete,
}

/// The interval around the target m/z that was isolated. Although vendors may report
/// the window as offsets from the target, this data structure always uses explicit bounds.
#[derive(Default, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsolationWindow {
    pub target: f32,
    pub lower_bound: f32,
    pub upper_bound: f32,
    pub flags: IsolationWindowState,
}

impl IsolationWindow {
    /// A window known only by its target m/z
    pub fn around(target: f32) -> Self {
        Self {
            target,
            lower_bound: target,
            upper_bound: target,
            flags: IsolationWindowState::Explicit,
        }
    }

    pub fn new(target: f32, lower_bound: f32, upper_bound: f32) -> Self {
        Self {
            target,
            lower_bound,
            upper_bound,
            flags: IsolationWindowState::Complete,
        }
    }

    pub fn lower_offset(&self) -> f32 {
        self.target - self.lower_bound
    }

    pub fn upper_offset(&self) -> f32 {
        self.upper_bound - self.target
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.flags, IsolationWindowState::Unknown)
    }
}

impl PartialEq for IsolationWindow {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.lower_bound == other.lower_bound
            && self.upper_bound == other.upper_bound
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanWindow {
    pub lower_bound: f32,
    pub upper_bound: f32,
}

impl ScanWindow {
    pub fn new(lower_bound: f32, upper_bound: f32) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describes a single scan event. There is only ever one event per WIFF spectrum.
pub struct ScanEvent {
    /// Minutes since the start of the run
    pub start_time: f64,
    pub scan_windows: Vec<ScanWindow>,
    pub instrument_configuration_id: u32,
    pub params: ParamList,
}

#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describe the series of acquisition events that constructed the spectrum
/// being described.
pub struct Acquisition {
    pub scans: Vec<ScanEvent>,
    pub params: ParamList,
}

impl Acquisition {
    pub fn first_scan(&self) -> Option<&ScanEvent> {
        self.scans.first()
    }

    pub fn first_scan_mut(&mut self) -> &mut ScanEvent {
        if self.scans.is_empty() {
            self.scans.push(ScanEvent::default());
        }
        &mut self.scans[0]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describes a single selected ion from a precursor isolation
pub struct SelectedIon {
    /// The selected ion's m/z as reported, may not be the monoisotopic peak.
    pub mz: f64,
    pub intensity: f32,
    /// The reported precursor ion's charge state, absent when the vendor reports 0
    pub charge: Option<i32>,
    pub params: ParamList,
}

/// The dissociation methods SCIEX instruments record in WIFF files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivationMethod {
    CollisionInducedDissociation,
    BeamTypeCollisionInducedDissociation,
    ElectronActivatedDissociation,
}

impl ActivationMethod {
    pub fn to_param(&self) -> Param {
        match self {
            Self::CollisionInducedDissociation => ms_term!(1000133, "collision-induced dissociation"),
            Self::BeamTypeCollisionInducedDissociation => {
                ms_term!(1000422, "beam-type collision-induced dissociation")
            }
            Self::ElectronActivatedDissociation => ms_term!(1003294, "electron activated dissociation"),
        }
    }
}

impl From<ActivationMethod> for Param {
    fn from(value: ActivationMethod) -> Self {
        value.to_param()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describes the activation method used to dissociate the precursor ion
pub struct Activation {
    pub method: Option<ActivationMethod>,
    /// Collision energy in electronvolts
    pub energy: f32,
    pub params: ParamList,
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describes the precursor ion of the owning spectrum or chromatogram.
pub struct Precursor {
    /// The selected ions, empty for targeted chromatograms
    pub ions: Vec<SelectedIon>,
    pub isolation_window: IsolationWindow,
    pub activation: Activation,
    pub params: ParamList,
}

impl Precursor {
    pub fn ion(&self) -> Option<&SelectedIon> {
        self.ions.first()
    }

    pub fn add_ion(&mut self, ion: SelectedIon) {
        self.ions.push(ion);
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Describes the product ion isolation, for precursor ion scans and SRM transitions
pub struct Product {
    pub isolation_window: IsolationWindow,
    pub params: ParamList,
}

/**
Describes the polarity of a mass spectrum. A spectrum is either `Positive` (1+), `Negative` (-1)
or `Unknown` (0). The `Unknown` state is the default.
*/
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanPolarity {
    #[default]
    Unknown = 0,
    Positive = 1,
    Negative = -1,
}

impl ScanPolarity {
    pub fn to_param(&self) -> Option<Param> {
        match self {
            Self::Positive => Some(ms_term!(1000130, "positive scan")),
            Self::Negative => Some(ms_term!(1000129, "negative scan")),
            Self::Unknown => None,
        }
    }

    /// The prefix used in native IDs and filter strings, `"+ "`, `"- "` or nothing
    pub fn filter_prefix(&self) -> &'static str {
        match self {
            Self::Positive => "+ ",
            Self::Negative => "- ",
            Self::Unknown => "",
        }
    }
}

/**
Describes the initial representation of the signal of a spectrum.
*/
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalContinuity {
    #[default]
    Unknown = 0,
    Centroid = 3,
    Profile = 5,
}

impl SignalContinuity {
    pub fn to_param(&self) -> Option<Param> {
        match self {
            Self::Centroid => Some(ms_term!(1000127, "centroid spectrum")),
            Self::Profile => Some(ms_term!(1000128, "profile spectrum")),
            Self::Unknown => None,
        }
    }
}

/// The kind of spectrum an experiment produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpectrumType {
    MS1Spectrum,
    MSnSpectrum,
    PrecursorIonSpectrum,
    ConstantNeutralGainSpectrum,
    ConstantNeutralLossSpectrum,
    SIMSpectrum,
    SRMSpectrum,
    #[default]
    Unknown,
}

impl SpectrumType {
    pub fn to_param(&self) -> Option<Param> {
        let term = match self {
            Self::MS1Spectrum => ms_term!(1000579, "MS1 spectrum"),
            Self::MSnSpectrum => ms_term!(1000580, "MSn spectrum"),
            Self::PrecursorIonSpectrum => ms_term!(1000341, "precursor ion spectrum"),
            Self::ConstantNeutralGainSpectrum => ms_term!(1000325, "constant neutral gain spectrum"),
            Self::ConstantNeutralLossSpectrum => ms_term!(1000326, "constant neutral loss spectrum"),
            Self::SIMSpectrum => ms_term!(1000582, "SIM spectrum"),
            Self::SRMSpectrum => ms_term!(1000583, "SRM spectrum"),
            Self::Unknown => return None,
        };
        Some(term)
    }
}

/// The closed set of chromatogram kinds a WIFF run exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChromatogramType {
    TotalIonCurrentChromatogram,
    BasePeakChromatogram,
    SelectedReactionMonitoringChromatogram,
    SelectedIonMonitoringChromatogram,
    PressureChromatogram,
    FlowRateChromatogram,
    #[default]
    Unknown,
}

impl ChromatogramType {
    pub fn to_param(&self) -> Option<Param> {
        let term = match self {
            Self::TotalIonCurrentChromatogram => ms_term!(1000235, "total ion current chromatogram"),
            Self::BasePeakChromatogram => ms_term!(1000628, "basepeak chromatogram"),
            Self::SelectedReactionMonitoringChromatogram => ms_term!(1001473, "selected reaction monitoring chromatogram"),
            Self::SelectedIonMonitoringChromatogram => ms_term!(1001472, "selected ion monitoring chromatogram"),
            Self::PressureChromatogram => ms_term!(1003019, "pressure chromatogram"),
            Self::FlowRateChromatogram => ms_term!(1003020, "flow rate chromatogram"),
            Self::Unknown => return None,
        };
        Some(term)
    }

    /// Whole-run summaries built from every experiment
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Self::TotalIonCurrentChromatogram | Self::BasePeakChromatogram
        )
    }

    pub fn is_ion_current(&self) -> bool {
        !matches!(
            self,
            Self::PressureChromatogram | Self::FlowRateChromatogram | Self::Unknown
        )
    }
}

/**
The set of descriptive metadata that give context for how a mass spectrum was acquired
within a particular run.
*/
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumDescription {
    pub id: String,
    pub index: usize,
    pub ms_level: u8,

    pub polarity: ScanPolarity,
    pub signal_continuity: SignalContinuity,
    pub spectrum_type: SpectrumType,

    pub params: ParamList,
    pub acquisition: Acquisition,
    pub precursor: Option<Precursor>,
    pub product: Option<Product>,
}

/// The descriptive metadata for a chromatogram
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromatogramDescription {
    pub id: String,
    pub index: usize,
    pub chromatogram_type: ChromatogramType,
    pub polarity: ScanPolarity,
    pub precursor: Option<Precursor>,
    pub product: Option<Product>,
    pub params: ParamList,
}

impl_param_described!(
    Acquisition,
    Activation,
    Precursor,
    Product,
    SelectedIon,
    ScanEvent,
    SpectrumDescription,
    ChromatogramDescription
);
