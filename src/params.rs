//! Controlled vocabulary parameters attached to records and metadata.
use std::borrow::Cow;
use std::fmt::Display;
use std::str::FromStr;

/// Split a CURIE like `MS:1000285` into its vocabulary and numeric accession
pub fn curie_to_num(curie: &str) -> (Option<ControlledVocabulary>, Option<u32>) {
    let mut parts = curie.split(':');
    let prefix = parts
        .next()
        .and_then(|v| v.parse::<ControlledVocabulary>().ok())
        .and_then(|cv| cv.as_option());
    match parts.next().map(|k| k.parse::<u32>()) {
        Some(Ok(v)) => (prefix, Some(v)),
        _ => (prefix, None),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: String,
    pub value: String,
    pub accession: Option<u32>,
    pub controlled_vocabulary: Option<ControlledVocabulary>,
    pub unit: Unit,
}

impl Param {
    pub fn new() -> Param {
        Param {
            ..Default::default()
        }
    }

    /// Create an uncontrolled "user" parameter
    pub fn new_key_value<K: Into<String>, V: ToString>(name: K, value: V) -> Param {
        let mut inst = Self::new();
        inst.name = name.into();
        inst.value = value.to_string();
        inst
    }

    pub fn coerce<T: FromStr>(&self) -> Result<T, T::Err> {
        self.value.parse::<T>()
    }

    pub fn is_controlled(&self) -> bool {
        self.accession.is_some()
    }

    pub fn curie(&self) -> Option<String> {
        match (self.controlled_vocabulary, self.accession) {
            (Some(cv), Some(acc)) => Some(format!("{}:{:07}", cv.prefix(), acc)),
            _ => None,
        }
    }

    pub fn with_unit_t(mut self, unit: &Unit) -> Param {
        self.unit = *unit;
        self
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.curie() {
            Some(curie) => write!(f, "{curie}|{}={}", self.name, self.value)?,
            None => write!(f, "{}={}", self.name, self.value)?,
        }
        match self.unit.for_param() {
            (_, "") => Ok(()),
            (_, unit_name) => write!(f, " {unit_name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlledVocabulary {
    MS,
    UO,
    Unknown,
}

const MS_CV: &str = "MS";
const UO_CV: &str = "UO";

impl ControlledVocabulary {
    pub fn prefix(&self) -> Cow<'static, str> {
        match &self {
            Self::MS => Cow::Borrowed(MS_CV),
            Self::UO => Cow::Borrowed(UO_CV),
            Self::Unknown => Cow::Borrowed("?"),
        }
    }

    pub fn as_option(&self) -> Option<Self> {
        match self {
            Self::Unknown => None,
            _ => Some(*self),
        }
    }

    /// Create a valueless term from this vocabulary
    pub fn param<S: Into<String>>(&self, accession: u32, name: S) -> Param {
        let mut param = Param::new();
        param.controlled_vocabulary = Some(*self);
        param.name = name.into();
        param.accession = Some(accession);
        param
    }

    pub fn param_val<S: Into<String>, V: ToString>(
        &self,
        accession: u32,
        name: S,
        value: V,
    ) -> Param {
        let mut param = self.param(accession, name);
        param.value = value.to_string();
        param
    }
}

impl FromStr for ControlledVocabulary {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MS" | "PSI-MS" => Ok(Self::MS),
            "UO" => Ok(Self::UO),
            _ => Ok(Self::Unknown),
        }
    }
}

pub type ParamList = Vec<Param>;

pub trait ParamDescribed {
    fn params(&self) -> &[Param];
    fn params_mut(&mut self) -> &mut ParamList;

    fn add_param(&mut self, param: Param) {
        self.params_mut().push(param);
    }

    fn remove_param(&mut self, index: usize) -> Param {
        self.params_mut().remove(index)
    }

    fn get_param_by_name(&self, name: &str) -> Option<&Param> {
        self.params().iter().find(|p| p.name == name)
    }

    fn get_param_by_accession(&self, accession: &str) -> Option<&Param> {
        let (cv, acc_num) = curie_to_num(accession);
        self.params()
            .iter()
            .find(|p| p.accession == acc_num && p.controlled_vocabulary == cv)
    }
}

#[macro_export]
macro_rules! impl_param_described {
    ($($t:ty), +) => {$(

        impl $crate::params::ParamDescribed for $t {
            fn params(&self) -> &[$crate::params::Param] {
                return &self.params
            }

            fn params_mut(&mut self) -> &mut $crate::params::ParamList {
                return &mut self.params
            }
        }
    )+};
}

/// Units that a term's value might have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    // Mass
    MZ,

    // Time
    Minute,
    Second,

    // Intensity
    DetectorCounts,

    // Activation energy
    Electronvolt,
    Volt,

    // Auxiliary traces
    Pressure,
    FlowRate,

    #[default]
    Unknown,
}

impl Unit {
    pub fn for_param(&self) -> (&'static str, &'static str) {
        match self {
            Self::Second => ("UO:0000010", "second"),
            Self::Minute => ("UO:0000031", "minute"),

            Self::MZ => ("MS:1000040", "m/z"),

            Self::DetectorCounts => ("MS:1000131", "number of detector counts"),

            Self::Electronvolt => ("UO:0000266", "electronvolt"),
            Self::Volt => ("UO:0000218", "volt"),

            Self::Pressure => ("UO:0000109", "pressure unit"),
            Self::FlowRate => ("UO:0000270", "volumetric flow rate unit"),

            Self::Unknown => ("", ""),
        }
    }
}
