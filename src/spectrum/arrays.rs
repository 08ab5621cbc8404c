use std::collections::TryReserveError;

use indexmap::map::Iter;
use indexmap::IndexMap;

use crate::params::Unit;

/// The semantic role of a data array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayType {
    MZArray,
    IntensityArray,
    TimeArray,
    /// A vendor trace with its own measurement, like an ADC channel
    NonStandardDataArray,
}

impl ArrayType {
    pub fn default_unit(&self) -> Unit {
        match self {
            Self::MZArray => Unit::MZ,
            Self::IntensityArray => Unit::DetectorCounts,
            Self::TimeArray => Unit::Minute,
            Self::NonStandardDataArray => Unit::Unknown,
        }
    }
}

/// A decoded array of values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataArray {
    pub name: ArrayType,
    pub data: Vec<f64>,
    pub unit: Unit,
}

impl DataArray {
    pub fn wrap(name: ArrayType, data: Vec<f64>) -> Self {
        Self {
            name,
            unit: name.default_unit(),
            data,
        }
    }

    /// Copy `values` into a new array, reporting allocation failure instead of aborting
    pub fn try_from_iter<I: ExactSizeIterator<Item = f64>>(
        name: ArrayType,
        values: I,
    ) -> Result<Self, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve_exact(values.len())?;
        data.extend(values);
        Ok(Self::wrap(name, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The collection of named arrays attached to a spectrum or chromatogram,
/// in insertion order
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryArrayMap {
    arrays: IndexMap<ArrayType, DataArray>,
}

impl BinaryArrayMap {
    pub fn new() -> BinaryArrayMap {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn add(&mut self, array: DataArray) {
        self.arrays.insert(array.name, array);
    }

    pub fn get(&self, array_type: &ArrayType) -> Option<&DataArray> {
        self.arrays.get(array_type)
    }

    pub fn has_array(&self, array_type: &ArrayType) -> bool {
        self.arrays.contains_key(array_type)
    }

    pub fn iter(&self) -> Iter<'_, ArrayType, DataArray> {
        self.arrays.iter()
    }

    pub fn mzs(&self) -> Option<&[f64]> {
        self.get(&ArrayType::MZArray).map(|a| a.data.as_slice())
    }

    pub fn intensities(&self) -> Option<&[f64]> {
        self.get(&ArrayType::IntensityArray).map(|a| a.data.as_slice())
    }

    pub fn times(&self) -> Option<&[f64]> {
        self.get(&ArrayType::TimeArray).map(|a| a.data.as_slice())
    }
}
