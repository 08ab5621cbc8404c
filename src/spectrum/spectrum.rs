use mzpeaks::peak_set::PeakSetVec;
use mzpeaks::{CentroidPeak, MZ};

use super::arrays::BinaryArrayMap;
use super::scan_properties::{
    Precursor, Product, ScanPolarity, SignalContinuity, SpectrumDescription, SpectrumType,
};
use crate::params::{Param, ParamDescribed, ParamList};

/// Accession of the "total ion current" term
pub const TOTAL_ION_CURRENT: &str = "MS:1000285";
/// Accession of the "base peak m/z" term
pub const BASE_PEAK_MZ: &str = "MS:1000504";
/// Accession of the "base peak intensity" term
pub const BASE_PEAK_INTENSITY: &str = "MS:1000505";

/**
A mass spectrum record, populated up to the [`DetailLevel`](crate::io::DetailLevel) it was
requested at.

`default_array_length` is the number of points the spectrum has, which is known even when
`arrays` was not materialized.
*/
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spectrum {
    pub description: SpectrumDescription,
    pub arrays: Option<BinaryArrayMap>,
    pub default_array_length: usize,
    /// The arrays were centroided by the vendor library from profile data
    pub vendor_centroided: bool,
}

impl Spectrum {
    pub fn new(description: SpectrumDescription) -> Self {
        Self {
            description,
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.description.id
    }

    pub fn index(&self) -> usize {
        self.description.index
    }

    pub fn ms_level(&self) -> u8 {
        self.description.ms_level
    }

    pub fn polarity(&self) -> ScanPolarity {
        self.description.polarity
    }

    pub fn signal_continuity(&self) -> SignalContinuity {
        self.description.signal_continuity
    }

    pub fn spectrum_type(&self) -> SpectrumType {
        self.description.spectrum_type
    }

    /// The scan start time in minutes, if the spectrum was populated beyond its identity
    pub fn start_time(&self) -> Option<f64> {
        self.description
            .acquisition
            .first_scan()
            .map(|scan| scan.start_time)
    }

    pub fn precursor(&self) -> Option<&Precursor> {
        self.description.precursor.as_ref()
    }

    pub fn product(&self) -> Option<&Product> {
        self.description.product.as_ref()
    }

    pub fn arrays(&self) -> Option<&BinaryArrayMap> {
        self.arrays.as_ref()
    }

    fn param_f64(&self, accession: &str) -> Option<f64> {
        self.get_param_by_accession(accession)
            .and_then(|p| p.coerce::<f64>().ok())
    }

    pub fn total_ion_current(&self) -> Option<f64> {
        self.param_f64(TOTAL_ION_CURRENT)
    }

    /// The (m/z, intensity) pair of the most intense point, if recorded
    pub fn base_peak(&self) -> Option<(f64, f64)> {
        Some((
            self.param_f64(BASE_PEAK_MZ)?,
            self.param_f64(BASE_PEAK_INTENSITY)?,
        ))
    }

    /// View materialized centroided arrays as a peak list
    pub fn centroid_peaks(&self) -> Option<PeakSetVec<CentroidPeak, MZ>> {
        if self.signal_continuity() != SignalContinuity::Centroid && !self.vendor_centroided {
            return None;
        }
        let arrays = self.arrays.as_ref()?;
        let peaks = arrays
            .mzs()?
            .iter()
            .zip(arrays.intensities()?.iter())
            .enumerate()
            .map(|(i, (mz, intensity))| CentroidPeak::new(*mz, *intensity as f32, i as u32))
            .collect();
        Some(PeakSetVec::new(peaks))
    }
}

impl ParamDescribed for Spectrum {
    fn params(&self) -> &[Param] {
        self.description.params()
    }

    fn params_mut(&mut self) -> &mut ParamList {
        self.description.params_mut()
    }
}
