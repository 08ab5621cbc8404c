use super::arrays::BinaryArrayMap;
use super::scan_properties::{
    ChromatogramDescription, ChromatogramType, Precursor, Product, ScanPolarity,
};
use crate::params::{Param, ParamDescribed, ParamList};

/// A chromatogram record, populated up to the [`DetailLevel`](crate::io::DetailLevel) it was
/// requested at.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chromatogram {
    pub description: ChromatogramDescription,
    pub arrays: Option<BinaryArrayMap>,
    pub default_array_length: usize,
}

impl Chromatogram {
    pub fn new(description: ChromatogramDescription) -> Self {
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

    pub fn chromatogram_type(&self) -> ChromatogramType {
        self.description.chromatogram_type
    }

    pub fn polarity(&self) -> ScanPolarity {
        self.description.polarity
    }

    pub fn precursor(&self) -> Option<&Precursor> {
        self.description.precursor.as_ref()
    }

    pub fn product(&self) -> Option<&Product> {
        self.description.product.as_ref()
    }

    pub fn time(&self) -> Option<&[f64]> {
        self.arrays.as_ref()?.times()
    }

    pub fn intensity(&self) -> Option<&[f64]> {
        self.arrays.as_ref()?.intensities()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.time()?.first().copied()
    }

    pub fn end_time(&self) -> Option<f64> {
        self.time()?.last().copied()
    }

    /// The time of the most intense point
    pub fn apex_time(&self) -> Option<f64> {
        let (time, intensity) = (self.time()?, self.intensity()?);
        time.iter()
            .zip(intensity.iter())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(t, _)| *t)
    }
}

impl ParamDescribed for Chromatogram {
    fn params(&self) -> &[Param] {
        self.description.params()
    }

    fn params_mut(&mut self) -> &mut ParamList {
        self.description.params_mut()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spectrum::arrays::{ArrayType, DataArray};

    #[test]
    fn test_time_bounds() {
        let mut chrom = Chromatogram::default();
        assert!(chrom.start_time().is_none());

        let mut arrays = BinaryArrayMap::new();
        arrays.add(DataArray::wrap(ArrayType::TimeArray, vec![0.5, 1.0, 1.5]));
        arrays.add(DataArray::wrap(ArrayType::IntensityArray, vec![3.0, 9.0, 1.0]));
        chrom.arrays = Some(arrays);

        assert_eq!(chrom.start_time(), Some(0.5));
        assert_eq!(chrom.end_time(), Some(1.5));
        assert_eq!(chrom.apex_time(), Some(1.0));
    }
}
