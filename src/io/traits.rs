//! The access contract shared by lazily indexed spectrum and chromatogram lists.
use std::collections::TryReserveError;
use std::io;
use std::iter::FusedIterator;

use thiserror::Error;

use crate::io::utils::DetailLevel;
use crate::io::wiff::ProviderError;
use crate::spectrum::{Chromatogram, Spectrum};

/// Errors that may occur when reading from a [`SpectrumList`] or [`ChromatogramList`]
#[derive(Debug, Error)]
pub enum ListAccessError {
    /// The requested flat index is not less than the list's size
    #[error("Bad index: {index} (list size is {size})")]
    OutOfRange { index: usize, size: usize },
    /// Materializing a record's arrays could not allocate
    #[error("Failed to allocate record arrays: {0}")]
    Allocation(#[from] TryReserveError),
    /// The one-time index build failed. The failure is permanent for the list.
    #[error("Failed to build the list index: {0}")]
    IndexBuild(#[source] ProviderError),
    /// The acquisition provider failed while decoding a record
    #[error("Provider failed while reading a record: {0}")]
    Provider(#[from] ProviderError),
}

impl From<ListAccessError> for io::Error {
    fn from(value: ListAccessError) -> Self {
        let s = value.to_string();
        match value {
            ListAccessError::OutOfRange { .. } => io::Error::new(io::ErrorKind::NotFound, s),
            ListAccessError::Allocation(_) => io::Error::new(io::ErrorKind::OutOfMemory, s),
            ListAccessError::IndexBuild(_) | ListAccessError::Provider(_) => {
                io::Error::new(io::ErrorKind::Other, s)
            }
        }
    }
}

/// The identifying fields every list entry carries
pub trait ListEntry {
    fn index(&self) -> usize;
    fn id(&self) -> &str;
}

/**
A random access list of [`Spectrum`] records whose index is built lazily.

All methods take `&self`. The first call to any of them builds the index, exactly once,
even if several threads race to make that first call.
*/
pub trait SpectrumList {
    type Identity: ListEntry + Clone;

    /// The number of spectra in the list
    fn len(&self) -> Result<usize, ListAccessError>;

    fn is_empty(&self) -> Result<bool, ListAccessError> {
        Ok(self.len()? == 0)
    }

    /// The identity of the spectrum at `index`, failing with [`ListAccessError::OutOfRange`]
    /// when `index >= len()`
    fn spectrum_identity(&self, index: usize) -> Result<Self::Identity, ListAccessError>;

    /// The flat index of the spectrum whose native ID is `id`, or `len()` when it is absent
    fn find(&self, id: &str) -> Result<usize, ListAccessError>;

    /// Read the spectrum at `index`, populated up to `detail_level`. Spectra whose MS level
    /// appears in `centroid_ms_levels` are centroided by the vendor library.
    fn spectrum(
        &self,
        index: usize,
        detail_level: DetailLevel,
        centroid_ms_levels: &[u8],
    ) -> Result<Option<Spectrum>, ListAccessError>;

    /// Iterate over the list in ascending index order, which is the access pattern
    /// the decode cache is tuned for
    fn iter_spectra(&self, detail_level: DetailLevel) -> SpectrumListIter<'_, Self>
    where
        Self: Sized,
    {
        SpectrumListIter::new(self, detail_level)
    }
}

/// A random access list of [`Chromatogram`] records whose index is built lazily.
pub trait ChromatogramList {
    type Identity: ListEntry + Clone;

    fn len(&self) -> Result<usize, ListAccessError>;

    fn is_empty(&self) -> Result<bool, ListAccessError> {
        Ok(self.len()? == 0)
    }

    fn chromatogram_identity(&self, index: usize) -> Result<Self::Identity, ListAccessError>;

    /// The flat index of the chromatogram whose native ID is `id`, or `len()` when it is absent
    fn find(&self, id: &str) -> Result<usize, ListAccessError>;

    fn chromatogram(
        &self,
        index: usize,
        detail_level: DetailLevel,
    ) -> Result<Option<Chromatogram>, ListAccessError>;

    fn iter_chromatograms(&self, detail_level: DetailLevel) -> ChromatogramListIter<'_, Self>
    where
        Self: Sized,
    {
        ChromatogramListIter::new(self, detail_level)
    }
}

/// An [`Iterator`] over a [`SpectrumList`] at a fixed [`DetailLevel`]
#[derive(Debug)]
pub struct SpectrumListIter<'a, L: SpectrumList> {
    source: &'a L,
    index: usize,
    detail_level: DetailLevel,
    centroid_ms_levels: Vec<u8>,
    done: bool,
}

impl<'a, L: SpectrumList> SpectrumListIter<'a, L> {
    pub fn new(source: &'a L, detail_level: DetailLevel) -> Self {
        Self {
            source,
            index: 0,
            detail_level,
            centroid_ms_levels: Vec::new(),
            done: false,
        }
    }

    /// Centroid spectra of these MS levels while iterating
    pub fn centroiding(mut self, ms_levels: &[u8]) -> Self {
        self.centroid_ms_levels = ms_levels.to_vec();
        self
    }
}

impl<L: SpectrumList> Iterator for SpectrumListIter<'_, L> {
    type Item = Result<Spectrum, ListAccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let size = match self.source.len() {
            Ok(size) => size,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if self.index >= size {
            self.done = true;
            return None;
        }
        let result = self
            .source
            .spectrum(self.index, self.detail_level, &self.centroid_ms_levels);
        self.index += 1;
        match result {
            Ok(Some(spec)) => Some(Ok(spec)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<L: SpectrumList> FusedIterator for SpectrumListIter<'_, L> {}

/// An [`Iterator`] over a [`ChromatogramList`] at a fixed [`DetailLevel`]
#[derive(Debug)]
pub struct ChromatogramListIter<'a, L: ChromatogramList> {
    source: &'a L,
    index: usize,
    detail_level: DetailLevel,
    done: bool,
}

impl<'a, L: ChromatogramList> ChromatogramListIter<'a, L> {
    pub fn new(source: &'a L, detail_level: DetailLevel) -> Self {
        Self {
            source,
            index: 0,
            detail_level,
            done: false,
        }
    }
}

impl<L: ChromatogramList> Iterator for ChromatogramListIter<'_, L> {
    type Item = Result<Chromatogram, ListAccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let size = match self.source.len() {
            Ok(size) => size,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if self.index >= size {
            self.done = true;
            return None;
        }
        let result = self.source.chromatogram(self.index, self.detail_level);
        self.index += 1;
        match result {
            Ok(Some(chrom)) => Some(Ok(chrom)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<L: ChromatogramList> FusedIterator for ChromatogramListIter<'_, L> {}
