//! Lazily indexed spectrum and chromatogram lists over SCIEX WIFF and WIFF2 acquisitions.
//!
//! The vendor library is reached through the provider traits in [`io::wiff`]. A
//! [`WiffReader`] opens a file through a [`io::wiff::WiffBackend`] and yields one
//! [`WiffRun`] per sample, whose lists build their indices on first use.
pub mod io;
pub mod meta;
pub mod params;
pub mod spectrum;

pub use crate::io::{
    ChromatogramList, ChromatogramListWiff, DetailLevel, ListAccessError, SpectrumList,
    SpectrumListWiff, WiffConfig, WiffReader, WiffRun,
};
pub use crate::meta::MSDataFileMetadata;
pub use crate::spectrum::{Chromatogram, Spectrum};
