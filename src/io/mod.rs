//! Reading SCIEX WIFF acquisitions through lazily indexed spectrum and chromatogram lists.
//!
//! The vendor library does the byte-level decoding. This module builds flat, id-addressable
//! indices over its sample → period → experiment → cycle hierarchy and materializes generic
//! records from it on demand.

mod id_index;
pub mod traits;
pub(crate) mod utils;
pub mod wiff;

pub use crate::io::id_index::IdIndex;
pub use crate::io::traits::{
    ChromatogramList, ChromatogramListIter, ListAccessError, ListEntry, SpectrumList,
    SpectrumListIter,
};
#[cfg(feature = "checksum")]
pub use crate::io::utils::checksum_file;
pub use crate::io::utils::DetailLevel;
pub use crate::io::wiff::{
    ChromatogramListWiff, MemoryWiffFile, ProviderError, SpectrumListWiff, WiffConfig,
    WiffFormat, WiffReader, WiffReaderError, WiffRun,
};
