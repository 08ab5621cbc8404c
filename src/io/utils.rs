use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
#[cfg(feature = "checksum")]
use std::{fs, io, io::prelude::*, path};

#[cfg(feature = "checksum")]
use sha1::{Digest, Sha1};

/**
How much of a spectrum or chromatogram record to populate.

Levels are ordered, and every level populates a superset of what the levels below it do.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetailLevel {
    /// Only the index, id and kind of the record
    IdentityOnly,
    /// Everything the vendor tables can answer without summarizing the signal
    InstantMetadata,
    /// All metadata, including signal summaries and declared array lengths
    FullMetadata,
    /// All metadata and the decoded data arrays
    #[default]
    FullData,
}

/// Compute the SHA-1 digest of the file at `path` as a lowercase hex string
#[cfg(feature = "checksum")]
pub fn checksum_file(path: &path::Path) -> io::Result<String> {
    let mut checksum = Sha1::new();
    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let mut buf = vec![0u8; 2usize.pow(20)];
    loop {
        let i = reader.read(&mut buf)?;
        if i == 0 {
            break;
        }
        checksum.update(&buf[..i]);
    }
    Ok(base16ct::lower::encode_string(&checksum.finalize()))
}

/**
A warning that is logged the first time it is raised and never again for the life of
the process, however many places raise it.
*/
#[derive(Debug)]
pub struct OneShotWarning {
    message: &'static str,
    once: Once,
    emitted: AtomicUsize,
}

impl OneShotWarning {
    pub const fn new(message: &'static str) -> Self {
        Self {
            message,
            once: Once::new(),
            emitted: AtomicUsize::new(0),
        }
    }

    pub fn warn(&self) {
        self.once.call_once(|| {
            self.emitted.fetch_add(1, Ordering::SeqCst);
            log::warn!("{}", self.message);
        });
    }

    /// How many times the warning has been logged, zero or one
    pub fn times_emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }
}
