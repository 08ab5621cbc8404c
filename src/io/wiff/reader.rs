use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::chromatogram_list::ChromatogramListWiff;
use super::config::WiffConfig;
use super::provider::{load_experiments, ExperimentType, ExperimentsMap, ProviderError, WiffBackend, WiffFile};
use super::spectrum_list::SpectrumListWiff;
#[cfg(feature = "checksum")]
use crate::io::utils::checksum_file;
use crate::meta::{
    DataProcessing, FileDescription, InstrumentConfiguration, MSDataFileMetadata,
    MassSpectrometryRun, ProcessingMethod, Software, SourceFile,
};
use crate::io::traits::SpectrumList;
use crate::params::{ControlledVocabulary, ParamDescribed};

const SOURCE_FILE_ID: &str = "WIFF";
const SCAN_SOURCE_FILE_ID: &str = "WIFFSCAN";
const ACQUISITION_SOFTWARE_ID: &str = "Analyst";
const READER_SOFTWARE_ID: &str = "wiffdata";
const DATA_PROCESSING_ID: &str = "wiffdata_conversion";

/// The reason reading fails when no vendor backend is available
pub const MISSING_BACKEND_REASON: &str = "requires ABSciex DLLs which only work on Windows";

/// The two WIFF container versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WiffFormat {
    Wiff,
    Wiff2,
}

#[derive(Debug, Error)]
pub enum WiffReaderError {
    #[error("ABSciex WIFF reader not implemented: {0}")]
    NotImplemented(String),
    #[error("{0} is not a WIFF file")]
    UnknownFormat(PathBuf),
    #[error("Run index {index} is out of range, the file has {count} samples")]
    RunIndexOutOfRange { index: usize, count: usize },
    #[error("The instrument model could not be determined: {0}")]
    UnknownInstrument(#[source] ProviderError),
    #[error("Failed to read from the vendor library: {0}")]
    Provider(#[from] ProviderError),
    #[error("An I/O error occurred: {0}")]
    IO(#[from] io::Error),
}

impl From<WiffReaderError> for io::Error {
    fn from(value: WiffReaderError) -> Self {
        match value {
            WiffReaderError::IO(e) => e,
            other => {
                let kind = match &other {
                    WiffReaderError::NotImplemented(_) => io::ErrorKind::Unsupported,
                    WiffReaderError::UnknownFormat(_) => io::ErrorKind::InvalidInput,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}

/**
Opens WIFF files and reads each of their samples as a [`WiffRun`].

This crate does not bundle the vendor library. A reader made with [`WiffReader::new`] can only
identify files, and every read fails with [`WiffReaderError::NotImplemented`]. Supply a
[`WiffBackend`] with [`WiffReader::with_backend`] to read.
*/
#[derive(Debug, Clone, Default)]
pub struct WiffReader {
    backend: Option<Arc<dyn WiffBackend>>,
    config: WiffConfig,
}

impl WiffReader {
    pub fn new(config: WiffConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    pub fn with_backend<B: WiffBackend + 'static>(backend: B, config: WiffConfig) -> Self {
        Self {
            backend: Some(Arc::new(backend)),
            config,
        }
    }

    pub fn config(&self) -> &WiffConfig {
        &self.config
    }

    /// Recognize a WIFF or WIFF2 file by its extension
    pub fn identify<P: AsRef<Path>>(path: P) -> Option<WiffFormat> {
        let ext = path.as_ref().extension()?;
        if ext.eq_ignore_ascii_case("wiff") {
            Some(WiffFormat::Wiff)
        } else if ext.eq_ignore_ascii_case("wiff2") {
            Some(WiffFormat::Wiff2)
        } else {
            None
        }
    }

    fn open(&self, path: &Path) -> Result<Arc<dyn WiffFile>, WiffReaderError> {
        if Self::identify(path).is_none() {
            return Err(WiffReaderError::UnknownFormat(path.to_path_buf()));
        }
        match &self.backend {
            Some(backend) => Ok(backend.open(path)?),
            None => Err(WiffReaderError::NotImplemented(
                MISSING_BACKEND_REASON.to_string(),
            )),
        }
    }

    /// Read the sample at `run_index` (0-based)
    pub fn read_run<P: AsRef<Path>>(
        &self,
        path: P,
        run_index: usize,
    ) -> Result<WiffRun, WiffReaderError> {
        let file = self.open(path.as_ref())?;
        WiffRun::new(file, run_index, self.config)
    }

    /// Read every sample of the file. Samples that fail to read are logged and skipped.
    pub fn read_all<P: AsRef<Path>>(&self, path: P) -> Result<Vec<WiffRun>, WiffReaderError> {
        let file = self.open(path.as_ref())?;
        let mut runs = Vec::with_capacity(file.sample_count());
        for run_index in 0..file.sample_count() {
            match WiffRun::new(file.clone(), run_index, self.config) {
                Ok(run) => runs.push(run),
                Err(e) => {
                    log::warn!(
                        "Skipping sample {} of {}: {e}",
                        run_index + 1,
                        path.as_ref().display()
                    );
                }
            }
        }
        Ok(runs)
    }

    /// The names of the samples in the file, one per run
    pub fn read_ids<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>, WiffReaderError> {
        Ok(self.open(path.as_ref())?.sample_names())
    }
}

fn file_location(path: &Path) -> String {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = parent.canonicalize().unwrap_or(parent);
    format!("file://{}", parent.display())
}

fn make_source_file(path: &Path, id: &str) -> SourceFile {
    SourceFile {
        name: path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        location: file_location(path),
        id: id.to_string(),
        file_format: Some(ControlledVocabulary::MS.param(1000562, "ABI WIFF format")),
        id_format: Some(ControlledVocabulary::MS.param(1000770, "WIFF nativeID format")),
        params: Vec::new(),
    }
}

#[cfg(feature = "checksum")]
fn add_checksum(source_file: &mut SourceFile, path: &Path) -> io::Result<()> {
    // Backends may report paths that are not on the local file system
    if path.is_file() {
        source_file.add_param(ControlledVocabulary::MS.param_val(
            1000569,
            "SHA-1",
            checksum_file(path)?,
        ));
    }
    Ok(())
}

#[cfg(not(feature = "checksum"))]
fn add_checksum(_source_file: &mut SourceFile, _path: &Path) -> io::Result<()> {
    Ok(())
}

fn make_file_description(
    path: &Path,
    experiments: &ExperimentsMap,
) -> Result<FileDescription, WiffReaderError> {
    let mut description = FileDescription::default();
    for (_, experiment) in experiments.iter() {
        match experiment.experiment_type() {
            ExperimentType::MRM => description.add_content(
                ControlledVocabulary::MS.param(1001473, "selected reaction monitoring chromatogram"),
            ),
            experiment_type => {
                if let Some(term) = experiment_type.spectrum_type().to_param() {
                    description.add_content(term);
                }
            }
        }
    }

    let mut wiff = make_source_file(path, SOURCE_FILE_ID);
    add_checksum(&mut wiff, path)?;
    description.source_files.push(wiff);

    let mut scan_path = path.as_os_str().to_owned();
    scan_path.push(".scan");
    let scan_path = PathBuf::from(scan_path);
    if scan_path.exists() {
        description
            .source_files
            .push(make_source_file(&scan_path, SCAN_SOURCE_FILE_ID));
    }
    Ok(description)
}

/// The run ID is the file stem, qualified by the sample name unless the sample name
/// already contains it
pub fn make_run_id(path: &Path, sample_name: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if sample_name.is_empty() {
        stem
    } else if sample_name.contains(&stem) {
        sample_name.to_string()
    } else {
        format!("{stem}-{sample_name}")
    }
}

fn make_softwares() -> Vec<Software> {
    vec![
        Software::new(
            ACQUISITION_SOFTWARE_ID.to_string(),
            "unknown".to_string(),
            vec![ControlledVocabulary::MS.param(1000551, "Analyst")],
        ),
        Software::new(
            READER_SOFTWARE_ID.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            vec![ControlledVocabulary::MS.param_val(
                1000799,
                "custom unreleased software tool",
                READER_SOFTWARE_ID,
            )],
        ),
    ]
}

fn make_data_processing() -> DataProcessing {
    let mut dp = DataProcessing {
        id: DATA_PROCESSING_ID.to_string(),
        ..Default::default()
    };
    let mut method = ProcessingMethod {
        order: 0,
        software_reference: READER_SOFTWARE_ID.to_string(),
        ..Default::default()
    };
    method.add_param(ControlledVocabulary::MS.param(1000530, "file format conversion"));
    dp.push(method);
    dp
}

fn make_instrument_configuration(
    file: &dyn WiffFile,
    config: &WiffConfig,
) -> Result<InstrumentConfiguration, WiffReaderError> {
    let mut ic = InstrumentConfiguration {
        id: 0,
        software_reference: ACQUISITION_SOFTWARE_ID.to_string(),
        ..Default::default()
    };
    match file.instrument_model() {
        Ok(model) => {
            ic.add_param(ControlledVocabulary::MS.param_val(
                1000121,
                "SCIEX instrument model",
                model,
            ));
        }
        Err(e) if config.unknown_instrument_is_error => {
            return Err(WiffReaderError::UnknownInstrument(e));
        }
        Err(e) => {
            log::warn!(
                "Unable to determine the instrument model of {}: {e}",
                file.wiff_path().display()
            );
            ic.add_param(ControlledVocabulary::MS.param(1000121, "SCIEX instrument model"));
        }
    }
    Ok(ic)
}

/**
One sample of a WIFF file: its run metadata, its spectra and its chromatograms.

Both lists share the sample's experiment handles, which are loaded once when the run
is opened. Neither list's index is built until it is first used.
*/
#[derive(Debug)]
pub struct WiffRun {
    sample: usize,
    sample_name: String,
    source_path: PathBuf,
    file_description: FileDescription,
    instrument_configurations: HashMap<u32, InstrumentConfiguration>,
    softwares: Vec<Software>,
    data_processings: Vec<DataProcessing>,
    run: MassSpectrometryRun,
    spectra: SpectrumListWiff,
    chromatograms: ChromatogramListWiff,
}

impl WiffRun {
    /// Open the sample at `run_index` (0-based) of an already opened file
    pub fn new(
        file: Arc<dyn WiffFile>,
        run_index: usize,
        config: WiffConfig,
    ) -> Result<Self, WiffReaderError> {
        let count = file.sample_count();
        if run_index >= count {
            return Err(WiffReaderError::RunIndexOutOfRange {
                index: run_index,
                count,
            });
        }
        let sample = run_index + 1;
        let sample_name = file
            .sample_names()
            .get(run_index)
            .cloned()
            .unwrap_or_default();
        let path = file.wiff_path().to_path_buf();

        let experiments = Arc::new(load_experiments(file.as_ref(), sample)?);
        let file_description = make_file_description(&path, &experiments)?;
        let ic = make_instrument_configuration(file.as_ref(), &config)?;

        let run = MassSpectrometryRun {
            id: Some(make_run_id(&path, &sample_name)),
            default_data_processing_id: Some(DATA_PROCESSING_ID.to_string()),
            default_instrument_id: Some(ic.id),
            default_source_file_id: Some(SOURCE_FILE_ID.to_string()),
            start_time: file.sample_acquisition_time(sample)?,
        };

        let spectra = SpectrumListWiff::new(file.clone(), sample, experiments.clone(), config)
            .with_instrument_configuration_id(ic.id);
        let chromatograms = ChromatogramListWiff::new(file, sample, experiments, config);

        let mut instrument_configurations = HashMap::new();
        instrument_configurations.insert(ic.id, ic);

        Ok(Self {
            sample,
            sample_name,
            source_path: path,
            file_description,
            instrument_configurations,
            softwares: make_softwares(),
            data_processings: vec![make_data_processing()],
            run,
            spectra,
            chromatograms,
        })
    }

    /// The 1-based sample number this run reads
    pub fn sample(&self) -> usize {
        self.sample
    }

    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    pub fn id(&self) -> Option<&str> {
        self.run.id.as_deref()
    }

    pub fn spectra(&self) -> &SpectrumListWiff {
        &self.spectra
    }

    pub fn chromatograms(&self) -> &ChromatogramListWiff {
        &self.chromatograms
    }
}

impl MSDataFileMetadata for WiffRun {
    fn data_processings(&self) -> &Vec<DataProcessing> {
        &self.data_processings
    }

    fn instrument_configurations(&self) -> &HashMap<u32, InstrumentConfiguration> {
        &self.instrument_configurations
    }

    fn file_description(&self) -> &FileDescription {
        &self.file_description
    }

    fn softwares(&self) -> &Vec<Software> {
        &self.softwares
    }

    fn run_description(&self) -> Option<&MassSpectrometryRun> {
        Some(&self.run)
    }

    fn source_file_name(&self) -> Option<&str> {
        self.source_path.file_name().and_then(|s| s.to_str())
    }

    /// This builds the spectrum index if it has not been built yet
    fn spectrum_count_hint(&self) -> Option<u64> {
        self.spectra.len().ok().map(|n| n as u64)
    }
}
