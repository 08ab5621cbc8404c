/*!
Lazily indexed access to SCIEX WIFF and WIFF2 files.

The vendor library is abstracted by the [`WiffFile`], [`Experiment`] and [`VendorSpectrum`]
traits. A [`WiffRun`] covers one sample of a file and exposes a [`SpectrumListWiff`] and a
[`ChromatogramListWiff`] over it. [`MemoryWiffFile`] implements the provider traits in memory.

```
use std::sync::Arc;
use wiffdata::io::wiff::{
    ExperimentType, MemoryExperiment, MemorySample, MemorySpectrum, MemoryWiffFile, WiffRun,
};
use wiffdata::io::{ChromatogramList, DetailLevel, SpectrumList, WiffConfig};

let file = MemoryWiffFile::new("run.wiff").add_sample(
    MemorySample::new("run").add_period(vec![MemoryExperiment::new(ExperimentType::MS)
        .add_cycle(MemorySpectrum::new(1, 0.1).with_data(vec![100.0], vec![5.0]))]),
);
let run = WiffRun::new(Arc::new(file), 0, WiffConfig::default())?;
assert_eq!(run.spectra().len()?, 1);
assert_eq!(run.chromatograms().find("TIC")?, 0);
let spectrum = run.spectra().spectrum(0, DetailLevel::FullData, &[])?.unwrap();
assert_eq!(spectrum.id(), "sample=1 period=1 cycle=1 experiment=1");
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
mod chromatogram_list;
mod config;
mod memory;
mod provider;
mod reader;
mod spectrum_list;

pub use chromatogram_list::{
    clean_adc_trace_name, make_sim_id, make_srm_id, ChromatogramIdentity, ChromatogramListWiff,
    ADC_TRACE_PREFIX,
};
pub use config::WiffConfig;
pub use memory::{CallCounters, MemoryExperiment, MemorySample, MemorySpectrum, MemoryWiffFile};
pub use provider::{
    load_experiments, AdcTrace, Experiment, ExperimentType, ExperimentsMap, FragmentationMode,
    IsolationInfo, PrecursorInfo, ProviderError, SelectedIonTrace, Target, VendorSpectrum,
    WiffBackend, WiffFile,
};
pub use reader::{make_run_id, WiffFormat, WiffReader, WiffReaderError, WiffRun, MISSING_BACKEND_REASON};
pub use spectrum_list::{
    default_policy_includes, experiment_excluded, is_wiff2, make_native_id,
    zero_length_policy_includes, SpectrumIdentity, SpectrumListWiff,
};

#[cfg(test)]
mod tests;
