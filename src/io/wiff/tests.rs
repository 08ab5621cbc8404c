//! Scenario tests for reading WIFF runs through the in-memory provider
use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use mzpeaks::PeakCollection;
use rayon::prelude::*;

use super::spectrum_list::WIFF2_TARGETED_WARNING;
use super::*;
use crate::io::traits::{ChromatogramList, ListAccessError, ListEntry, SpectrumList};
use crate::io::utils::DetailLevel;
use crate::meta::MSDataFileMetadata;
use crate::params::ParamDescribed;
use crate::spectrum::{
    ActivationMethod, ArrayType, ChromatogramType, ScanPolarity, SignalContinuity, SpectrumType,
};

fn product_spectrum() -> MemorySpectrum {
    MemorySpectrum::new(2, 0.2)
        .with_data(vec![150.0], vec![7.0])
        .with_precursor(PrecursorInfo {
            selected_mz: 499.9,
            intensity: 1000.0,
            charge: 2,
        })
        .with_isolation(IsolationInfo {
            collision_energy: 35.0,
            ..IsolationInfo::new(500.0, 499.5, 500.5)
        })
}

fn qc_sample(name: &str) -> MemorySample {
    let ms1 = MemoryExperiment::new(ExperimentType::MS)
        .with_polarity(ScanPolarity::Positive)
        .with_mass_range(100.0, 1000.0)
        .add_cycle(MemorySpectrum::new(1, 0.1).with_data(vec![100.0, 200.0], vec![10.0, 20.0]))
        .add_cycle(MemorySpectrum::new(1, 0.3).with_data(vec![100.0, 200.0], vec![5.0, 0.0]));
    let ms2 = MemoryExperiment::new(ExperimentType::Product)
        .with_polarity(ScanPolarity::Positive)
        .add_cycle(product_spectrum());
    let mrm = MemoryExperiment::new(ExperimentType::MRM)
        .add_transition(
            Target {
                dwell_time: 20.0,
                collision_energy: 25.0,
                declustering_potential: 80.0,
                ..Target::new(500.1, 200.2)
            },
            SelectedIonTrace {
                times: vec![0.1, 0.2, 0.3],
                intensities: vec![1.0, 9.0, 2.0],
                ..Default::default()
            },
        )
        .add_transition(Target::new(600.0, 300.0), SelectedIonTrace::default());
    MemorySample::new(name)
        .add_period(vec![ms1, ms2, mrm])
        .add_adc_trace(
            "ADC: Pump Pressure",
            AdcTrace {
                x: vec![0.0, 0.5],
                y: vec![250.0, 260.0],
                units: "psi".into(),
            },
        )
        .add_adc_trace("Column Temperature", AdcTrace::default())
}

fn qc_file(path: &str) -> Arc<MemoryWiffFile> {
    Arc::new(
        MemoryWiffFile::new(path)
            .with_instrument_model("TripleTOF 6600")
            .add_sample(qc_sample("QC")),
    )
}

fn lists(
    file: &Arc<MemoryWiffFile>,
    config: WiffConfig,
) -> (SpectrumListWiff, ChromatogramListWiff) {
    let handle: Arc<dyn WiffFile> = file.clone();
    let experiments = Arc::new(load_experiments(handle.as_ref(), 1).unwrap());
    (
        SpectrumListWiff::new(handle.clone(), 1, experiments.clone(), config),
        ChromatogramListWiff::new(handle, 1, experiments, config),
    )
}

#[test_log::test]
fn test_spectrum_index_order() {
    let file = qc_file("qc.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    assert_eq!(spectra.len().unwrap(), 3);
    let ids: Vec<_> = (0..3)
        .map(|i| spectra.spectrum_identity(i).unwrap().id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "sample=1 period=1 cycle=1 experiment=1",
            "sample=1 period=1 cycle=1 experiment=2",
            "sample=1 period=1 cycle=2 experiment=1",
        ]
    );
    let identity = spectra.spectrum_identity(2).unwrap();
    assert_eq!(identity.index(), 2);
    assert_eq!((identity.period, identity.cycle, identity.experiment), (1, 2, 1));

    let times: Vec<_> = spectra
        .iter_spectra(DetailLevel::InstantMetadata)
        .map(|s| s.unwrap().start_time().unwrap())
        .collect();
    assert_eq!(times, vec![0.1, 0.2, 0.3]);
}

#[test_log::test]
fn test_chromatogram_index_order() {
    let file = qc_file("qc.wiff");
    let (_, chromatograms) = lists(&file, WiffConfig::default());
    assert_eq!(chromatograms.len().unwrap(), 5);
    assert_eq!(chromatograms.find("TIC").unwrap(), 0);
    assert_eq!(chromatograms.find("BPC").unwrap(), 1);
    let ids: Vec<_> = (0..5)
        .map(|i| chromatograms.chromatogram_identity(i).unwrap())
        .collect();
    assert_eq!(
        ids[2].id,
        "SRM SIC Q1=500.1 Q3=200.2 sample=1 period=1 experiment=3 transition=0"
    );
    assert_eq!(
        ids[3].id,
        "SRM SIC Q1=600 Q3=300 sample=1 period=1 experiment=3 transition=1"
    );
    assert_eq!(ids[4].id, "Pump Pressure (channel 1)");
    assert_eq!(
        ids.iter().map(|i| i.chromatogram_type).collect::<Vec<_>>(),
        vec![
            ChromatogramType::TotalIonCurrentChromatogram,
            ChromatogramType::BasePeakChromatogram,
            ChromatogramType::SelectedReactionMonitoringChromatogram,
            ChromatogramType::SelectedReactionMonitoringChromatogram,
            ChromatogramType::PressureChromatogram,
        ]
    );
    // The index build only lists the traces, it does not read them
    assert_eq!(file.counters().sic_reads(), 0);
    assert_eq!(file.counters().tic_reads(), 0);
}

#[test_log::test]
fn test_find_is_inverse_of_identity() {
    let file = qc_file("qc.wiff");
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());
    for i in 0..spectra.len().unwrap() {
        let id = spectra.spectrum_identity(i).unwrap().id;
        assert_eq!(spectra.find(&id).unwrap(), i);
    }
    for i in 0..chromatograms.len().unwrap() {
        let id = chromatograms.chromatogram_identity(i).unwrap().id;
        assert_eq!(chromatograms.find(&id).unwrap(), i);
    }
    assert_eq!(spectra.find("sample=9 period=1 cycle=1 experiment=1").unwrap(), 3);
    assert_eq!(chromatograms.find("XIC").unwrap(), 5);
}

#[test_log::test]
fn test_out_of_range() {
    let file = qc_file("qc.wiff");
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());

    let err = spectra.spectrum_identity(3).unwrap_err();
    assert!(matches!(err, ListAccessError::OutOfRange { index: 3, size: 3 }));
    assert_eq!(err.to_string(), "Bad index: 3 (list size is 3)");
    assert!(matches!(
        spectra.spectrum(3, DetailLevel::IdentityOnly, &[]),
        Err(ListAccessError::OutOfRange { index: 3, size: 3 })
    ));
    assert!(spectra.spectrum(2, DetailLevel::FullData, &[]).is_ok());

    assert!(matches!(
        chromatograms.chromatogram_identity(5),
        Err(ListAccessError::OutOfRange { index: 5, size: 5 })
    ));
    assert!(matches!(
        chromatograms.chromatogram(usize::MAX, DetailLevel::FullData),
        Err(ListAccessError::OutOfRange { .. })
    ));

    let err: std::io::Error = spectra.spectrum_identity(7).unwrap_err().into();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test_log::test]
fn test_index_built_once_under_contention() {
    let file = qc_file("qc.wiff");
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());
    (0..64).into_par_iter().for_each(|i| {
        assert_eq!(spectra.len().unwrap(), 3);
        assert_eq!(chromatograms.len().unwrap(), 5);
        let spectrum = spectra
            .spectrum(i % 3, DetailLevel::FullMetadata, &[])
            .unwrap()
            .unwrap();
        assert_eq!(spectrum.index(), i % 3);
    });
    // One BPC read per experiment that can hold spectra
    assert_eq!(file.counters().bpc_reads(), 2);
    assert_eq!(file.counters().adc_trace_listings(), 1);
}

#[test_log::test]
fn test_failed_build_is_permanent() {
    let file = Arc::new(MemoryWiffFile::new("broken.wiff").add_sample(
        MemorySample::new("broken").add_period(vec![MemoryExperiment::new(ExperimentType::MS)
            .add_cycle(MemorySpectrum::new(1, 0.1).with_data(vec![100.0], vec![1.0]))
            .failing("vendor exploded")]),
    ));
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());

    for _ in 0..3 {
        match spectra.len() {
            Err(ListAccessError::IndexBuild(ProviderError::Vendor(message))) => {
                assert_eq!(message, "vendor exploded")
            }
            other => panic!("Expected an index build failure, got {other:?}"),
        }
    }
    assert!(matches!(
        spectra.spectrum(0, DetailLevel::FullData, &[]),
        Err(ListAccessError::IndexBuild(_))
    ));
    assert!(matches!(spectra.find("anything"), Err(ListAccessError::IndexBuild(_))));
    assert_eq!(file.counters().bpc_reads(), 1);
    assert!(spectra.iter_spectra(DetailLevel::FullData).next().unwrap().is_err());

    // The chromatogram index does not read the TIC, only materializing it does
    assert_eq!(chromatograms.len().unwrap(), 2);
    assert!(chromatograms
        .chromatogram(0, DetailLevel::IdentityOnly)
        .unwrap()
        .is_some());
    assert!(matches!(
        chromatograms.chromatogram(0, DetailLevel::FullData),
        Err(ListAccessError::Provider(_))
    ));
}

#[test_log::test]
fn test_spectrum_detail_levels() {
    let file = qc_file("qc.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    spectra.len().unwrap();
    let decodes = file.counters().spectrum_decodes();

    let identity = spectra
        .spectrum(1, DetailLevel::IdentityOnly, &[])
        .unwrap()
        .unwrap();
    assert_eq!(identity.id(), "sample=1 period=1 cycle=1 experiment=2");
    assert_eq!(identity.index(), 1);
    assert_eq!(identity.ms_level(), 0);
    assert!(identity.precursor().is_none());
    assert_eq!(file.counters().spectrum_decodes(), decodes);

    let instant = spectra
        .spectrum(1, DetailLevel::InstantMetadata, &[])
        .unwrap()
        .unwrap();
    assert_eq!(instant.ms_level(), 2);
    assert_eq!(instant.spectrum_type(), SpectrumType::MSnSpectrum);
    assert_eq!(instant.polarity(), ScanPolarity::Positive);
    assert_eq!(instant.start_time(), Some(0.2));
    let precursor = instant.precursor().unwrap();
    let ion = precursor.ion().unwrap();
    assert_eq!(ion.mz, 500.0);
    assert_eq!(ion.charge, Some(2));
    assert_eq!(precursor.isolation_window.lower_bound, 499.5);
    assert_eq!(precursor.isolation_window.upper_bound, 500.5);
    assert_eq!(
        precursor.activation.method,
        Some(ActivationMethod::BeamTypeCollisionInducedDissociation)
    );
    assert_eq!(precursor.activation.energy, 35.0);
    assert!(instant.total_ion_current().is_none());
    assert!(instant.arrays.is_none());

    let metadata = spectra
        .spectrum(1, DetailLevel::FullMetadata, &[])
        .unwrap()
        .unwrap();
    assert_eq!(metadata.total_ion_current(), Some(7.0));
    assert_eq!(metadata.base_peak(), Some((150.0, 7.0)));
    assert_eq!(metadata.default_array_length, 1);
    assert!(metadata.arrays.is_none());
    assert_eq!(metadata.precursor(), instant.precursor());

    let full = spectra
        .spectrum(1, DetailLevel::FullData, &[])
        .unwrap()
        .unwrap();
    let arrays = full.arrays().unwrap();
    assert_eq!(arrays.mzs(), Some(&[150.0][..]));
    assert_eq!(arrays.intensities(), Some(&[7.0][..]));
    assert_eq!(full.description.params, metadata.description.params);

    // Every non-identity level above reused the same decode
    assert_eq!(file.counters().spectrum_decodes(), decodes + 1);
}

#[test_log::test]
fn test_scan_description() {
    let file = qc_file("qc.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    let spectrum = spectra
        .spectrum(0, DetailLevel::InstantMetadata, &[])
        .unwrap()
        .unwrap();
    let scan = spectrum.description.acquisition.first_scan().unwrap();
    assert_eq!(scan.scan_windows[0].lower_bound, 100.0);
    assert_eq!(scan.scan_windows[0].upper_bound, 1000.0);
    assert_eq!(
        scan.get_param_by_name("preset scan configuration")
            .unwrap()
            .value,
        "1"
    );
    assert!(spectrum
        .description
        .acquisition
        .get_param_by_name("no combination")
        .is_some());
    assert_eq!(spectrum.signal_continuity(), SignalContinuity::Centroid);
    assert_eq!(spectrum.spectrum_type(), SpectrumType::MS1Spectrum);
    assert!(spectrum.precursor().is_none());
}

#[test_log::test]
fn test_decode_cache() {
    let file = qc_file("qc.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    spectra.len().unwrap();
    let base = file.counters().spectrum_decodes();

    spectra.spectrum(0, DetailLevel::FullData, &[]).unwrap();
    spectra.spectrum(0, DetailLevel::FullData, &[]).unwrap();
    assert_eq!(file.counters().spectrum_decodes(), base + 1);

    spectra.spectrum(1, DetailLevel::FullData, &[]).unwrap();
    assert_eq!(file.counters().spectrum_decodes(), base + 2);

    // Only one spectrum is kept
    spectra.spectrum(0, DetailLevel::FullData, &[]).unwrap();
    assert_eq!(file.counters().spectrum_decodes(), base + 3);

    let n = spectra
        .iter_spectra(DetailLevel::FullMetadata)
        .filter(|s| s.is_ok())
        .count();
    assert_eq!(n, 3);
    // Index 0 is still cached, so iterating decodes the other two
    assert_eq!(file.counters().spectrum_decodes(), base + 5);
}

#[test_log::test]
fn test_global_chromatograms() {
    let file = qc_file("qc.wiff");
    let (_, chromatograms) = lists(&file, WiffConfig::default());

    let tic = chromatograms
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(tic.chromatogram_type(), ChromatogramType::TotalIonCurrentChromatogram);
    assert_eq!(tic.time(), Some(&[0.1, 0.2, 0.3][..]));
    assert_eq!(tic.intensity(), Some(&[30.0, 7.0, 5.0][..]));
    assert_eq!(tic.default_array_length, 3);

    let bpc = chromatograms
        .chromatogram(1, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(bpc.intensity(), Some(&[20.0, 7.0, 5.0][..]));
    assert_eq!(bpc.apex_time(), Some(0.1));

    let reads = file.counters().tic_reads();
    let shell = chromatograms
        .chromatogram(0, DetailLevel::InstantMetadata)
        .unwrap()
        .unwrap();
    assert_eq!(shell.id(), "TIC");
    assert!(shell.arrays.is_none());
    assert_eq!(shell.default_array_length, 0);
    assert_eq!(file.counters().tic_reads(), reads);

    let metadata = chromatograms
        .chromatogram(0, DetailLevel::FullMetadata)
        .unwrap()
        .unwrap();
    assert_eq!(metadata.default_array_length, 3);
    assert!(metadata.arrays.is_none());
}

fn overlapping_file() -> Arc<MemoryWiffFile> {
    Arc::new(
        MemoryWiffFile::new("overlap.wiff").add_sample(
            MemorySample::new("overlap").add_period(vec![
                MemoryExperiment::new(ExperimentType::MS)
                    .with_tic(vec![1.0, 2.0], vec![3.0, 4.0])
                    .with_bpc(vec![1.0, 2.0], vec![3.0, 4.0]),
                MemoryExperiment::new(ExperimentType::Product)
                    .with_tic(vec![2.0, 3.0], vec![10.0, 1.0])
                    .with_bpc(vec![2.0, 3.0], vec![10.0, 1.0]),
                MemoryExperiment::new(ExperimentType::Product)
                    .with_tic(vec![3.0], vec![6.0])
                    .without_bpc(),
            ]),
        ),
    )
}

#[test_log::test]
fn test_aggregation_at_shared_times() {
    let file = overlapping_file();
    let (_, chromatograms) = lists(&file, WiffConfig::default());

    let tic = chromatograms
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(tic.time(), Some(&[1.0, 2.0, 3.0][..]));
    assert_eq!(tic.intensity(), Some(&[3.0, 14.0, 7.0][..]));

    // An experiment without a recorded BPC adds nothing to the whole-run BPC
    let bpc = chromatograms
        .chromatogram(1, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(bpc.time(), Some(&[1.0, 2.0, 3.0][..]));
    assert_eq!(bpc.intensity(), Some(&[3.0, 14.0, 1.0][..]));
    assert_eq!(bpc.apex_time(), Some(2.0));

    let (_, ms1_only) = lists(
        &file,
        WiffConfig::default().with_global_chromatograms_are_ms1_only(true),
    );
    let tic = ms1_only
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(tic.time(), Some(&[1.0, 2.0][..]));
    assert_eq!(tic.intensity(), Some(&[3.0, 4.0][..]));
}

#[test_log::test]
fn test_transition_chromatograms() {
    let file = qc_file("qc.wiff");
    let (_, chromatograms) = lists(&file, WiffConfig::default());

    let instant = chromatograms
        .chromatogram(2, DetailLevel::InstantMetadata)
        .unwrap()
        .unwrap();
    let precursor = instant.precursor().unwrap();
    assert_eq!(precursor.isolation_window.target, 500.1);
    assert_eq!(
        precursor.activation.method,
        Some(ActivationMethod::CollisionInducedDissociation)
    );
    assert_eq!(precursor.activation.energy, 25.0);
    assert_eq!(
        precursor
            .activation
            .get_param_by_name("declustering potential")
            .unwrap()
            .value,
        "80"
    );
    assert_eq!(instant.product().unwrap().isolation_window.target, 200.2);
    let dwell = instant.get_param_by_name("dwell time").unwrap();
    assert_eq!(dwell.coerce::<f64>().unwrap(), 0.02);
    assert!(instant.arrays.is_none());
    assert_eq!(file.counters().sic_reads(), 0);

    let metadata = chromatograms
        .chromatogram(2, DetailLevel::FullMetadata)
        .unwrap()
        .unwrap();
    assert_eq!(metadata.default_array_length, 3);
    assert!(metadata.arrays.is_none());
    assert_eq!(file.counters().sic_reads(), 1);

    let full = chromatograms
        .chromatogram(2, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(full.time(), Some(&[0.1, 0.2, 0.3][..]));
    assert_eq!(full.apex_time(), Some(0.2));
    assert_eq!(full.description.params, instant.description.params);

    let empty = chromatograms
        .chromatogram(3, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(empty.default_array_length, 0);
    assert_eq!(empty.time(), Some(&[][..]));
}

#[test_log::test]
fn test_sim_chromatograms() {
    let file = Arc::new(
        MemoryWiffFile::new("sim.wiff").add_sample(MemorySample::new("sim").add_period(vec![
            MemoryExperiment::new(ExperimentType::SIM)
                .with_polarity(ScanPolarity::Negative)
                .add_transition(Target::new(301.5, 0.0), SelectedIonTrace::default()),
        ])),
    );
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());
    assert_eq!(spectra.len().unwrap(), 0);
    assert_eq!(chromatograms.len().unwrap(), 3);
    let sim = chromatograms
        .chromatogram(2, DetailLevel::InstantMetadata)
        .unwrap()
        .unwrap();
    assert_eq!(
        sim.id(),
        "- SIM SIC Q1=301.5 sample=1 period=1 experiment=1 transition=0"
    );
    assert_eq!(sim.chromatogram_type(), ChromatogramType::SelectedIonMonitoringChromatogram);
    assert_eq!(sim.polarity(), ScanPolarity::Negative);
    assert!(sim.product().is_none());
}

#[test_log::test]
fn test_adc_chromatograms() {
    let file = qc_file("qc.wiff");
    let (_, chromatograms) = lists(&file, WiffConfig::default());
    let index = chromatograms.find("Pump Pressure (channel 1)").unwrap();
    assert_eq!(index, 4);

    let metadata = chromatograms
        .chromatogram(index, DetailLevel::FullMetadata)
        .unwrap()
        .unwrap();
    assert_eq!(metadata.default_array_length, 0);
    assert!(metadata.arrays.is_none());
    assert!(metadata.get_param_by_name("units").is_none());

    let full = chromatograms
        .chromatogram(index, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(full.get_param_by_name("units").unwrap().value, "psi");
    assert_eq!(full.default_array_length, 2);
    let arrays = full.arrays.as_ref().unwrap();
    assert_eq!(arrays.times(), Some(&[0.0, 0.5][..]));
    let values = arrays.get(&ArrayType::NonStandardDataArray).unwrap();
    assert_eq!(values.data, vec![250.0, 260.0]);
    assert_eq!(values.unit, crate::params::Unit::Pressure);
}

#[test_log::test]
fn test_srm_as_spectra() {
    let file = Arc::new(
        MemoryWiffFile::new("mrm.wiff").add_sample(MemorySample::new("mrm").add_period(vec![
            MemoryExperiment::new(ExperimentType::MRM)
                .add_cycle(MemorySpectrum::new(2, 0.5).with_data(vec![200.2], vec![4.0]))
                .add_transition(Target::new(500.1, 200.2), SelectedIonTrace::default()),
        ])),
    );
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());
    assert_eq!(spectra.len().unwrap(), 0);
    assert_eq!(chromatograms.len().unwrap(), 3);

    let (spectra, chromatograms) = lists(&file, WiffConfig::default().with_srm_as_spectra(true));
    assert_eq!(spectra.len().unwrap(), 1);
    let spectrum = spectra
        .spectrum(0, DetailLevel::InstantMetadata, &[])
        .unwrap()
        .unwrap();
    assert_eq!(spectrum.spectrum_type(), SpectrumType::SRMSpectrum);
    // The transitions stay chromatograms either way
    assert_eq!(chromatograms.len().unwrap(), 3);
}

fn wiff2_file() -> Arc<MemoryWiffFile> {
    Arc::new(
        MemoryWiffFile::new("run.WIFF2").add_sample(MemorySample::new("run").add_period(vec![
            MemoryExperiment::new(ExperimentType::MS)
                .add_cycle(MemorySpectrum::new(1, 0.1).with_data(vec![100.0], vec![1.0])),
            MemoryExperiment::new(ExperimentType::MRM)
                .with_tic(vec![0.1, 0.2], vec![40.0, 50.0])
                .with_bpc(vec![0.1, 0.2], vec![40.0, 50.0])
                .add_cycle(MemorySpectrum::new(2, 0.2).with_data(vec![200.0], vec![1.0]))
                .add_transition(Target::new(500.0, 200.0), SelectedIonTrace::default()),
        ])),
    )
}

#[test_log::test]
fn test_wiff2_skips_targeted_experiments() {
    let file = wiff2_file();
    let config = WiffConfig::default()
        .with_srm_as_spectra(true)
        .with_sim_as_spectra(true);
    let (spectra, chromatograms) = lists(&file, config);
    assert_eq!(spectra.len().unwrap(), 1);
    assert_eq!(
        spectra.spectrum_identity(0).unwrap().id,
        "sample=1 period=1 cycle=1 experiment=1"
    );
    assert_eq!(chromatograms.len().unwrap(), 2);

    // Both lists have skipped the MRM experiment, and the warning about it was logged once
    assert_eq!(WIFF2_TARGETED_WARNING.times_emitted(), 1);

    // The skipped experiment does not reach the whole-run chromatograms either
    for index in 0..2 {
        let chromatogram = chromatograms
            .chromatogram(index, DetailLevel::FullData)
            .unwrap()
            .unwrap();
        assert_eq!(chromatogram.time(), Some(&[0.1][..]));
        assert_eq!(chromatogram.intensity(), Some(&[1.0][..]));
    }
    assert_eq!(WIFF2_TARGETED_WARNING.times_emitted(), 1);
}

fn sparse_file(path: &str) -> Arc<MemoryWiffFile> {
    Arc::new(
        MemoryWiffFile::new(path).add_sample(MemorySample::new("sparse").add_period(vec![
            MemoryExperiment::new(ExperimentType::MS)
                .add_cycle(MemorySpectrum::new(1, 0.1).with_data(vec![100.0], vec![3.0]))
                .add_cycle(MemorySpectrum::new(1, 0.2).with_data(vec![100.0], vec![0.0])),
            MemoryExperiment::new(ExperimentType::Product)
                .add_cycle(MemorySpectrum::new(2, 0.15).with_data(vec![80.0], vec![2.0])),
        ])),
    )
}

#[test_log::test]
fn test_zero_length_spectra() {
    let file = sparse_file("sparse.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    let ids: Vec<_> = (0..spectra.len().unwrap())
        .map(|i| spectra.spectrum_identity(i).unwrap().id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "sample=1 period=1 cycle=1 experiment=1",
            "sample=1 period=1 cycle=1 experiment=2",
        ]
    );

    let config = WiffConfig::default().with_accept_zero_length_spectra(true);
    let (spectra, _) = lists(&file, config);
    let ids: Vec<_> = (0..spectra.len().unwrap())
        .map(|i| spectra.spectrum_identity(i).unwrap().id)
        .collect();
    // The product ion cycle has no precursor, so it is dropped in this mode
    assert_eq!(
        ids,
        vec![
            "sample=1 period=1 cycle=1 experiment=1",
            "sample=1 period=1 cycle=2 experiment=1",
        ]
    );
    let empty = spectra
        .spectrum(1, DetailLevel::FullMetadata, &[])
        .unwrap()
        .unwrap();
    assert_eq!(empty.total_ion_current(), Some(0.0));
    assert!(empty.base_peak().is_none());
    let nonempty = spectra
        .spectrum(0, DetailLevel::FullMetadata, &[])
        .unwrap()
        .unwrap();
    assert!(nonempty.base_peak().is_none());

    let file = sparse_file("sparse.wiff2");
    let (spectra, _) = lists(&file, config);
    assert_eq!(spectra.len().unwrap(), 1);
}

#[test_log::test]
fn test_ignore_zero_intensity_points() {
    let file = qc_file("qc.wiff");
    let (spectra, _) = lists(&file, WiffConfig::default());
    let spectrum = spectra
        .spectrum(2, DetailLevel::FullData, &[])
        .unwrap()
        .unwrap();
    assert_eq!(spectrum.default_array_length, 2);

    let (spectra, _) = lists(
        &file,
        WiffConfig::default().with_ignore_zero_intensity_points(true),
    );
    let spectrum = spectra
        .spectrum(2, DetailLevel::FullData, &[])
        .unwrap()
        .unwrap();
    assert_eq!(spectrum.default_array_length, 1);
    assert_eq!(spectrum.arrays().unwrap().mzs(), Some(&[100.0][..]));
}

#[test_log::test]
fn test_vendor_centroiding() {
    let file = Arc::new(
        MemoryWiffFile::new("profile.wiff").add_sample(MemorySample::new("profile").add_period(
            vec![MemoryExperiment::new(ExperimentType::MS).add_cycle(
                MemorySpectrum::new(1, 0.1)
                    .with_data(
                        vec![100.0, 100.1, 100.2, 100.3, 100.4],
                        vec![0.0, 5.0, 2.0, 8.0, 0.0],
                    )
                    .continuous(),
            )],
        )),
    );
    let (spectra, _) = lists(&file, WiffConfig::default());

    let profile = spectra
        .spectrum(0, DetailLevel::FullData, &[])
        .unwrap()
        .unwrap();
    assert_eq!(profile.signal_continuity(), SignalContinuity::Profile);
    assert!(!profile.vendor_centroided);
    assert_eq!(profile.default_array_length, 5);
    assert!(profile.centroid_peaks().is_none());

    let not_this_level = spectra
        .spectrum(0, DetailLevel::FullData, &[2])
        .unwrap()
        .unwrap();
    assert_eq!(not_this_level, profile);

    let centroided = spectra
        .spectrum(0, DetailLevel::FullData, &[1, 2])
        .unwrap()
        .unwrap();
    assert_eq!(centroided.signal_continuity(), SignalContinuity::Profile);
    assert!(centroided.vendor_centroided);
    assert_eq!(centroided.default_array_length, 2);
    assert_eq!(
        centroided.arrays().unwrap().mzs(),
        Some(&[100.1, 100.3][..])
    );
    let peaks = centroided.centroid_peaks().unwrap();
    assert_eq!(peaks.len(), 2);

    let iterated: Vec<_> = spectra
        .iter_spectra(DetailLevel::FullData)
        .centroiding(&[1])
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(iterated, vec![centroided]);
}

#[test]
fn test_unavailable_lists() {
    let spectra = SpectrumListWiff::unavailable();
    assert!(!spectra.is_available());
    assert_eq!(spectra.len().unwrap(), 0);
    assert!(spectra.is_empty().unwrap());
    assert_eq!(spectra.find("sample=1 period=1 cycle=1 experiment=1").unwrap(), 0);
    assert_eq!(spectra.spectrum_identity(4).unwrap(), SpectrumIdentity::default());
    assert!(spectra
        .spectrum(4, DetailLevel::FullData, &[])
        .unwrap()
        .is_none());
    assert_eq!(spectra.iter_spectra(DetailLevel::FullData).count(), 0);

    let chromatograms = ChromatogramListWiff::unavailable();
    assert!(!chromatograms.is_available());
    assert_eq!(chromatograms.len().unwrap(), 0);
    assert_eq!(chromatograms.find("TIC").unwrap(), 0);
    assert_eq!(
        chromatograms.chromatogram_identity(0).unwrap(),
        ChromatogramIdentity::default()
    );
    assert!(chromatograms
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .is_none());
    assert_eq!(chromatograms.iter_chromatograms(DetailLevel::FullData).count(), 0);
}

/// Opens every path as the QC fixture, with a second sample
#[derive(Debug, Default)]
struct FixtureBackend {
    instrument_model: Option<String>,
}

impl WiffBackend for FixtureBackend {
    fn open(&self, path: &Path) -> Result<Arc<dyn WiffFile>, ProviderError> {
        let time = DateTime::parse_from_rfc3339("2024-03-01T08:30:00+01:00")
            .map_err(|e| ProviderError::Vendor(e.to_string()))?;
        let mut file = MemoryWiffFile::new(path)
            .add_sample(qc_sample("QC").with_acquisition_time(time))
            .add_sample(qc_sample("Blank"));
        if let Some(model) = &self.instrument_model {
            file = file.with_instrument_model(model);
        }
        Ok(Arc::new(file))
    }
}

#[test_log::test]
fn test_run_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("QC.wiff");
    std::fs::write(&path, b"abc").unwrap();
    std::fs::write(dir.path().join("QC.wiff.scan"), b"").unwrap();

    let reader = WiffReader::with_backend(
        FixtureBackend {
            instrument_model: Some("TripleTOF 6600".into()),
        },
        WiffConfig::default(),
    );
    assert_eq!(reader.read_ids(&path).unwrap(), vec!["QC", "Blank"]);

    let run = reader.read_run(&path, 0).unwrap();
    assert_eq!(run.sample(), 1);
    assert_eq!(run.sample_name(), "QC");
    assert_eq!(run.id(), Some("QC"));
    assert_eq!(run.source_file_name(), Some("QC.wiff"));

    let description = run.run_description().unwrap();
    assert_eq!(description.default_source_file_id.as_deref(), Some("WIFF"));
    assert_eq!(
        description.start_time.unwrap().to_rfc3339(),
        "2024-03-01T08:30:00+01:00"
    );

    let files = &run.file_description().source_files;
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].id, "WIFF");
    assert_eq!(files[0].name, "QC.wiff");
    assert!(files[0].location.starts_with("file://"));
    assert_eq!(files[1].id, "WIFFSCAN");
    assert_eq!(files[1].name, "QC.wiff.scan");
    #[cfg(feature = "checksum")]
    assert_eq!(
        files[0].get_param_by_name("SHA-1").unwrap().value,
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    );

    let contents: Vec<_> = run
        .file_description()
        .contents
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert!(contents.contains(&"MS1 spectrum"));
    assert!(contents.contains(&"MSn spectrum"));
    assert!(contents.contains(&"selected reaction monitoring chromatogram"));

    let ic = run.instrument_configurations().get(&0).unwrap();
    assert_eq!(
        ic.get_param_by_name("SCIEX instrument model").unwrap().value,
        "TripleTOF 6600"
    );
    assert_eq!(run.softwares().len(), 2);
    assert_eq!(run.data_processings()[0].id, "wiffdata_conversion");

    assert_eq!(run.spectrum_count_hint(), Some(3));
    let spectrum = run
        .spectra()
        .spectrum(0, DetailLevel::InstantMetadata, &[])
        .unwrap()
        .unwrap();
    assert_eq!(
        spectrum
            .description
            .acquisition
            .first_scan()
            .unwrap()
            .instrument_configuration_id,
        ic.id
    );
    assert_eq!(run.chromatograms().len().unwrap(), 5);

    let blank = reader.read_run(&path, 1).unwrap();
    assert_eq!(blank.id(), Some("QC-Blank"));
    assert!(blank.run_description().unwrap().start_time.is_none());
    assert_eq!(
        blank.spectra().spectrum_identity(0).unwrap().id,
        "sample=2 period=1 cycle=1 experiment=1"
    );

    assert!(matches!(
        reader.read_run(&path, 2),
        Err(WiffReaderError::RunIndexOutOfRange { index: 2, count: 2 })
    ));
}

#[test_log::test]
fn test_unknown_instrument() {
    let reader = WiffReader::with_backend(FixtureBackend::default(), WiffConfig::default());
    let run = reader.read_run("missing/QC.wiff", 0).unwrap();
    let ic = run.instrument_configurations().get(&0).unwrap();
    assert_eq!(ic.get_param_by_name("SCIEX instrument model").unwrap().value, "");
    // Nothing exists at the path, so no checksum or scan file is described
    let files = &run.file_description().source_files;
    assert_eq!(files.len(), 1);
    assert!(files[0].params.is_empty());

    let strict = WiffReader::with_backend(
        FixtureBackend::default(),
        WiffConfig::default().with_unknown_instrument_is_error(true),
    );
    assert!(matches!(
        strict.read_run("missing/QC.wiff", 0),
        Err(WiffReaderError::UnknownInstrument(ProviderError::NotFound(_)))
    ));
    // Every sample fails the same way, so none are returned
    assert!(strict.read_all("missing/QC.wiff").unwrap().is_empty());

    let runs = reader.read_all("missing/QC.wiff").unwrap();
    assert_eq!(
        runs.iter().map(|r| r.sample_name()).collect::<Vec<_>>(),
        vec!["QC", "Blank"]
    );
}

#[test_log::test]
fn test_ms1_and_srm_run() {
    let full_scan = |time: f64| MemorySpectrum::new(1, time).with_data(vec![300.0], vec![12.0]);
    let trace = |intensities: Vec<f64>| SelectedIonTrace {
        times: vec![0.05, 0.15],
        intensities,
        ..Default::default()
    };
    let file = Arc::new(
        MemoryWiffFile::new("scenario.wiff").add_sample(MemorySample::new("scenario").add_period(
            vec![
                MemoryExperiment::new(ExperimentType::MS)
                    .add_cycle(full_scan(0.0))
                    .add_cycle(full_scan(0.1))
                    .add_cycle(full_scan(0.2)),
                MemoryExperiment::new(ExperimentType::MRM)
                    .add_transition(Target::new(500.0, 200.0), trace(vec![1.0, 2.0]))
                    .add_transition(Target::new(500.0, 300.0), trace(vec![3.0, 4.0])),
            ],
        )),
    );
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());

    assert_eq!(chromatograms.len().unwrap(), 4);
    assert_eq!(spectra.len().unwrap(), 3);
    assert_eq!(chromatograms.find("TIC").unwrap(), 0);
    assert_eq!(chromatograms.find("BPC").unwrap(), 1);
    assert_eq!(
        chromatograms.find("SRM SIC Q1=500 Q3=300 sample=1 period=1 experiment=2 transition=1").unwrap(),
        3
    );
    assert_eq!(
        spectra.spectrum_identity(0).unwrap().id,
        "sample=1 period=1 cycle=1 experiment=1"
    );

    // A zero start time is not recorded on the scan
    let first = spectra
        .spectrum(0, DetailLevel::InstantMetadata, &[])
        .unwrap()
        .unwrap();
    assert!(first
        .description
        .acquisition
        .first_scan()
        .unwrap()
        .get_param_by_name("scan start time")
        .is_none());

    let srm = chromatograms
        .chromatogram(3, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(srm.intensity(), Some(&[3.0, 4.0][..]));

    let tic = chromatograms
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(tic.time(), Some(&[0.0, 0.1, 0.2][..]));
    assert_eq!(tic.intensity(), Some(&[12.0, 12.0, 12.0][..]));
}

#[test_log::test]
fn test_empty_acquisition() {
    let file = Arc::new(MemoryWiffFile::new("empty.wiff").add_sample(MemorySample::new("empty")));
    let (spectra, chromatograms) = lists(&file, WiffConfig::default());
    assert_eq!(spectra.len().unwrap(), 0);
    assert!(spectra.is_empty().unwrap());
    assert_eq!(spectra.find("TIC").unwrap(), 0);
    assert_eq!(chromatograms.len().unwrap(), 2);

    let tic = chromatograms
        .chromatogram(0, DetailLevel::FullData)
        .unwrap()
        .unwrap();
    assert_eq!(tic.default_array_length, 0);
    assert_eq!(tic.time(), Some(&[][..]));
}
