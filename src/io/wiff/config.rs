/// Options that control which records a WIFF run exposes and how they are decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WiffConfig {
    /// Only sum MS1 experiments into the whole-run TIC and BPC
    pub global_chromatograms_are_ms1_only: bool,
    /// Expose MRM experiments as spectra
    pub srm_as_spectra: bool,
    /// Expose SIM experiments as spectra
    pub sim_as_spectra: bool,
    /// Keep spectra with no data points, and skip recording a zero base peak
    pub accept_zero_length_spectra: bool,
    /// Ask the vendor library to drop zero intensity points when decoding
    pub ignore_zero_intensity_points: bool,
    /// Fail to read a run whose instrument model the vendor library does not know
    pub unknown_instrument_is_error: bool,
}

impl WiffConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global_chromatograms_are_ms1_only(mut self, value: bool) -> Self {
        self.global_chromatograms_are_ms1_only = value;
        self
    }

    pub fn with_srm_as_spectra(mut self, value: bool) -> Self {
        self.srm_as_spectra = value;
        self
    }

    pub fn with_sim_as_spectra(mut self, value: bool) -> Self {
        self.sim_as_spectra = value;
        self
    }

    pub fn with_accept_zero_length_spectra(mut self, value: bool) -> Self {
        self.accept_zero_length_spectra = value;
        self
    }

    pub fn with_ignore_zero_intensity_points(mut self, value: bool) -> Self {
        self.ignore_zero_intensity_points = value;
        self
    }

    pub fn with_unknown_instrument_is_error(mut self, value: bool) -> Self {
        self.unknown_instrument_is_error = value;
        self
    }
}
