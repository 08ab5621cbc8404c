use crate::impl_param_described;
use crate::params::ParamList;

/// The hardware configuration used to acquire a spectrum. WIFF files describe the
/// instrument only by its model, so there are no component descriptions.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentConfiguration {
    pub params: ParamList,
    pub software_reference: String,
    pub id: u32,
}

impl_param_described!(InstrumentConfiguration);
