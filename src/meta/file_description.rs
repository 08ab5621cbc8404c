use crate::impl_param_described;
use crate::params::{Param, ParamDescribed, ParamList};

/// A file the run was read from
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceFile {
    pub name: String,
    pub location: String,
    pub id: String,
    pub file_format: Option<Param>,
    pub id_format: Option<Param>,
    pub params: ParamList,
}

/// The kinds of content in the run and the files they came from
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileDescription {
    pub contents: ParamList,
    pub source_files: Vec<SourceFile>,
}

impl FileDescription {
    pub fn new(contents: ParamList, source_files: Vec<SourceFile>) -> Self {
        Self {
            contents,
            source_files,
        }
    }

    /// Add a content term unless an equivalent term is already present
    pub fn add_content(&mut self, term: Param) {
        let present = self
            .contents
            .iter()
            .any(|p| p.accession == term.accession && p.name == term.name);
        if !present {
            self.contents.push(term);
        }
    }

    pub fn get_source_file(&self, id: &str) -> Option<&SourceFile> {
        self.source_files.iter().find(|sf| sf.id == id)
    }
}

impl_param_described!(SourceFile);

impl ParamDescribed for FileDescription {
    fn params(&self) -> &[Param] {
        &self.contents
    }

    fn params_mut(&mut self) -> &mut ParamList {
        &mut self.contents
    }
}
