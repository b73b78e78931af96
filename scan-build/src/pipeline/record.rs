// SPDX-License-Identifier: GPL-3.0-or-later

use super::PipelineError;
use super::analyze::Failure;
use crate::classify::{Action, Classification, is_cxx_compiler};
use crate::language::Language;
use std::path::PathBuf;

/// The state of one compiler invocation as it flows through the stages.
///
/// Stages fill in the fields one after another. The fan-out stages hand
/// every branch its own copy made by [`Record::branch`], so a branch can
/// not see what its siblings did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Counts the copies made on the way from the root record.
    pub revision: u32,
    /// The original compiler invocation.
    pub command: Vec<String>,
    pub is_cxx: bool,
    /// The compiler which runs the original build step.
    pub compiler: Option<String>,
    /// The compiler which runs the analyzer.
    pub clang: Option<String>,
    pub directory: Option<PathBuf>,

    pub action: Action,
    pub compile_options: Vec<String>,
    pub link_options: Vec<String>,
    pub files: Vec<String>,
    pub archs_seen: Vec<String>,
    /// The language named by the `-x` flag.
    pub requested_language: Option<String>,
    pub output: Option<String>,

    pub arch: Option<String>,
    pub file: Option<String>,
    pub language: Option<Language>,
    /// Where the analyzer writes its report.
    pub analyzer_output: Option<PathBuf>,
    pub failure: Option<Failure>,
}

impl Record {
    pub fn new(command: Vec<String>) -> Self {
        let is_cxx = command.first().is_some_and(|executable| is_cxx_compiler(executable));
        Self { command, is_cxx, ..Default::default() }
    }

    /// A record for a compilation which has a known directory and main file.
    pub fn with_entry(command: Vec<String>, directory: PathBuf, file: String) -> Self {
        Self { directory: Some(directory), file: Some(file), ..Self::new(command) }
    }

    /// Copy of the record for a fan-out branch.
    pub fn branch(&self) -> Self {
        Self { revision: self.revision + 1, ..self.clone() }
    }

    /// Takes over the result of the argument classification.
    pub fn apply(&mut self, classification: Classification) {
        let Classification { action, compile_options, link_options, files, archs_seen, language, output, is_cxx } =
            classification;
        self.action = action;
        self.compile_options = compile_options;
        self.link_options = link_options;
        self.files = files;
        self.archs_seen = archs_seen;
        self.requested_language = language;
        self.output = output;
        self.is_cxx = is_cxx;
    }

    pub fn require_directory(&self) -> Result<&PathBuf, PipelineError> {
        required(&self.directory, "directory")
    }

    pub fn require_file(&self) -> Result<&String, PipelineError> {
        required(&self.file, "file")
    }

    pub fn require_language(&self) -> Result<Language, PipelineError> {
        required(&self.language, "language").copied()
    }

    pub fn require_clang(&self) -> Result<&String, PipelineError> {
        required(&self.clang, "clang")
    }
}

fn required<'a, T>(value: &'a Option<T>, field: &'static str) -> Result<&'a T, PipelineError> {
    value.as_ref().ok_or(PipelineError::Missing { field })
}
