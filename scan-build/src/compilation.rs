// SPDX-License-Identifier: GPL-3.0-or-later

//! Reading of JSON compilation database files.
//!
//! A compilation database is the build log the analysis can be replayed
//! from: every entry names a source file, the directory of the compilation
//! and the compiler invocation. The format is defined in the LLVM project
//! [documentation](https://clang.llvm.org/docs/JSONCompilationDatabase.html).

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Represents an entry of the compilation database.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The main translation unit source processed by this compilation step.
    pub file: PathBuf,
    /// The compile command argv as list of strings, not escaped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub arguments: Vec<String>,
    /// The compile command as a single shell-escaped string.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub command: String,
    /// The working directory of the compilation.
    pub directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Entry {
    /// The compiler invocation of the entry. The `arguments` field is
    /// preferred, the `command` field is split by the shell rules.
    pub fn command_line(&self) -> Result<Vec<String>, EntryError> {
        if !self.arguments.is_empty() {
            return Ok(self.arguments.clone());
        }
        let arguments = shell_words::split(&self.command)?;
        if arguments.is_empty() {
            return Err(EntryError::CommandOrArgumentsAreMissing);
        }
        Ok(arguments)
    }

    /// Semantic validation of the entry.
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.file.as_os_str().is_empty() {
            return Err(EntryError::EmptyFileName);
        }
        if self.directory.as_os_str().is_empty() {
            return Err(EntryError::EmptyDirectory);
        }
        self.command_line().map(|_| ())
    }
}

/// Reads the entries of the compilation database file.
pub fn read(path: &Path) -> Result<Vec<Entry>, DatabaseError> {
    let file = File::open(path).map_err(|source| DatabaseError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|source| DatabaseError::Syntax { path: path.to_path_buf(), source })
}

/// Represents the possible errors that can occur when validating an entry.
#[derive(Debug, Eq, PartialEq, Error)]
pub enum EntryError {
    #[error("Entry has an empty file field")]
    EmptyFileName,
    #[error("Entry has an empty directory field")]
    EmptyDirectory,
    #[error("Both command and arguments fields are empty")]
    CommandOrArgumentsAreMissing,
    #[error("Entry has an invalid command field: {0}")]
    InvalidCommand(#[from] shell_words::ParseError),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to open compilation database '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse compilation database '{path}': {source}", path = path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
