// SPDX-License-Identifier: GPL-3.0-or-later

//! Classification of compiler invocations.
//!
//! The classifier walks the arguments of a single compiler call and sorts
//! every recognized flag into buckets: options relevant for compilation,
//! options relevant for linking, input files, requested architectures.
//! It also decides what the call is doing (linking, compiling, only
//! preprocessing or just querying the compiler), which tells whether the
//! call is worth to analyze at all.

mod arguments;
pub mod rules;

pub use arguments::Arguments;

use regex::Regex;
use rules::{Bucket, Field, Rule, Take};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// What a compiler invocation is doing, from the weakest to the strongest.
///
/// A flag that implies a stronger action overrides a weaker one, never the
/// other way around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    #[default]
    Link,
    Compile,
    Preprocess,
    Info,
}

impl Action {
    /// Only linking and compiling calls have translation units to analyze.
    pub fn is_compilation(&self) -> bool {
        *self <= Action::Compile
    }
}

/// The result of the classification of a single compiler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub action: Action,
    pub compile_options: Vec<String>,
    pub link_options: Vec<String>,
    pub files: Vec<String>,
    /// The `-arch` flags with their values, as they were seen.
    pub archs_seen: Vec<String>,
    /// The language from the `-x` flag.
    pub language: Option<String>,
    /// The output from the `-o` flag.
    pub output: Option<String>,
    /// The compiler is a C++ compiler, derived from its name.
    pub is_cxx: bool,
}

impl Classification {
    fn bucket(&mut self, bucket: Bucket) -> &mut Vec<String> {
        match bucket {
            Bucket::CompileOptions => &mut self.compile_options,
            Bucket::LinkOptions => &mut self.link_options,
            Bucket::ArchsSeen => &mut self.archs_seen,
            Bucket::Files => &mut self.files,
        }
    }

    fn append(&mut self, buckets: &[Bucket], tokens: &[String]) {
        for bucket in buckets {
            self.bucket(*bucket).extend_from_slice(tokens);
        }
    }

    fn field(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Language => &mut self.language,
            Field::Output => &mut self.output,
        }
    }

    /// Applies the take instruction of the rule which recognized the current token.
    fn apply(&mut self, rule: &Rule, joined: bool, arguments: &mut Arguments) -> Result<(), ClassifyError> {
        let current = arguments.current()?.to_string();
        match rule.take {
            Take::Action(action) => {
                self.action = self.action.max(action);
            }
            Take::Count(count, buckets) => {
                let mut tokens = vec![current.clone()];
                for _ in 1..count {
                    tokens.push(arguments.value_of(&current)?);
                }
                self.append(buckets, &tokens);
            }
            Take::Joined(buckets) => {
                let mut tokens = vec![current.clone()];
                if !joined {
                    tokens.push(arguments.value_of(&current)?);
                }
                self.append(buckets, &tokens);
            }
            Take::As(literal, buckets) => {
                self.append(buckets, &[literal.to_string()]);
            }
            Take::Second(field) => {
                let value = arguments.value_of(&current)?;
                *self.field(field) = Some(value);
            }
            Take::FromFile(bucket) => {
                let path = PathBuf::from(arguments.value_of(&current)?);
                let lines = read_file_list(&path)?;
                *self.bucket(bucket) = lines;
            }
        }
        Ok(())
    }
}

/// Classifies the given compiler invocation.
///
/// The first element of the command is the compiler executable, the rest
/// are the arguments. Tokens that no rule recognizes are skipped.
pub fn classify(command: &[String]) -> Result<Classification, ClassifyError> {
    let (executable, rest) = command.split_first().ok_or(ClassifyError::EmptyCommand)?;

    let mut result = Classification { is_cxx: is_cxx_compiler(executable), ..Default::default() };
    let mut arguments = Arguments::new(rest.iter().cloned());
    while let Some(token) = arguments.advance() {
        match rules::lookup(token) {
            Some((rule, found)) => result.apply(rule, found.joined, &mut arguments)?,
            None => log::trace!("Argument not recognized: {token}"),
        }
    }
    Ok(result)
}

static CXX_COMPILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/]*/)*(\w*-)*(\w+\+\+)(-(\d+(\.\d+){0,3}))?$").expect("Invalid C++ compiler regex pattern")
});

/// Recognizes C++ compiler drivers by their name.
///
/// ```
/// use scan_build::classify::is_cxx_compiler;
///
/// assert!(is_cxx_compiler("clang++"));
/// assert!(is_cxx_compiler("/usr/bin/arm-linux-gnueabi-g++-4.8"));
/// assert!(!is_cxx_compiler("clang"));
/// ```
pub fn is_cxx_compiler(name: &str) -> bool {
    CXX_COMPILER.is_match(name)
}

/// Reads the file list given to the `-filelist` flag, one file per line.
fn read_file_list(path: &Path) -> Result<Vec<String>, ClassifyError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ClassifyError::FileList { path: path.to_path_buf(), source })?;
    Ok(content.lines().map(|line| line.trim().to_string()).collect())
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Empty command")]
    EmptyCommand,
    #[error("Argument cursor is out of bounds")]
    OutOfBounds,
    #[error("Missing value after '{flag}'")]
    MissingValue { flag: String },
    #[error("Failed to read file list '{path}': {source}", path = path.display())]
    FileList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
