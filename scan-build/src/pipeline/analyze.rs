// SPDX-License-Identifier: GPL-3.0-or-later

//! Runs the static analyzer and recognizes its failures.

use super::{Next, Outcome, Record, Stage, Status};
use crate::config::Analyzer;
use crate::invocation::{analyze_command, direct_arguments};
use crate::toolchain::{Termination, ToolOutput, Toolchain};
use regex::Regex;
use std::rc::Rc;
use std::sync::LazyLock;

/// The kinds of analyzer failures worth to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Crash,
    OtherError,
    AttributeIgnored,
}

impl FailureKind {
    /// Used in the file names of the failure report.
    pub fn tag(&self) -> &'static str {
        match self {
            FailureKind::Crash => "crash",
            FailureKind::OtherError => "other_error",
            FailureKind::AttributeIgnored => "attribute_ignored",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FailureKind::Crash => "Crash",
            FailureKind::OtherError => "Other Error",
            FailureKind::AttributeIgnored => "Attribute Ignored",
        }
    }
}

/// A failed analyzer run, with everything the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub termination: Termination,
    /// The output of the analyzer.
    pub output: Vec<String>,
    /// The distinct ignored attributes, in the order of the first warning.
    pub attributes: Vec<String>,
}

static ATTRIBUTE_IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"warning: '([^']+)' attribute ignored").expect("Invalid attribute warning regex pattern")
});

impl Failure {
    /// Tells if the analyzer run failed, and how.
    pub fn classify(output: &ToolOutput) -> Option<Failure> {
        let failure = |kind: FailureKind, attributes: Vec<String>| Failure {
            kind,
            termination: output.termination,
            output: output.lines.clone(),
            attributes,
        };

        match output.termination {
            Termination::Signaled(_) => Some(failure(FailureKind::Crash, vec![])),
            Termination::Exited(code) if code != 0 => Some(failure(FailureKind::OtherError, vec![])),
            Termination::Exited(_) => {
                let mut attributes: Vec<String> = vec![];
                for captures in output.lines.iter().filter_map(|line| ATTRIBUTE_IGNORED.captures(line)) {
                    let attribute = captures[1].to_string();
                    if !attributes.contains(&attribute) {
                        attributes.push(attribute);
                    }
                }
                (!attributes.is_empty()).then(|| failure(FailureKind::AttributeIgnored, attributes))
            }
        }
    }
}

/// Runs the analyzer on a single file.
///
/// The result of the stage is the exit status of the analyzer. When the
/// failure reports are enabled, a failed run is passed to the rest of the
/// pipeline, but the outcome of the report does not change the result.
pub struct RunAnalyzer {
    toolchain: Rc<dyn Toolchain>,
    direct: Vec<String>,
    report_failures: bool,
}

impl RunAnalyzer {
    pub fn new(toolchain: Rc<dyn Toolchain>, analyzer: &Analyzer, verbose: bool, report_failures: bool) -> Self {
        Self { toolchain, direct: direct_arguments(analyzer, verbose), report_failures }
    }
}

impl Stage for RunAnalyzer {
    fn name(&self) -> &'static str {
        "run analyzer"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let directory = record.require_directory()?.clone();
        let command = analyze_command(&record, &self.direct)?;
        let frontend = self.toolchain.expand(&directory, &command)?;
        let output = self.toolchain.run(&directory, &frontend)?;
        for line in &output.lines {
            eprintln!("{line}");
        }

        let status = Status::from(output.termination);
        log::debug!("Analyzer finished with status: {}", status.code());

        if self.report_failures {
            if let Some(failure) = Failure::classify(&output) {
                log::debug!("Analyzer failure: {}", failure.kind.title());
                record.failure = Some(failure);
                if let Err(error) = next(record) {
                    log::warn!("Failed to write the failure report: {error}");
                }
            }
        }
        Ok(status)
    }
}
