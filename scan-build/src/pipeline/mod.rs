// SPDX-License-Identifier: GPL-3.0-or-later

//! The analysis pipeline of a single compiler invocation.
//!
//! The pipeline is an ordered list of stages. Each stage gets the record
//! and the rest of the pipeline as a continuation: it may change the
//! record, call the continuation once, many times (the fan-out stages),
//! or not at all (when there is nothing left to do).
//!
//! The fan-out stages stop at the first branch which does not succeed and
//! return its status. When there is nothing to expand, they return success
//! without calling the rest of the pipeline.

pub mod analyze;
mod build;
mod expand;
mod failure;
mod record;
mod resolve;

pub use analyze::{Failure, FailureKind, RunAnalyzer};
pub use build::{Classify, Execute, FilterAction, ResolveCompiler};
pub use expand::{DISABLED_ARCHS, ExpandArchs, ExpandFiles, PinFile};
pub use failure::ReportFailure;
pub use record::Record;
pub use resolve::{ResolveDirectory, ResolveLanguage, ResolveOutput};

use crate::classify::ClassifyError;
use crate::config;
use crate::toolchain::{Termination, ToolError, Toolchain};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use thiserror::Error;

/// Exit status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(i32);

impl Status {
    pub const SUCCESS: Status = Status(0);

    pub fn from_code(code: i32) -> Self {
        Status(code)
    }

    pub fn code(&self) -> i32 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 == 0
    }
}

impl From<Termination> for Status {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Exited(code) => Status(code),
            Termination::Signaled(signal) => Status(128 + signal),
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        u8::try_from(status.0).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
    }
}

pub type Outcome = Result<Status, PipelineError>;

/// The rest of the pipeline, as seen by a stage.
pub type Next<'a> = &'a dyn Fn(Record) -> Outcome;

/// A single step of the pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;

    fn run(&self, record: Record, next: Next<'_>) -> Outcome;
}

type Continuation = Box<dyn Fn(Record) -> Outcome>;

/// The stages folded into a single callable.
pub struct Pipeline {
    chain: Continuation,
}

impl Pipeline {
    /// Composes the stages, the first one in the list is the outermost.
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let terminal: Continuation = Box::new(|_| Ok(Status::SUCCESS));
        let chain = stages.into_iter().rev().fold(terminal, |next, stage| -> Continuation {
            Box::new(move |record: Record| {
                log::trace!("Stage {} on revision {}", stage.name(), record.revision);
                stage.run(record, next.as_ref())
            })
        });
        Self { chain }
    }

    pub fn run(&self, record: Record) -> Outcome {
        (self.chain)(record)
    }

    /// The pipeline of the compiler wrapper.
    ///
    /// The original build step runs first, the analysis follows for every
    /// architecture and file of the invocation.
    pub fn live(settings: &Settings, toolchain: Rc<dyn Toolchain>) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ResolveCompiler::new(settings.compilers.clone())),
            Box::new(Execute::new(Rc::clone(&toolchain))),
            Box::new(Classify),
            Box::new(FilterAction),
            Box::new(ExpandArchs),
            Box::new(ExpandFiles),
        ];
        stages.extend(Self::analysis(settings, toolchain));
        Self::new(stages)
    }

    /// The pipeline of an entry from a compilation database.
    ///
    /// The build step already happened, and the entry names its own file.
    pub fn replay(settings: &Settings, toolchain: Rc<dyn Toolchain>) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ResolveCompiler::new(settings.compilers.clone())),
            Box::new(Classify),
            Box::new(FilterAction),
            Box::new(ExpandArchs),
            Box::new(PinFile),
        ];
        stages.extend(Self::analysis(settings, toolchain));
        Self::new(stages)
    }

    fn analysis(settings: &Settings, toolchain: Rc<dyn Toolchain>) -> Vec<Box<dyn Stage>> {
        let report_directory = settings.output_directory.clone().filter(|_| settings.report_failures);
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ResolveLanguage),
            Box::new(ResolveDirectory::new(settings.working_directory.clone())),
            Box::new(ResolveOutput::new(settings.analyzer.output_format, settings.output_directory.clone())),
            Box::new(RunAnalyzer::new(
                Rc::clone(&toolchain),
                &settings.analyzer,
                settings.verbose,
                report_directory.is_some(),
            )),
        ];
        if let Some(directory) = report_directory {
            stages.push(Box::new(ReportFailure::new(toolchain, directory)));
        }
        stages
    }
}

/// The parts of the configuration the pipeline is built from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub analyzer: config::Analyzer,
    pub compilers: config::Compilers,
    pub output_directory: Option<PathBuf>,
    pub report_failures: bool,
    pub working_directory: PathBuf,
    pub verbose: bool,
}

impl Settings {
    /// A relative output directory is taken from the working directory,
    /// the analyzer runs in the directory of the compilation instead.
    pub fn new(config: &config::Main, working_directory: PathBuf, verbose: bool) -> Self {
        Self {
            analyzer: config.analyzer.clone(),
            compilers: config.compilers.clone(),
            output_directory: config.output.directory.as_ref().map(|directory| working_directory.join(directory)),
            report_failures: config.output.report_failures,
            working_directory,
            verbose,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Record has no {field} set")]
    Missing { field: &'static str },
    #[error("Failed to classify the arguments: {0}")]
    Classify(#[from] ClassifyError),
    #[error("{0}")]
    Tool(#[from] ToolError),
    #[error("Failed to access '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// A stage at the end of the pipeline, which records what it was called with.
    #[derive(Default)]
    pub struct Probe {
        pub seen: Rc<RefCell<Vec<Record>>>,
        statuses: RefCell<VecDeque<Status>>,
    }

    impl Probe {
        /// The probe answers with the given statuses in order, then with success.
        pub fn answering(statuses: &[i32]) -> Self {
            let statuses = statuses.iter().map(|code| Status::from_code(*code)).collect();
            Self { seen: Rc::default(), statuses: RefCell::new(statuses) }
        }
    }

    impl Stage for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn run(&self, record: Record, _next: Next<'_>) -> Outcome {
            self.seen.borrow_mut().push(record);
            Ok(self.statuses.borrow_mut().pop_front().unwrap_or(Status::SUCCESS))
        }
    }

    /// Runs a single stage in front of a probe.
    pub fn run_stage<S: Stage + 'static>(stage: S, probe: Probe, record: Record) -> (Outcome, Vec<Record>) {
        let seen = Rc::clone(&probe.seen);
        let pipeline = Pipeline::new(vec![Box::new(stage), Box::new(probe)]);
        let outcome = pipeline.run(record);
        let records = seen.borrow().clone();
        (outcome, records)
    }

    pub fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }
}
