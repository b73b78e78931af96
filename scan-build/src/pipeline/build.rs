// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Next, Outcome, Record, Stage, Status};
use crate::classify::classify;
use crate::config::Compilers;
use crate::toolchain::Toolchain;
use std::rc::Rc;

/// Decides which compiler runs the build step and which runs the analyzer.
pub struct ResolveCompiler {
    compilers: Compilers,
}

impl ResolveCompiler {
    pub fn new(compilers: Compilers) -> Self {
        Self { compilers }
    }
}

impl Stage for ResolveCompiler {
    fn name(&self) -> &'static str {
        "resolve compiler"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        record.compiler = Some(self.compilers.compiler(record.is_cxx));
        record.clang = Some(self.compilers.analyzer(record.is_cxx));
        next(record)
    }
}

/// Runs the original build step with the real compiler.
///
/// The exit status of the build step is the result of this stage. The
/// analysis runs after it, and its failures are only logged.
pub struct Execute {
    toolchain: Rc<dyn Toolchain>,
}

impl Execute {
    pub fn new(toolchain: Rc<dyn Toolchain>) -> Self {
        Self { toolchain }
    }
}

impl Stage for Execute {
    fn name(&self) -> &'static str {
        "execute"
    }

    fn run(&self, record: Record, next: Next<'_>) -> Outcome {
        let compiler = record.compiler.clone().ok_or(super::PipelineError::Missing { field: "compiler" })?;
        let command: Vec<String> =
            std::iter::once(compiler).chain(record.command.iter().skip(1).cloned()).collect();

        let status = Status::from(self.toolchain.execute(&command)?);
        log::debug!("Build step finished with status: {}", status.code());

        match next(record) {
            Ok(analysis) => log::debug!("Analysis finished with status: {}", analysis.code()),
            Err(error) => log::error!("Analysis failed: {error}"),
        }
        Ok(status)
    }
}

/// Classifies the arguments of the compiler invocation.
pub struct Classify;

impl Stage for Classify {
    fn name(&self) -> &'static str {
        "classify"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let classification = classify(&record.command)?;
        record.apply(classification);
        next(record)
    }
}

/// Lets only the compilations go further.
pub struct FilterAction;

impl Stage for FilterAction {
    fn name(&self) -> &'static str {
        "filter action"
    }

    fn run(&self, record: Record, next: Next<'_>) -> Outcome {
        if record.action.is_compilation() {
            next(record)
        } else {
            log::debug!("Skip: not a compilation ({:?})", record.action);
            Ok(Status::SUCCESS)
        }
    }
}
