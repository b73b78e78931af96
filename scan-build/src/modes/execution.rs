// SPDX-License-Identifier: GPL-3.0-or-later

use crate::compilation::Entry;
use crate::pipeline::{Pipeline, Record, Status};

/// Runs the analysis for every entry of a compilation database.
///
/// The entries are processed one after the other. An entry which can not
/// be processed is logged and abandoned, the rest still runs.
pub struct Replayer {
    entries: Vec<Entry>,
    pipeline: Pipeline,
}

impl Replayer {
    pub fn new(entries: Vec<Entry>, pipeline: Pipeline) -> Self {
        Self { entries, pipeline }
    }

    /// Returns the status of the first failed analysis, or success.
    pub fn run(self) -> Status {
        let mut result = Status::SUCCESS;
        for entry in self.entries {
            let command = match entry.validate().and_then(|_| entry.command_line()) {
                Ok(command) => command,
                Err(error) => {
                    log::warn!("Skip entry of {}: {error}", entry.file.display());
                    continue;
                }
            };
            let record = Record::with_entry(command, entry.directory, entry.file.display().to_string());
            match self.pipeline.run(record) {
                Ok(status) if !status.is_success() && result.is_success() => result = status,
                Ok(_) => {}
                Err(error) => log::error!("Analysis of {} abandoned: {error}", entry.file.display()),
            }
        }
        result
    }
}

/// Runs a single compiler invocation and its analysis.
pub struct Wrapper {
    command: Vec<String>,
    pipeline: Pipeline,
}

impl Wrapper {
    pub fn new(command: Vec<String>, pipeline: Pipeline) -> Self {
        Self { command, pipeline }
    }

    /// Returns the status of the compiler.
    pub fn run(self) -> Status {
        self.pipeline.run(Record::new(self.command)).unwrap_or_else(|error| {
            log::error!("Failed to run the compiler: {error}");
            Status::from_code(1)
        })
    }
}
