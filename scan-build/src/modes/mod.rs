// SPDX-License-Identifier: GPL-3.0-or-later

mod execution;

use crate::classify::is_cxx_compiler;
use crate::compilation::{self, DatabaseError};
use crate::context::Context;
use crate::pipeline::{Pipeline, Settings};
use crate::report::ReportDirectory;
use crate::toolchain::SystemToolchain;
use crate::{args, config};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

/// Represent the modes the application can run in.
///
/// - analyze: replay the compilations of a compilation database with the
///   analyzer only.
/// - wrap: run a single compiler invocation, then analyze what it compiled.
///
/// Both modes write into a freshly created report directory.
pub enum Mode {
    Analyze(execution::Replayer, ReportDirectory),
    Wrap(execution::Wrapper, ReportDirectory),
}

impl Mode {
    /// Configure the application mode based on the command line arguments and the configuration.
    ///
    /// The compilation database is read before the report directory is
    /// created, so a bad input leaves nothing behind.
    pub fn configure(
        context: &Context,
        mode: args::Mode,
        mut config: config::Main,
    ) -> Result<Self, ConfigurationError> {
        let verbose = log::log_enabled!(log::Level::Debug);

        match mode {
            args::Mode::Analyze { database } => {
                log::debug!("Mode: analyze the compilation database");

                let entries = compilation::read(&database)?;
                log::info!("Compilation database entries: {}", entries.len());
                let report = create_report(&mut config, &context.current_directory)?;

                let settings = Settings::new(&config, context.current_directory.clone(), verbose);
                let pipeline = Pipeline::replay(&settings, Rc::new(SystemToolchain));
                Ok(Self::Analyze(execution::Replayer::new(entries, pipeline), report))
            }
            args::Mode::Wrap { command } => {
                log::debug!("Mode: run and analyze a compiler invocation");

                let compiler = command.first().cloned().ok_or(ConfigurationError::EmptyCommand)?;
                if is_cxx_compiler(&compiler) {
                    config.compilers.cxx = Some(compiler);
                } else {
                    config.compilers.cc = Some(compiler);
                }
                let report = create_report(&mut config, &context.current_directory)?;

                let settings = Settings::new(&config, context.current_directory.clone(), verbose);
                let pipeline = Pipeline::live(&settings, Rc::new(SystemToolchain));
                Ok(Self::Wrap(execution::Wrapper::new(command, pipeline), report))
            }
        }
    }

    /// It actually runs the application mode.
    ///
    /// Failures during the analysis are logged, the exit code tells only
    /// the outcome of the compilations.
    pub fn run(self) -> ExitCode {
        let (status, report) = match self {
            Self::Analyze(replayer, report) => (replayer.run(), report),
            Self::Wrap(wrapper, report) => (wrapper.run(), report),
        };
        if let Err(error) = report.finish() {
            log::warn!("Failed to finish the report directory: {error}");
        }
        ExitCode::from(status)
    }
}

/// Creates the report directory, and points the analyzer output into it.
fn create_report(config: &mut config::Main, current_directory: &Path) -> Result<ReportDirectory, ConfigurationError> {
    let parent = match &config.output.directory {
        Some(directory) => current_directory.join(directory),
        None => std::env::temp_dir(),
    };
    let report = ReportDirectory::create(&parent, config.output.keep_empty)
        .map_err(|source| ConfigurationError::ReportDirectory { path: parent, source })?;
    config.output.directory = Some(report.path().to_path_buf());
    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to create report directory in '{path}': {source}", path = path.display())]
    ReportDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Database(#[from] DatabaseError),
    #[error("Missing compiler command")]
    EmptyCommand,
}
