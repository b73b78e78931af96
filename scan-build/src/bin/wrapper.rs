// SPDX-License-Identifier: GPL-3.0-or-later

//! This module implements the compiler wrapper.
//!
//! The build system calls the wrapper instead of the compiler. This is
//! arranged by setting the `CC` and `CXX` variables of the build to the
//! wrapper (`analyze-cc` and its `analyze-c++` soft link). The name the
//! wrapper was called by tells if a C or a C++ compiler was asked for.
//!
//! The wrapper runs the real compiler first, with the same arguments. If
//! the call was a compilation, it runs the static analyzer for every file
//! of it. The settings of the analyzer are taken from the `CCC_*`
//! environment variables, which are on top of the configuration file.

use anyhow::{Context, Result};
use scan_build::environment::{KEY_ANALYZER__LOG, KEY_ANALYZER__VERBOSE};
use scan_build::pipeline::{Pipeline, Record, Settings};
use scan_build::toolchain::SystemToolchain;
use scan_build::{config, context};
use std::rc::Rc;

/// Implementation of the wrapper process.
///
/// The process exit code is the same as the exit code of the compiler,
/// whatever happened with the analysis.
fn main() -> Result<()> {
    let context = context::Context::capture()?;
    let verbose = context.environment.contains_key(KEY_ANALYZER__VERBOSE);
    let level = if verbose {
        "debug"
    } else if context.environment.contains_key(KEY_ANALYZER__LOG) {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::debug!("{context}");

    let configuration = config::Loader::load(&context, &None)
        .and_then(|configuration| configuration.with_environment(&context.environment))
        .with_context(|| "Failed to configure the compiler wrapper")?;
    log::debug!("{configuration}");

    // The wrapper name stays in the command, it decides the compiler.
    let command: Vec<String> = std::env::args().collect();
    log::info!("Execution captured: {command:?}");

    let settings = Settings::new(&configuration, context.current_directory.clone(), verbose);
    let pipeline = Pipeline::live(&settings, Rc::new(SystemToolchain));
    let status = pipeline
        .run(Record::new(command))
        .with_context(|| "Failed to run the compiler")?;
    log::info!("Execution finished with status: {}", status.code());
    // Return the compiler status code
    std::process::exit(status.code());
}
