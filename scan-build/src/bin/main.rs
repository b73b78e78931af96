// SPDX-License-Identifier: GPL-3.0-or-later

use scan_build::{args, config, context, modes};
use std::env;
use std::process::ExitCode;

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Parse the command line arguments.
    let matches = args::cli().get_matches();
    let arguments = args::Arguments::try_from(matches)?;
    // Initialize the logging system, `RUST_LOG` wins over the verbosity flags.
    let level = match arguments.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    // Get the package name and version from Cargo
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::info!("{pkg_name} v{pkg_version}");
    let os = env::consts::OS;
    let family = env::consts::FAMILY;
    let arch = env::consts::ARCH;
    log::info!("Running on... {family}/{os} {arch}");

    // Capture application context.
    let context = context::Context::capture()?;
    log::info!("{context}");
    // Load the configuration, the command line flags win over the file.
    let mut configuration = config::Loader::load(&context, &arguments.config)?;
    arguments.overrides.apply(&mut configuration);
    log::info!("{configuration}");

    // Run the application.
    let application = modes::Mode::configure(&context, arguments.mode, configuration)?;
    log::debug!("Configuration complete, running the analysis now...");
    let result = application.run();
    log::debug!("Exit code: {result:?}");

    Ok(result)
}
