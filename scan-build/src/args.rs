// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The flags which change the analysis are collected into [`Overrides`],
//! which are applied on top of the configuration file. The subcommands
//! select the input of the analysis: a compilation database or a single
//! compiler invocation.

use crate::config::{self, ConstraintsModel, OutputFormat, StoreModel};
use anyhow::anyhow;
use clap::{ArgAction, ArgMatches, Command, arg, command, value_parser};
use std::path::PathBuf;

const MODE_ANALYZE_SUBCOMMAND: &str = "analyze";
const MODE_WRAP_SUBCOMMAND: &str = "wrap";
const DEFAULT_DATABASE_FILE: &str = "compile_commands.json";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The level of verbosity.
    pub verbose: u8,
    // The path of the configuration file.
    pub config: Option<String>,
    pub overrides: Overrides,
    pub mode: Mode,
}

/// Represents the mode of the application.
#[derive(Debug, PartialEq)]
pub enum Mode {
    /// Replay the compilations of a compilation database.
    Analyze { database: PathBuf },
    /// Run a single compiler invocation and analyze it.
    Wrap { command: Vec<String> },
}

/// The analysis settings given on the command line.
#[derive(Debug, Default, PartialEq)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub keep_empty: bool,
    pub no_failure_reports: bool,
    pub stats: bool,
    pub internal_stats: bool,
    pub analyze_headers: bool,
    pub max_loop: Option<u32>,
    pub store: Option<StoreModel>,
    pub constraints: Option<ConstraintsModel>,
    pub analyzer: Option<String>,
    pub analyzer_config: Option<String>,
    pub plugins: Vec<PathBuf>,
    pub enable_checkers: Vec<String>,
    pub disable_checkers: Vec<String>,
    pub ubiviz: bool,
}

impl Overrides {
    /// Changes the configuration where the command line asked for it.
    pub fn apply(&self, config: &mut config::Main) {
        let analyzer = &mut config.analyzer;
        if let Some(format) = self.output_format {
            analyzer.output_format = format;
        }
        if let Some(max_loop) = self.max_loop {
            analyzer.max_loop = max_loop;
        }
        if let Some(store) = self.store {
            analyzer.store = store;
        }
        if let Some(constraints) = self.constraints {
            analyzer.constraints = constraints;
        }
        if self.analyzer_config.is_some() {
            analyzer.config = self.analyzer_config.clone();
        }
        analyzer.stats |= self.stats;
        analyzer.internal_stats |= self.internal_stats;
        analyzer.analyze_headers |= self.analyze_headers;
        analyzer.ubiviz |= self.ubiviz;
        analyzer.plugins.extend(self.plugins.iter().cloned());
        analyzer.enable_checkers.extend(self.enable_checkers.iter().cloned());
        analyzer.disable_checkers.extend(self.disable_checkers.iter().cloned());

        if self.output.is_some() {
            config.output.directory = self.output.clone();
        }
        config.output.keep_empty |= self.keep_empty;
        if self.no_failure_reports {
            config.output.report_failures = false;
        }

        if let Some(analyzer) = &self.analyzer {
            config.compilers.clang = Some(analyzer.clone());
            config.compilers.clang_cxx = Some(analyzer.clone());
        }
    }
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let verbose = matches.get_count("verbose");
        let config = matches.get_one::<String>("config").map(String::to_string);
        let overrides = Overrides::try_from(&matches)?;

        let mode = match matches.subcommand() {
            Some((MODE_ANALYZE_SUBCOMMAND, analyze_matches)) => {
                let database = analyze_matches
                    .get_one::<String>("cdb")
                    .map(PathBuf::from)
                    .expect("cdb is defaulted");
                Mode::Analyze { database }
            }
            Some((MODE_WRAP_SUBCOMMAND, wrap_matches)) => {
                let command = wrap_matches
                    .get_many::<String>("COMMAND")
                    .expect("missing compiler command")
                    .cloned()
                    .collect();
                Mode::Wrap { command }
            }
            _ => return Err(anyhow!("unrecognized subcommand")),
        };
        Ok(Arguments { verbose, config, overrides, mode })
    }
}

impl TryFrom<&ArgMatches> for Overrides {
    type Error = anyhow::Error;

    fn try_from(matches: &ArgMatches) -> Result<Self, Self::Error> {
        let flag = |name: &str| matches.get_flag(name);
        let value = |name: &str| matches.get_one::<String>(name).cloned();
        let values = |name: &str| -> Vec<String> {
            matches.get_many::<String>(name).map(|values| values.cloned().collect()).unwrap_or_default()
        };

        let output_format = if flag("plist-html") {
            Some(OutputFormat::PlistHtml)
        } else if flag("plist") {
            Some(OutputFormat::Plist)
        } else {
            None
        };

        Ok(Overrides {
            output: value("output").map(PathBuf::from),
            output_format,
            keep_empty: flag("keep-empty"),
            no_failure_reports: flag("no-failure-reports"),
            stats: flag("stats"),
            internal_stats: flag("internal-stats"),
            analyze_headers: flag("analyze-headers"),
            max_loop: matches.get_one::<u32>("maxloop").copied(),
            store: value("store").map(|store| store.parse::<StoreModel>()).transpose()?,
            constraints: value("constraints").map(|constraints| constraints.parse::<ConstraintsModel>()).transpose()?,
            analyzer: value("use-analyzer"),
            analyzer_config: value("analyzer-config"),
            plugins: values("load-plugin").into_iter().map(PathBuf::from).collect(),
            enable_checkers: values("enable-checker"),
            disable_checkers: values("disable-checker"),
            ubiviz: flag("ubiviz"),
        })
    }
}

/// Represents the command line interface of the application.
///
/// The analysis flags come before the subcommand, which selects where the
/// compilations are coming from.
pub fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
            arg!(-o --output <DIR> "Directory where the report directory is created"),
            arg!(--plist "Write the results as plist files").action(ArgAction::SetTrue),
            arg!(--"plist-html" "Write the results as plist and html files")
                .action(ArgAction::SetTrue)
                .conflicts_with("plist"),
            arg!(--"keep-empty" "Keep the report directory even if it is empty")
                .action(ArgAction::SetTrue),
            arg!(--"no-failure-reports" "Do not write reports of analyzer failures")
                .action(ArgAction::SetTrue),
            arg!(--stats "Generates visitation statistics for the project").action(ArgAction::SetTrue),
            arg!(--"internal-stats" "Generates internal analyzer statistics").action(ArgAction::SetTrue),
            arg!(--"analyze-headers" "Also analyze functions in #included files")
                .action(ArgAction::SetTrue),
            arg!(--maxloop <N> "Number of times a block is visited by the analyzer")
                .value_parser(value_parser!(u32)),
            arg!(--store <MODEL> "Store model of the analyzer").value_parser(["region", "basic"]),
            arg!(--constraints <MODEL> "Constraint engine of the analyzer").value_parser(["range", "basic"]),
            arg!(--"use-analyzer" <PATH> "The compiler which runs the analyzer"),
            arg!(--"analyzer-config" <OPTIONS> "Options passed to the analyzer configuration"),
            arg!(--"load-plugin" <PLUGIN> "Loads an analyzer plugin").action(ArgAction::Append),
            arg!(--"enable-checker" <CHECKER> "Enables an analyzer checker").action(ArgAction::Append),
            arg!(--"disable-checker" <CHECKER> "Disables an analyzer checker").action(ArgAction::Append),
            arg!(--ubiviz "Shows the exploded graph with ubigraph").action(ArgAction::SetTrue),
        ])
        .subcommand(
            Command::new(MODE_ANALYZE_SUBCOMMAND)
                .about("analyze the compilations of a compilation database")
                .args(&[arg!(--cdb <FILE> "Path of the compilation database")
                    .default_value(DEFAULT_DATABASE_FILE)
                    .hide_default_value(false)])
                .arg_required_else_help(false),
        )
        .subcommand(
            Command::new(MODE_WRAP_SUBCOMMAND)
                .about("run a compiler invocation and analyze it")
                .args(&[arg!(<COMMAND> "Compiler command")
                    .action(ArgAction::Append)
                    .value_terminator("--")
                    .num_args(1..)
                    .last(true)
                    .required(true)])
                .arg_required_else_help(true),
        )
}
