// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is layered. The defaults are defined in the code,
//! then a configuration file can override them, and finally the command
//! line flags (or the environment variables, for the compiler wrapper)
//! override those.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `scan-build.yml`.
//!
//! The configuration file location is searched in the following order:
//! 1. The current working directory
//! 2. The local configuration directory of the user
//! 3. The configuration directory of the user
//! 4. The local configuration directory of the application
//! 5. The configuration directory of the application
//!
//! ```yaml
//! schema: 1.0
//!
//! analyzer:
//!   store: region
//!   constraints: range
//!   max_loop: 4
//!   output_format: plist-html
//!   config: stable-report-filename=true
//!   plugins:
//!     - /opt/checkers/libcustom.so
//!   enable_checkers:
//!     - alpha.security.taint.TaintPropagation
//!   disable_checkers:
//!     - deadcode.DeadStores
//!
//! output:
//!   directory: /tmp/scan-build
//!   keep_empty: false
//!   report_failures: true
//!
//! compilers:
//!   cc: /usr/bin/gcc
//!   cxx: /usr/bin/g++
//!   clang: /usr/local/bin/clang
//!   clang_cxx: /usr/local/bin/clang++
//! ```

// Re-Export the types and the loader module content.
pub use loader::{ConfigError, Loader};
pub use types::*;
pub use validation::{ValidationError, Validator};

mod types {
    use super::validation::ValidationError;
    use serde::Deserialize;
    use std::fmt;
    use std::path::PathBuf;
    use std::str::FromStr;

    /// Represents the application configuration.
    #[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct Main {
        #[serde(deserialize_with = "validate_schema_version")]
        pub schema: String,
        #[serde(default)]
        pub analyzer: Analyzer,
        #[serde(default)]
        pub output: Output,
        #[serde(default)]
        pub compilers: Compilers,
    }

    impl Default for Main {
        fn default() -> Self {
            Self {
                schema: String::from(SUPPORTED_SCHEMA_VERSION),
                analyzer: Analyzer::default(),
                output: Output::default(),
                compilers: Compilers::default(),
            }
        }
    }

    impl fmt::Display for Main {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "Configuration:")?;
            let yaml_string = serde_yml::to_string(self).map_err(|_| fmt::Error)?;
            for line in yaml_string.lines() {
                writeln!(f, "{}", line)?;
            }
            Ok(())
        }
    }

    /// The options passed to the static analyzer.
    #[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(default)]
    pub struct Analyzer {
        pub store: StoreModel,
        pub constraints: ConstraintsModel,
        pub internal_stats: bool,
        pub analyze_headers: bool,
        pub stats: bool,
        pub max_loop: u32,
        pub output_format: OutputFormat,
        /// Value of the `-analyzer-config` option.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub config: Option<String>,
        pub plugins: Vec<PathBuf>,
        pub enable_checkers: Vec<String>,
        pub disable_checkers: Vec<String>,
        pub ubiviz: bool,
    }

    impl Default for Analyzer {
        fn default() -> Self {
            Self {
                store: StoreModel::default(),
                constraints: ConstraintsModel::default(),
                internal_stats: false,
                analyze_headers: false,
                stats: false,
                max_loop: DEFAULT_MAX_LOOP,
                output_format: OutputFormat::default(),
                config: None,
                plugins: vec![],
                enable_checkers: vec![],
                disable_checkers: vec![],
                ubiviz: false,
            }
        }
    }

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum StoreModel {
        #[default]
        Region,
        Basic,
    }

    impl StoreModel {
        pub fn as_str(&self) -> &'static str {
            match self {
                StoreModel::Region => "region",
                StoreModel::Basic => "basic",
            }
        }
    }

    impl FromStr for StoreModel {
        type Err = ValidationError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value {
                "region" => Ok(StoreModel::Region),
                "basic" => Ok(StoreModel::Basic),
                _ => Err(ValidationError::InvalidValue { field: "store", value: value.to_string() }),
            }
        }
    }

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ConstraintsModel {
        #[default]
        Range,
        Basic,
    }

    impl ConstraintsModel {
        pub fn as_str(&self) -> &'static str {
            match self {
                ConstraintsModel::Range => "range",
                ConstraintsModel::Basic => "basic",
            }
        }
    }

    impl FromStr for ConstraintsModel {
        type Err = ValidationError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value {
                "range" => Ok(ConstraintsModel::Range),
                "basic" => Ok(ConstraintsModel::Basic),
                _ => Err(ValidationError::InvalidValue { field: "constraints", value: value.to_string() }),
            }
        }
    }

    /// The report format the analyzer writes.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum OutputFormat {
        #[default]
        Html,
        Plist,
        PlistHtml,
    }

    impl OutputFormat {
        pub fn as_str(&self) -> &'static str {
            match self {
                OutputFormat::Html => "html",
                OutputFormat::Plist => "plist",
                OutputFormat::PlistHtml => "plist-html",
            }
        }

        /// The analyzer writes a single plist file instead of a directory.
        pub fn is_plist(&self) -> bool {
            matches!(self, OutputFormat::Plist | OutputFormat::PlistHtml)
        }
    }

    impl FromStr for OutputFormat {
        type Err = ValidationError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value {
                "html" => Ok(OutputFormat::Html),
                "plist" => Ok(OutputFormat::Plist),
                "plist-html" => Ok(OutputFormat::PlistHtml),
                _ => Err(ValidationError::InvalidValue { field: "output_format", value: value.to_string() }),
            }
        }
    }

    /// Where the analyzer results go.
    #[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(default)]
    pub struct Output {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub directory: Option<PathBuf>,
        pub keep_empty: bool,
        pub report_failures: bool,
    }

    impl Default for Output {
        fn default() -> Self {
            Self { directory: None, keep_empty: false, report_failures: true }
        }
    }

    /// The compilers to run for the build and for the analysis.
    #[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(default)]
    pub struct Compilers {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub cc: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub cxx: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub clang: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub clang_cxx: Option<String>,
    }

    impl Compilers {
        /// The compiler which executes the original build step.
        pub fn compiler(&self, is_cxx: bool) -> String {
            let (configured, fallback) = if is_cxx {
                (&self.cxx, DEFAULT_CXX_COMPILER)
            } else {
                (&self.cc, DEFAULT_C_COMPILER)
            };
            configured.clone().unwrap_or_else(|| fallback.to_string())
        }

        /// The compiler which runs the static analyzer.
        pub fn analyzer(&self, is_cxx: bool) -> String {
            let (configured, fallback) = if is_cxx {
                (self.clang_cxx.as_ref().or(self.clang.as_ref()), "clang++")
            } else {
                (self.clang.as_ref(), "clang")
            };
            configured.cloned().unwrap_or_else(|| fallback.to_string())
        }
    }

    pub(super) const SUPPORTED_SCHEMA_VERSION: &str = "1.0";
    pub(super) const DEFAULT_MAX_LOOP: u32 = 4;

    #[cfg(target_os = "macos")]
    const DEFAULT_C_COMPILER: &str = "clang";
    #[cfg(target_os = "macos")]
    const DEFAULT_CXX_COMPILER: &str = "clang++";
    #[cfg(not(target_os = "macos"))]
    const DEFAULT_C_COMPILER: &str = "gcc";
    #[cfg(not(target_os = "macos"))]
    const DEFAULT_CXX_COMPILER: &str = "g++";

    // Custom deserialization function to validate the schema version
    fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let schema: String = Deserialize::deserialize(deserializer)?;
        if schema != SUPPORTED_SCHEMA_VERSION {
            use serde::de::Error;
            Err(Error::custom(format!(
                "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
            )))
        } else {
            Ok(schema)
        }
    }
}

pub mod validation {

    use super::types::*;
    use thiserror::Error;

    /// Trait for validating configuration objects
    pub trait Validator<T> {
        type Error: std::error::Error;

        fn validate(config: &T) -> Result<(), Self::Error>;
    }

    /// Validation errors for configuration
    #[derive(Debug, Error)]
    pub enum ValidationError {
        #[error("Empty string value for field '{field}'")]
        EmptyString { field: &'static str },
        #[error("Path does not exist: '{path}'")]
        PathNotFound { path: String },
        #[error("Duplicate {field} entry at: {idx}")]
        DuplicateEntry { field: &'static str, idx: usize },
        #[error("Checker '{checker}' is enabled and disabled at the same time")]
        ConflictingChecker { checker: String },
        #[error("Invalid value '{value}' for field '{field}'")]
        InvalidValue { field: &'static str, value: String },
        #[error("Multiple validation errors: {errors:?}")]
        Multiple { errors: Vec<ValidationError> },
    }

    /// Combinator for collecting and handling validation errors
    #[derive(Default)]
    struct ValidationCollector {
        errors: Vec<ValidationError>,
    }

    impl ValidationCollector {
        fn add(&mut self, error: ValidationError) {
            self.errors.push(error);
        }

        fn add_result(&mut self, result: Result<(), ValidationError>) {
            if let Err(error) = result {
                match error {
                    ValidationError::Multiple { errors } => {
                        self.errors.extend(errors);
                    }
                    single_error => self.errors.push(single_error),
                }
            }
        }

        fn finish(mut self) -> Result<(), ValidationError> {
            match self.errors.len() {
                0 => Ok(()),
                1 => Err(self.errors.remove(0)),
                _ => Err(ValidationError::Multiple { errors: self.errors }),
            }
        }
    }

    impl Validator<Main> for Main {
        type Error = ValidationError;

        fn validate(config: &Main) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            collector.add_result(Analyzer::validate(&config.analyzer));
            collector.add_result(Output::validate(&config.output));
            collector.add_result(Compilers::validate(&config.compilers));

            collector.finish()
        }
    }

    impl Validator<Analyzer> for Analyzer {
        type Error = ValidationError;

        fn validate(config: &Analyzer) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            for plugin in &config.plugins {
                if plugin.as_os_str().is_empty() {
                    collector.add(ValidationError::EmptyString { field: "plugins" });
                } else if !plugin.exists() {
                    collector.add(ValidationError::PathNotFound { path: plugin.display().to_string() });
                }
            }

            for (field, checkers) in
                [("enable_checkers", &config.enable_checkers), ("disable_checkers", &config.disable_checkers)]
            {
                let mut seen = std::collections::HashSet::new();
                for (idx, checker) in checkers.iter().enumerate() {
                    if checker.is_empty() {
                        collector.add(ValidationError::EmptyString { field });
                    } else if !seen.insert(checker) {
                        collector.add(ValidationError::DuplicateEntry { field, idx });
                    }
                }
            }

            for checker in &config.enable_checkers {
                if config.disable_checkers.contains(checker) {
                    collector.add(ValidationError::ConflictingChecker { checker: checker.clone() });
                }
            }

            if config.config.as_deref().is_some_and(str::is_empty) {
                collector.add(ValidationError::EmptyString { field: "config" });
            }

            collector.finish()
        }
    }

    impl Validator<Output> for Output {
        type Error = ValidationError;

        fn validate(config: &Output) -> Result<(), Self::Error> {
            match &config.directory {
                Some(directory) if directory.as_os_str().is_empty() => {
                    Err(ValidationError::EmptyString { field: "directory" })
                }
                _ => Ok(()),
            }
        }
    }

    impl Validator<Compilers> for Compilers {
        type Error = ValidationError;

        fn validate(config: &Compilers) -> Result<(), Self::Error> {
            let mut collector = ValidationCollector::default();

            for (field, value) in [
                ("cc", &config.cc),
                ("cxx", &config.cxx),
                ("clang", &config.clang),
                ("clang_cxx", &config.clang_cxx),
            ] {
                if value.as_deref().is_some_and(str::is_empty) {
                    collector.add(ValidationError::EmptyString { field });
                }
            }

            collector.finish()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_default_config_is_valid() {
            assert!(Main::validate(&Main::default()).is_ok());
        }

        #[test]
        fn test_validate_missing_plugin() {
            let config = Analyzer { plugins: vec![PathBuf::from("/this/plugin/is/missing.so")], ..Default::default() };

            let result = Analyzer::validate(&config);

            assert!(matches!(result, Err(ValidationError::PathNotFound { .. })));
        }

        #[test]
        fn test_validate_existing_plugin() {
            let plugin = tempfile::NamedTempFile::new().unwrap();
            let config = Analyzer { plugins: vec![plugin.path().to_path_buf()], ..Default::default() };

            assert!(Analyzer::validate(&config).is_ok());
        }

        #[test]
        fn test_validate_duplicate_checkers() {
            let config = Analyzer {
                enable_checkers: vec!["core".into(), "unix".into(), "core".into()],
                ..Default::default()
            };

            let result = Analyzer::validate(&config);

            assert!(matches!(
                result,
                Err(ValidationError::DuplicateEntry { field: "enable_checkers", idx: 2 })
            ));
        }

        #[test]
        fn test_validate_conflicting_checkers() {
            let config = Analyzer {
                enable_checkers: vec!["deadcode.DeadStores".into()],
                disable_checkers: vec!["deadcode.DeadStores".into()],
                ..Default::default()
            };

            let result = Analyzer::validate(&config);

            assert!(matches!(result, Err(ValidationError::ConflictingChecker { checker }) if checker == "deadcode.DeadStores"));
        }

        #[test]
        fn test_validate_collects_multiple_errors() {
            let config = Main {
                analyzer: Analyzer {
                    enable_checkers: vec!["".into()],
                    config: Some("".into()),
                    ..Default::default()
                },
                compilers: Compilers { cc: Some("".into()), ..Default::default() },
                ..Default::default()
            };

            let result = Main::validate(&config);

            match result {
                Err(ValidationError::Multiple { errors }) => assert_eq!(3, errors.len()),
                other => panic!("unexpected result: {other:?}"),
            }
        }

        #[test]
        fn test_validate_empty_output_directory() {
            let config = Output { directory: Some(PathBuf::new()), ..Default::default() };

            assert!(matches!(Output::validate(&config), Err(ValidationError::EmptyString { field: "directory" })));
        }
    }
}

pub mod loader {
    use super::{Main, Validator};
    use directories::{BaseDirs, ProjectDirs};
    use log::{debug, info};
    use std::fs::OpenOptions;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    const CONFIG_FILE_NAME: &str = "scan-build.yml";

    pub struct Loader {}

    impl Loader {
        /// Loads the configuration from the specified file or the default locations.
        ///
        /// When no file is specified and none found at the default locations,
        /// the default configuration is returned.
        pub fn load(context: &crate::context::Context, filename: &Option<String>) -> Result<Main, ConfigError> {
            if let Some(path) = filename {
                Self::from_file(Path::new(path))
            } else {
                for location in Self::file_locations(context) {
                    debug!("Checking configuration file: {}", location.display());
                    if location.exists() {
                        return Self::from_file(location.as_path());
                    }
                }
                debug!("Configuration file not found. Using the default configuration.");
                Ok(Main::default())
            }
        }

        /// The default locations where the configuration file can be found.
        fn file_locations(context: &crate::context::Context) -> Vec<PathBuf> {
            let mut locations = Vec::new();

            locations.push(context.current_directory.clone());
            if let Some(base_dirs) = BaseDirs::new() {
                locations.push(base_dirs.config_local_dir().to_path_buf());
                locations.push(base_dirs.config_dir().to_path_buf());
            }

            if let Some(proj_dirs) = ProjectDirs::from("com.github", "rizsotto", "scan-build") {
                locations.push(proj_dirs.config_local_dir().to_path_buf());
                locations.push(proj_dirs.config_dir().to_path_buf());
            }
            locations.dedup();
            locations.iter().map(|p| p.join(CONFIG_FILE_NAME)).collect()
        }

        /// Loads the configuration from the specified file.
        pub fn from_file(path: &Path) -> Result<Main, ConfigError> {
            info!("Loading configuration file: {}", path.display());

            let reader = OpenOptions::new()
                .read(true)
                .open(path)
                .map_err(|source| ConfigError::FileAccess { path: path.to_path_buf(), source })?;

            let content: Main = Self::from_reader(reader)
                .map_err(|source| ConfigError::ParseError { path: path.to_path_buf(), source })?;

            Main::validate(&content)
                .map_err(|source| ConfigError::ValidationError { path: path.to_path_buf(), source })?;

            Ok(content)
        }

        /// Define the deserialization format of the config file.
        fn from_reader<R, T>(rdr: R) -> serde_yml::Result<T>
        where
            R: std::io::Read,
            T: serde::de::DeserializeOwned,
        {
            serde_yml::from_reader(rdr)
        }
    }

    /// Represents all possible configuration-related errors.
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Error when opening or reading a configuration file.
        #[error("Failed to access configuration file '{path}': {source}", path = path.display())]
        FileAccess {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        /// Error when parsing the configuration file format.
        #[error("Failed to parse configuration from file '{path}': {source}", path = path.display())]
        ParseError {
            path: PathBuf,
            #[source]
            source: serde_yml::Error,
        },
        /// Error when configuration validation fails.
        #[error("Configuration validation failed for '{path}': {source}", path = path.display())]
        ValidationError {
            path: PathBuf,
            #[source]
            source: crate::config::validation::ValidationError,
        },
        /// Error when an environment variable holds an unusable value.
        #[error("Invalid value in environment variable '{key}': {source}")]
        Environment {
            key: &'static str,
            #[source]
            source: crate::config::validation::ValidationError,
        },
    }

}

mod overrides {
    use super::loader::ConfigError;
    use super::types::Main;
    use super::validation::ValidationError;
    use crate::environment::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::str::FromStr;

    impl Main {
        /// Applies the settings from the environment variables of the compiler wrapper.
        ///
        /// Variables which are not set leave the current value untouched.
        pub fn with_environment(mut self, environment: &HashMap<String, String>) -> Result<Self, ConfigError> {
            let get = |key: &str| environment.get(key).map(String::as_str);

            if let Some(value) = get(KEY_ANALYZER__HTML) {
                self.output.directory = Some(PathBuf::from(value));
            }
            if let Some(value) = get(KEY_ANALYZER__OUTPUT_FORMAT) {
                self.analyzer.output_format = parse(KEY_ANALYZER__OUTPUT_FORMAT, value)?;
            }
            if let Some(value) = get(KEY_ANALYZER__STORE_MODEL) {
                self.analyzer.store = parse(KEY_ANALYZER__STORE_MODEL, value)?;
            }
            if let Some(value) = get(KEY_ANALYZER__CONSTRAINTS_MODEL) {
                self.analyzer.constraints = parse(KEY_ANALYZER__CONSTRAINTS_MODEL, value)?;
            }
            if let Some(value) = get(KEY_ANALYZER__MAX_LOOP) {
                self.analyzer.max_loop = value.parse().map_err(|_| ConfigError::Environment {
                    key: KEY_ANALYZER__MAX_LOOP,
                    source: ValidationError::InvalidValue { field: "max_loop", value: value.to_string() },
                })?;
            }
            if let Some(value) = get(KEY_ANALYZER__CONFIG) {
                self.analyzer.config = Some(value.to_string());
            }
            if let Some(value) = get(KEY_ANALYZER__PLUGINS) {
                self.analyzer.plugins = value.split_whitespace().map(PathBuf::from).collect();
            }
            if let Some(value) = get(KEY_ANALYZER__ENABLE_CHECKERS) {
                self.analyzer.enable_checkers = split_list(value);
            }
            if let Some(value) = get(KEY_ANALYZER__DISABLE_CHECKERS) {
                self.analyzer.disable_checkers = split_list(value);
            }
            if let Some(value) = get(KEY_ANALYZER__INTERNAL_STATS) {
                self.analyzer.internal_stats = is_enabled(value);
            }
            if let Some(value) = get(KEY_ANALYZER__STATS) {
                self.analyzer.stats = is_enabled(value);
            }
            if let Some(value) = get(KEY_ANALYZER__ANALYZE_HEADERS) {
                self.analyzer.analyze_headers = is_enabled(value);
            }
            if let Some(value) = get(KEY_ANALYZER__UBIVIZ) {
                self.analyzer.ubiviz = is_enabled(value);
            }
            if let Some(value) = get(KEY_ANALYZER__REPORT_FAILURES) {
                self.output.report_failures = is_enabled(value);
            }
            for (key, slot) in [
                (KEY_WRAPPER__C_COMPILER, &mut self.compilers.cc),
                (KEY_WRAPPER__CXX_COMPILER, &mut self.compilers.cxx),
                (KEY_WRAPPER__CLANG, &mut self.compilers.clang),
                (KEY_WRAPPER__CLANG_CXX, &mut self.compilers.clang_cxx),
            ] {
                if let Some(value) = get(key).filter(|value| !value.is_empty()) {
                    *slot = Some(value.to_string());
                }
            }

            Ok(self)
        }
    }

    fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr<Err = ValidationError>,
    {
        value.parse().map_err(|source| ConfigError::Environment { key, source })
    }

    fn split_list(value: &str) -> Vec<String> {
        value.split(',').map(str::trim).filter(|item| !item.is_empty()).map(String::from).collect()
    }

    /// A flag variable counts as set unless it spells a negative value.
    fn is_enabled(value: &str) -> bool {
        !matches!(value.to_ascii_lowercase().as_str(), "0" | "no" | "false" | "off")
    }

}
