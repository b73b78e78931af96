// SPDX-License-Identifier: GPL-3.0-or-later

//! Writes the reports of the failed analyzer runs.
//!
//! A report lives in the `failures` directory of the output, and consists
//! of the preprocessed source, a short description of the failure and the
//! output of the analyzer. Sources which made the analyzer ignore an
//! attribute are also listed per attribute.

use super::{Next, Outcome, PipelineError, Record, Stage, Status};
use crate::invocation::preprocess_command;
use crate::toolchain::Toolchain;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub struct ReportFailure {
    toolchain: Rc<dyn Toolchain>,
    directory: PathBuf,
}

impl ReportFailure {
    pub fn new(toolchain: Rc<dyn Toolchain>, directory: PathBuf) -> Self {
        Self { toolchain, directory }
    }

    fn failures(&self) -> Result<PathBuf, PipelineError> {
        let failures = self.directory.join("failures");
        std::fs::create_dir_all(&failures).map_err(|source| io_error(&failures, source))?;
        Ok(failures)
    }
}

impl Stage for ReportFailure {
    fn name(&self) -> &'static str {
        "report failure"
    }

    fn run(&self, record: Record, _next: Next<'_>) -> Outcome {
        let failure = record.failure.as_ref().ok_or(PipelineError::Missing { field: "failure" })?;
        let language = record.require_language()?;
        let directory = record.require_directory()?;
        let clang = record.require_clang()?;
        let failures = self.failures()?;

        let snapshot = tempfile::Builder::new()
            .prefix(&format!("clang_{}_", failure.kind.tag()))
            .suffix(language.preprocessed_extension())
            .tempfile_in(&failures)
            .map_err(|source| io_error(&failures, source))?
            .into_temp_path()
            .keep()
            .map_err(|error| io_error(&failures, error.error))?;

        let preprocess = preprocess_command(&record, &snapshot)?;
        let output = self.toolchain.run(directory, &preprocess)?;
        if !output.termination.is_success() {
            log::warn!("Failed to preprocess {} for the failure report", record.require_file()?);
        }

        let info = [
            directory.join(record.require_file()?).display().to_string(),
            failure.kind.title().to_string(),
            preprocess.join(" "),
            self.toolchain.host(),
            self.toolchain.version(clang)?,
        ];
        write_lines(&suffixed(&snapshot, ".info.txt"), &info)?;
        write_lines(&suffixed(&snapshot, ".stderr.txt"), &failure.output)?;

        let name = snapshot.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default();
        for attribute in &failure.attributes {
            let listing = failures.join(format!("attribute_ignored_{attribute}.txt"));
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&listing)
                .and_then(|mut file| writeln!(file, "{name}"))
                .map_err(|source| io_error(&listing, source))?;
        }

        log::info!("Failure report written: {}", snapshot.display());
        Ok(Status::SUCCESS)
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut result = path.as_os_str().to_owned();
    result.push(suffix);
    PathBuf::from(result)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), PipelineError> {
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod test {
    use super::super::testing::*;
    use super::super::{Failure, FailureKind};
    use super::*;
    use crate::language::Language;
    use crate::toolchain::{MockToolchain, Termination, ToolOutput};

    fn record(kind: FailureKind, attributes: &[&str]) -> Record {
        Record {
            clang: Some("clang".into()),
            directory: Some(PathBuf::from("/project")),
            file: Some("src.cpp".into()),
            language: Some(Language::Cxx),
            compile_options: strings(&["-DNDEBUG"]),
            failure: Some(Failure {
                kind,
                termination: Termination::Exited(0),
                output: strings(&["first line", "second line"]),
                attributes: strings(attributes),
            }),
            ..Default::default()
        }
    }

    fn toolchain() -> MockToolchain {
        let mut toolchain = MockToolchain::new();
        toolchain
            .expect_run()
            .withf(|directory, command| {
                directory == Path::new("/project") && command[..3] == strings(&["clang", "-fsyntax-only", "-E"])
            })
            .returning(|_, _| Ok(ToolOutput { termination: Termination::Exited(0), lines: vec![] }));
        toolchain.expect_host().returning(|| "Linux host 6.1.0 x86_64".to_string());
        toolchain.expect_version().returning(|_| Ok("clang version 18.1.0".to_string()));
        toolchain
    }

    fn files_in(directory: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(directory)
            .unwrap()
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn crash_report_is_written() {
        let output = tempfile::tempdir().unwrap();
        let stage = ReportFailure::new(Rc::new(toolchain()), output.path().to_path_buf());

        let (outcome, _) = run_stage(stage, Probe::default(), record(FailureKind::Crash, &[]));

        assert_eq!(Status::SUCCESS, outcome.unwrap());
        let failures = output.path().join("failures");
        let names = files_in(&failures);
        assert_eq!(3, names.len());
        let snapshot = names[0].as_str();
        assert!(snapshot.starts_with("clang_crash_") && snapshot.ends_with(".ii"));
        assert_eq!(format!("{snapshot}.info.txt"), names[1]);
        assert_eq!(format!("{snapshot}.stderr.txt"), names[2]);

        let info = std::fs::read_to_string(failures.join(&names[1])).unwrap();
        let lines: Vec<_> = info.lines().collect();
        assert_eq!("/project/src.cpp", lines[0]);
        assert_eq!("Crash", lines[1]);
        assert!(lines[2].starts_with("clang -fsyntax-only -E -DNDEBUG -x c++ src.cpp -o "));
        assert!(lines[2].ends_with(snapshot));
        assert_eq!("Linux host 6.1.0 x86_64", lines[3]);
        assert_eq!("clang version 18.1.0", lines[4]);

        let stderr = std::fs::read_to_string(failures.join(&names[2])).unwrap();
        assert_eq!("first line\nsecond line\n", stderr);
    }

    #[test]
    fn ignored_attributes_are_listed() {
        let output = tempfile::tempdir().unwrap();
        let failures = output.path().join("failures");

        for _ in 0..2 {
            let stage = ReportFailure::new(Rc::new(toolchain()), output.path().to_path_buf());
            let record = record(FailureKind::AttributeIgnored, &["always_inline", "packed"]);
            run_stage(stage, Probe::default(), record).0.unwrap();
        }

        let names = files_in(&failures);
        assert!(names.contains(&"attribute_ignored_always_inline.txt".to_string()));
        assert!(names.contains(&"attribute_ignored_packed.txt".to_string()));

        let listing = std::fs::read_to_string(failures.join("attribute_ignored_packed.txt")).unwrap();
        let listed: Vec<_> = listing.lines().collect();
        assert_eq!(2, listed.len());
        assert!(listed.iter().all(|name| name.starts_with("clang_attribute_ignored_") && names.contains(&name.to_string())));
    }

    #[test]
    fn record_without_failure_is_an_error() {
        let output = tempfile::tempdir().unwrap();
        let stage = ReportFailure::new(Rc::new(MockToolchain::new()), output.path().to_path_buf());
        let record = Record { failure: None, ..record(FailureKind::Crash, &[]) };

        let (outcome, _) = run_stage(stage, Probe::default(), record);

        assert!(matches!(outcome, Err(PipelineError::Missing { field: "failure" })));
    }
}
