// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Next, Outcome, PipelineError, Record, Stage, Status};
use crate::config::OutputFormat;
use crate::language::{Resolution, resolve};
use std::path::{Path, PathBuf};

/// Decides the language of the file, skips the ones the analyzer can't process.
pub struct ResolveLanguage;

impl Stage for ResolveLanguage {
    fn name(&self) -> &'static str {
        "resolve language"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let file = record.require_file()?;
        match resolve(Path::new(file), record.is_cxx, record.requested_language.as_deref()) {
            Resolution::Accepted(language) => {
                record.language = Some(language);
                next(record)
            }
            Resolution::Unsupported(language) => {
                log::debug!("Skip: language '{language}' is not supported ({file})");
                Ok(Status::SUCCESS)
            }
            Resolution::Unknown => {
                log::debug!("Skip: could not detect the language of {file}");
                Ok(Status::SUCCESS)
            }
        }
    }
}

/// Sets the working directory when the invocation did not come with one.
pub struct ResolveDirectory {
    default: PathBuf,
}

impl ResolveDirectory {
    pub fn new(default: PathBuf) -> Self {
        Self { default }
    }
}

impl Stage for ResolveDirectory {
    fn name(&self) -> &'static str {
        "resolve directory"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        if record.directory.is_none() {
            record.directory = Some(self.default.clone());
        }
        next(record)
    }
}

/// Decides where the analyzer writes its report.
///
/// The plist formats write a single file, which is created upfront in the
/// output directory and removed after the analysis if it stayed empty.
pub struct ResolveOutput {
    format: OutputFormat,
    directory: Option<PathBuf>,
}

impl ResolveOutput {
    pub fn new(format: OutputFormat, directory: Option<PathBuf>) -> Self {
        Self { format, directory }
    }
}

impl Stage for ResolveOutput {
    fn name(&self) -> &'static str {
        "resolve output"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let Some(directory) = &self.directory else {
            return next(record);
        };
        if !self.format.is_plist() {
            record.analyzer_output = Some(directory.clone());
            return next(record);
        }

        let report = PlistReport::create(directory)?;
        record.analyzer_output = Some(report.path.clone());
        next(record)
    }
}

/// A report file which is removed when the analyzer wrote nothing into it.
struct PlistReport {
    path: PathBuf,
}

impl PlistReport {
    fn create(directory: &Path) -> Result<Self, PipelineError> {
        let into_error = |source| PipelineError::Io { path: directory.to_path_buf(), source };

        let path = tempfile::Builder::new()
            .prefix("report-")
            .suffix(".plist")
            .tempfile_in(directory)
            .map_err(into_error)?
            .into_temp_path()
            .keep()
            .map_err(|error| into_error(error.error))?;
        Ok(Self { path })
    }
}

impl Drop for PlistReport {
    fn drop(&mut self) {
        let empty = std::fs::metadata(&self.path).map(|metadata| metadata.len() == 0).unwrap_or(false);
        if empty {
            if let Err(error) = std::fs::remove_file(&self.path) {
                log::warn!("Failed to remove empty report {}: {error}", self.path.display());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::testing::*;
    use super::super::Pipeline;
    use super::*;
    use crate::language::Language;

    fn record(file: &str) -> Record {
        Record { file: Some(file.into()), ..Default::default() }
    }

    #[test]
    fn language_from_the_extension() {
        let (outcome, seen) = run_stage(ResolveLanguage, Probe::answering(&[4]), record("src.c"));

        assert_eq!(Status::from_code(4), outcome.unwrap());
        assert_eq!(Some(Language::C), seen[0].language);
    }

    #[test]
    fn language_from_the_flag_wins() {
        let record = Record { requested_language: Some("c++".into()), ..record("src.c") };

        let (_, seen) = run_stage(ResolveLanguage, Probe::default(), record);

        assert_eq!(Some(Language::Cxx), seen[0].language);
    }

    #[test]
    fn unsupported_languages_are_skipped() {
        for record in [
            Record { requested_language: Some("fortran".into()), ..record("src.f") },
            record("src.mii"),
            record("src.rs"),
            record("Makefile"),
        ] {
            let (outcome, seen) = run_stage(ResolveLanguage, Probe::answering(&[1]), record);

            assert_eq!(Status::SUCCESS, outcome.unwrap());
            assert!(seen.is_empty());
        }
    }

    #[test]
    fn directory_defaults_to_the_working_directory() {
        let stage = ResolveDirectory::new(PathBuf::from("/work"));
        let (_, seen) = run_stage(stage, Probe::default(), Record::default());
        assert_eq!(Some(PathBuf::from("/work")), seen[0].directory);

        let stage = ResolveDirectory::new(PathBuf::from("/work"));
        let record = Record { directory: Some(PathBuf::from("/project")), ..Default::default() };
        let (_, seen) = run_stage(stage, Probe::default(), record);
        assert_eq!(Some(PathBuf::from("/project")), seen[0].directory);
    }

    #[test]
    fn output_without_directory() {
        let stage = ResolveOutput::new(OutputFormat::Plist, None);

        let (_, seen) = run_stage(stage, Probe::default(), Record::default());

        assert_eq!(None, seen[0].analyzer_output);
    }

    #[test]
    fn html_output_goes_to_the_directory() {
        let stage = ResolveOutput::new(OutputFormat::Html, Some(PathBuf::from("/tmp/reports")));

        let (_, seen) = run_stage(stage, Probe::default(), Record::default());

        assert_eq!(Some(PathBuf::from("/tmp/reports")), seen[0].analyzer_output);
    }

    #[test]
    fn empty_plist_report_is_removed() {
        let directory = tempfile::tempdir().unwrap();
        let stage = ResolveOutput::new(OutputFormat::Plist, Some(directory.path().to_path_buf()));

        let (_, seen) = run_stage(stage, Probe::default(), Record::default());

        let report = seen[0].analyzer_output.clone().unwrap();
        assert_eq!(Some(directory.path()), report.parent());
        let name = report.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report-") && name.ends_with(".plist"));
        assert!(!report.exists());
    }

    #[test]
    fn written_plist_report_is_kept() {
        struct Writer;
        impl Stage for Writer {
            fn name(&self) -> &'static str {
                "writer"
            }
            fn run(&self, record: Record, _next: Next<'_>) -> Outcome {
                let path = record.analyzer_output.clone().unwrap();
                std::fs::write(&path, "<plist/>").unwrap();
                Ok(Status::SUCCESS)
            }
        }

        let directory = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(vec![
            Box::new(ResolveOutput::new(OutputFormat::PlistHtml, Some(directory.path().to_path_buf()))),
            Box::new(Writer),
        ]);

        pipeline.run(Record::default()).unwrap();

        let reports: Vec<_> = std::fs::read_dir(directory.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|extension| extension == "plist"))
            .collect();
        assert_eq!(1, reports.len());
        assert_eq!("<plist/>", std::fs::read_to_string(&reports[0]).unwrap());
    }

    #[test]
    fn missing_output_directory_is_an_error() {
        let stage = ResolveOutput::new(OutputFormat::Plist, Some(PathBuf::from("/this/directory/is/missing")));

        let (outcome, seen) = run_stage(stage, Probe::default(), Record::default());

        assert!(matches!(outcome, Err(PipelineError::Io { .. })));
        assert!(seen.is_empty());
    }
}
