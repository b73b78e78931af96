// SPDX-License-Identifier: GPL-3.0-or-later

//! The fan-out stages.

use super::{Next, Outcome, Record, Stage, Status};

/// Architectures the analyzer does not support.
pub const DISABLED_ARCHS: &[&str] = &["ppc", "ppc64"];

/// Runs the rest of the pipeline for every branch until one fails.
fn fan_out(branches: impl IntoIterator<Item = Record>, next: Next<'_>) -> Outcome {
    for branch in branches {
        let status = next(branch)?;
        if !status.is_success() {
            return Ok(status);
        }
    }
    Ok(Status::SUCCESS)
}

/// One branch per requested architecture.
pub struct ExpandArchs;

impl Stage for ExpandArchs {
    fn name(&self) -> &'static str {
        "expand architectures"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let seen = std::mem::take(&mut record.archs_seen);
        let archs: Vec<String> = seen
            .iter()
            .filter(|token| token.as_str() != "-arch" && !DISABLED_ARCHS.contains(&token.as_str()))
            .cloned()
            .collect();

        match (seen.is_empty(), archs.is_empty()) {
            (true, _) => next(record),
            (false, true) => {
                log::debug!("Skip: all architectures are disabled {seen:?}");
                Ok(Status::SUCCESS)
            }
            (false, false) => fan_out(
                archs.into_iter().map(|arch| Record { arch: Some(arch), ..record.branch() }),
                next,
            ),
        }
    }
}

/// One branch per source file of the invocation.
pub struct ExpandFiles;

impl Stage for ExpandFiles {
    fn name(&self) -> &'static str {
        "expand files"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        let files = std::mem::take(&mut record.files);
        if files.is_empty() {
            log::debug!("Skip: no source files found");
            return Ok(Status::SUCCESS);
        }
        fan_out(files.into_iter().map(|file| Record { file: Some(file), ..record.branch() }), next)
    }
}

/// Uses the file the compilation database names for the entry.
///
/// The files found by the classification are ignored: an entry describes
/// the compilation of exactly one file.
pub struct PinFile;

impl Stage for PinFile {
    fn name(&self) -> &'static str {
        "pin file"
    }

    fn run(&self, mut record: Record, next: Next<'_>) -> Outcome {
        record.files.clear();
        record.require_file()?;
        next(record)
    }
}

#[cfg(test)]
mod test {
    use super::super::testing::*;
    use super::super::{PipelineError, Pipeline};
    use super::*;
    use crate::classify::classify;

    fn classified(command: &[&str]) -> Record {
        let mut record = Record::new(strings(command));
        record.apply(classify(&record.command).unwrap());
        record
    }

    #[test]
    fn each_arch_gets_a_branch() {
        let record = classified(&["clang", "-c", "src.c", "-arch", "mips", "-arch", "i386"]);
        assert_eq!(strings(&["-arch", "mips", "-arch", "i386"]), record.archs_seen);

        let (outcome, seen) = run_stage(ExpandArchs, Probe::default(), record);

        assert_eq!(Status::SUCCESS, outcome.unwrap());
        let archs: Vec<_> = seen.iter().map(|branch| branch.arch.clone()).collect();
        assert_eq!(vec![Some("mips".to_string()), Some("i386".to_string())], archs);
        assert!(seen.iter().all(|branch| branch.archs_seen.is_empty() && branch.revision == 1));
    }

    #[test]
    fn disabled_archs_are_dropped() {
        let record = classified(&["clang", "-c", "src.c", "-arch", "ppc", "-arch", "x86_64"]);

        let (_, seen) = run_stage(ExpandArchs, Probe::default(), record);

        assert_eq!(1, seen.len());
        assert_eq!(Some("x86_64".to_string()), seen[0].arch);
    }

    #[test]
    fn only_disabled_archs_skip_the_command() {
        let record = classified(&["clang", "-c", "src.c", "-arch", "ppc"]);

        let (outcome, seen) = run_stage(ExpandArchs, Probe::answering(&[1]), record);

        assert_eq!(Status::SUCCESS, outcome.unwrap());
        assert!(seen.is_empty());
    }

    #[test]
    fn no_arch_runs_the_default_branch() {
        let record = classified(&["clang", "-c", "src.c"]);

        let (outcome, seen) = run_stage(ExpandArchs, Probe::answering(&[3]), record);

        assert_eq!(Status::from_code(3), outcome.unwrap());
        assert_eq!(1, seen.len());
        assert_eq!(None, seen[0].arch);
        assert_eq!(0, seen[0].revision);
    }

    #[test]
    fn each_file_gets_a_branch() {
        let record = classified(&["clang", "-c", "a.c", "b.c", "c.c"]);

        let (outcome, seen) = run_stage(ExpandFiles, Probe::default(), record);

        assert_eq!(Status::SUCCESS, outcome.unwrap());
        let files: Vec<_> = seen.iter().filter_map(|branch| branch.file.clone()).collect();
        assert_eq!(strings(&["a.c", "b.c", "c.c"]), files);
        assert!(seen.iter().all(|branch| branch.files.is_empty()));
    }

    #[test]
    fn first_failing_arch_stops_the_fan_out() {
        let record = classified(&["clang", "-c", "src.c", "-arch", "i386", "-arch", "x86_64", "-arch", "arm64"]);

        let (outcome, seen) = run_stage(ExpandArchs, Probe::answering(&[0, 2, 0]), record);

        assert_eq!(Status::from_code(2), outcome.unwrap());
        let archs: Vec<_> = seen.iter().filter_map(|branch| branch.arch.clone()).collect();
        assert_eq!(strings(&["i386", "x86_64"]), archs);
    }

    #[test]
    fn first_failing_branch_stops_the_fan_out() {
        let record = classified(&["clang", "-c", "a.c", "b.c", "c.c"]);

        let (outcome, seen) = run_stage(ExpandFiles, Probe::answering(&[0, 2, 0]), record);

        assert_eq!(Status::from_code(2), outcome.unwrap());
        assert_eq!(2, seen.len());
        assert_eq!(Some("b.c".to_string()), seen[1].file);
    }

    #[test]
    fn no_files_is_a_silent_skip() {
        let record = classified(&["clang", "-c", "-O2"]);

        let (outcome, seen) = run_stage(ExpandFiles, Probe::answering(&[1]), record);

        assert_eq!(Status::SUCCESS, outcome.unwrap());
        assert!(seen.is_empty());
    }

    #[test]
    fn nested_fan_out_covers_every_combination() {
        let probe = Probe::default();
        let seen = std::rc::Rc::clone(&probe.seen);
        let pipeline = Pipeline::new(vec![Box::new(ExpandArchs), Box::new(ExpandFiles), Box::new(probe)]);

        let record = classified(&["clang", "-c", "a.c", "b.c", "-arch", "i386", "-arch", "x86_64"]);
        pipeline.run(record).unwrap();

        let branches: Vec<_> = seen
            .borrow()
            .iter()
            .map(|branch| (branch.arch.clone().unwrap_or_default(), branch.file.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            vec![
                ("i386".to_string(), "a.c".to_string()),
                ("i386".to_string(), "b.c".to_string()),
                ("x86_64".to_string(), "a.c".to_string()),
                ("x86_64".to_string(), "b.c".to_string()),
            ],
            branches
        );
        assert!(seen.borrow().iter().all(|branch| branch.revision == 2));
    }

    #[test]
    fn pinned_file_replaces_the_found_ones() {
        let mut record = classified(&["clang", "-c", "a.c", "b.c"]);
        record.file = Some("b.c".into());

        let (_, seen) = run_stage(PinFile, Probe::default(), record);

        assert_eq!(1, seen.len());
        assert_eq!(Some("b.c".to_string()), seen[0].file);
        assert!(seen[0].files.is_empty());
    }

    #[test]
    fn pinned_file_is_required() {
        let record = classified(&["clang", "-c", "a.c"]);

        let (outcome, seen) = run_stage(PinFile, Probe::default(), record);

        assert!(matches!(outcome, Err(PipelineError::Missing { field: "file" })));
        assert!(seen.is_empty());
    }
}
