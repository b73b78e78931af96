// SPDX-License-Identifier: GPL-3.0-or-later

//! Assembles the command lines handed to the external compiler.

use crate::config::Analyzer;
use crate::pipeline::{PipelineError, Record};
use std::path::Path;

/// The front-end options which configure the static analyzer.
///
/// These are passed through the compiler driver, so each is prefixed
/// with `-Xclang`.
pub fn direct_arguments(analyzer: &Analyzer, verbose: bool) -> Vec<String> {
    let mut result = vec![
        format!("-analyzer-store={}", analyzer.store.as_str()),
        format!("-analyzer-constraints={}", analyzer.constraints.as_str()),
    ];
    if analyzer.internal_stats {
        result.push("-analyzer-stats".to_string());
    }
    if analyzer.analyze_headers {
        result.push("-analyzer-opt-analyze-headers".to_string());
    }
    if analyzer.stats {
        result.push("-analyzer-checker=debug.Stats".to_string());
    }
    result.extend(["-analyzer-max-loop".to_string(), analyzer.max_loop.to_string()]);
    result.push(format!("-analyzer-output={}", analyzer.output_format.as_str()));
    if let Some(config) = &analyzer.config {
        result.extend(["-analyzer-config".to_string(), config.clone()]);
    }
    if verbose {
        result.push("-analyzer-display-progress".to_string());
    }
    for plugin in &analyzer.plugins {
        result.extend(["-load".to_string(), plugin.display().to_string()]);
    }
    if !analyzer.enable_checkers.is_empty() {
        result.extend(["-analyzer-checker".to_string(), analyzer.enable_checkers.join(",")]);
    }
    if !analyzer.disable_checkers.is_empty() {
        result.extend(["-analyzer-disable-checker".to_string(), analyzer.disable_checkers.join(",")]);
    }
    if analyzer.ubiviz {
        result.push("-analyzer-viz-egraph-ubigraph".to_string());
    }

    result.into_iter().flat_map(|argument| ["-Xclang".to_string(), argument]).collect()
}

/// The arguments which describe what to compile: architecture, options, language and file.
pub fn syntax_arguments(record: &Record) -> Result<Vec<String>, PipelineError> {
    let file = record.require_file()?;
    let language = record.require_language()?;

    let mut result = Vec::new();
    if let Some(arch) = &record.arch {
        result.extend(["-arch".to_string(), arch.clone()]);
    }
    result.extend(record.compile_options.iter().cloned());
    result.extend(["-x".to_string(), language.as_str().to_string(), file.clone()]);
    Ok(result)
}

/// The compiler driver call which runs the analyzer on the record.
pub fn analyze_command(record: &Record, direct: &[String]) -> Result<Vec<String>, PipelineError> {
    let clang = record.require_clang()?;

    let mut result = vec![clang.clone(), "--analyze".to_string()];
    result.extend(direct.iter().cloned());
    result.extend(syntax_arguments(record)?);
    if let Some(output) = &record.analyzer_output {
        result.extend(["-o".to_string(), output.display().to_string()]);
    }
    Ok(result)
}

/// The compiler driver call which writes the preprocessed source of the record.
pub fn preprocess_command(record: &Record, output: &Path) -> Result<Vec<String>, PipelineError> {
    let clang = record.require_clang()?;

    let mut result = vec![clang.clone(), "-fsyntax-only".to_string(), "-E".to_string()];
    result.extend(syntax_arguments(record)?);
    result.extend(["-o".to_string(), output.display().to_string()]);
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{ConstraintsModel, OutputFormat, StoreModel};
    use crate::language::Language;
    use std::path::PathBuf;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    fn record() -> Record {
        Record {
            clang: Some("clang".into()),
            compile_options: strings(&["-O2", "-Dfoo"]),
            file: Some("src.c".into()),
            language: Some(Language::C),
            ..Default::default()
        }
    }

    #[test]
    fn default_direct_arguments() {
        let result = direct_arguments(&Analyzer::default(), false);

        assert_eq!(
            strings(&[
                "-Xclang",
                "-analyzer-store=region",
                "-Xclang",
                "-analyzer-constraints=range",
                "-Xclang",
                "-analyzer-max-loop",
                "-Xclang",
                "4",
                "-Xclang",
                "-analyzer-output=html",
            ]),
            result
        );
    }

    #[test]
    fn all_direct_arguments() {
        let analyzer = Analyzer {
            store: StoreModel::Basic,
            constraints: ConstraintsModel::Basic,
            internal_stats: true,
            analyze_headers: true,
            stats: true,
            max_loop: 8,
            output_format: OutputFormat::Plist,
            config: Some("stable-report-filename=true".into()),
            plugins: vec![PathBuf::from("/opt/a.so")],
            enable_checkers: strings(&["core", "unix"]),
            disable_checkers: strings(&["deadcode.DeadStores"]),
            ubiviz: true,
        };

        let result = direct_arguments(&analyzer, true);

        let unprefixed: Vec<&str> = result.iter().skip(1).step_by(2).map(String::as_str).collect();
        assert!(result.iter().step_by(2).all(|argument| argument == "-Xclang"));
        assert_eq!(
            vec![
                "-analyzer-store=basic",
                "-analyzer-constraints=basic",
                "-analyzer-stats",
                "-analyzer-opt-analyze-headers",
                "-analyzer-checker=debug.Stats",
                "-analyzer-max-loop",
                "8",
                "-analyzer-output=plist",
                "-analyzer-config",
                "stable-report-filename=true",
                "-analyzer-display-progress",
                "-load",
                "/opt/a.so",
                "-analyzer-checker",
                "core,unix",
                "-analyzer-disable-checker",
                "deadcode.DeadStores",
                "-analyzer-viz-egraph-ubigraph",
            ],
            unprefixed
        );
    }

    #[test]
    fn syntax_arguments_with_arch() {
        let record = Record { arch: Some("i386".into()), ..record() };

        let result = syntax_arguments(&record).unwrap();

        assert_eq!(strings(&["-arch", "i386", "-O2", "-Dfoo", "-x", "c", "src.c"]), result);
    }

    #[test]
    fn analyze_command_layout() {
        let record = Record { analyzer_output: Some(PathBuf::from("/tmp/out")), ..record() };
        let direct = strings(&["-Xclang", "-analyzer-output=html"]);

        let result = analyze_command(&record, &direct).unwrap();

        assert_eq!(
            strings(&[
                "clang",
                "--analyze",
                "-Xclang",
                "-analyzer-output=html",
                "-O2",
                "-Dfoo",
                "-x",
                "c",
                "src.c",
                "-o",
                "/tmp/out"
            ]),
            result
        );
    }

    #[test]
    fn analyze_command_without_output() {
        let result = analyze_command(&record(), &[]).unwrap();

        assert_eq!(strings(&["clang", "--analyze", "-O2", "-Dfoo", "-x", "c", "src.c"]), result);
    }

    #[test]
    fn preprocess_command_layout() {
        let result = preprocess_command(&record(), Path::new("/tmp/failures/clang_crash_x.i")).unwrap();

        assert_eq!(
            strings(&[
                "clang",
                "-fsyntax-only",
                "-E",
                "-O2",
                "-Dfoo",
                "-x",
                "c",
                "src.c",
                "-o",
                "/tmp/failures/clang_crash_x.i"
            ]),
            result
        );
    }

    #[test]
    fn missing_language_is_an_error() {
        let record = Record { language: None, ..record() };

        assert!(matches!(syntax_arguments(&record), Err(PipelineError::Missing { field: "language" })));
    }
}
