// SPDX-License-Identifier: GPL-3.0-or-later

//! Decides the source language of a translation unit.
//!
//! The language comes from the `-x` flag of the compiler call when it was
//! given, otherwise from the extension of the source file. Only the
//! languages the analyzer understands are accepted.

use std::fmt;
use std::path::Path;

/// The languages the analyzer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
    ObjectiveC,
    ObjectiveCxx,
    CPreprocessed,
    CxxPreprocessed,
    ObjectiveCPreprocessed,
}

impl Language {
    /// The name of the language as the compiler `-x` flag spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
            Language::ObjectiveC => "objective-c",
            Language::ObjectiveCxx => "objective-c++",
            Language::CPreprocessed => "c-cpp-output",
            Language::CxxPreprocessed => "c++-cpp-output",
            Language::ObjectiveCPreprocessed => "objective-c-cpp-output",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "c" => Some(Language::C),
            "c++" => Some(Language::Cxx),
            "objective-c" => Some(Language::ObjectiveC),
            "objective-c++" => Some(Language::ObjectiveCxx),
            "c-cpp-output" => Some(Language::CPreprocessed),
            "c++-cpp-output" => Some(Language::CxxPreprocessed),
            "objective-c-cpp-output" => Some(Language::ObjectiveCPreprocessed),
            _ => None,
        }
    }

    /// File extension for the preprocessed output of a source in this language.
    pub fn preprocessed_extension(&self) -> &'static str {
        match self {
            Language::ObjectiveCxx => ".mii",
            Language::ObjectiveC => ".mi",
            Language::Cxx => ".ii",
            _ => ".i",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of the language resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Accepted(Language),
    /// A language was determined, but the analyzer can't process it.
    Unsupported(String),
    /// Neither the flags nor the file name tell the language.
    Unknown,
}

/// Resolves the language of the file.
///
/// An explicit language wins over the file extension. The C++ compiler
/// turns `.c` files into C++ and `.i` files into preprocessed C++.
pub fn resolve(file: &Path, is_cxx: bool, explicit: Option<&str>) -> Resolution {
    let name = match explicit {
        Some(name) => Some(name),
        None => file.extension().and_then(|extension| extension.to_str()).and_then(|extension| {
            from_extension(extension, is_cxx)
        }),
    };
    match name {
        Some(name) => match Language::from_name(name) {
            Some(language) => Resolution::Accepted(language),
            None => Resolution::Unsupported(name.to_string()),
        },
        None => Resolution::Unknown,
    }
}

fn from_extension(extension: &str, is_cxx: bool) -> Option<&'static str> {
    match extension {
        "c" if is_cxx => Some("c++"),
        "c" => Some("c"),
        "cp" | "cpp" | "cxx" | "txx" | "cc" | "C" => Some("c++"),
        "ii" => Some("c++-cpp-output"),
        "i" if is_cxx => Some("c++-cpp-output"),
        "i" => Some("c-cpp-output"),
        "m" => Some("objective-c"),
        "mi" => Some("objective-c-cpp-output"),
        "mm" => Some("objective-c++"),
        "mii" => Some("objective-c++-cpp-output"),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resolved(file: &str, is_cxx: bool) -> Resolution {
        resolve(Path::new(file), is_cxx, None)
    }

    #[test]
    fn c_sources_follow_the_compiler() {
        assert_eq!(Resolution::Accepted(Language::C), resolved("src/main.c", false));
        assert_eq!(Resolution::Accepted(Language::Cxx), resolved("src/main.c", true));
        assert_eq!(Resolution::Accepted(Language::CPreprocessed), resolved("main.i", false));
        assert_eq!(Resolution::Accepted(Language::CxxPreprocessed), resolved("main.i", true));
    }

    #[test]
    fn cxx_extensions() {
        for file in ["a.cp", "a.cpp", "a.cxx", "a.txx", "a.cc", "a.C"] {
            assert_eq!(Resolution::Accepted(Language::Cxx), resolved(file, false), "for {file}");
        }
        assert_eq!(Resolution::Accepted(Language::CxxPreprocessed), resolved("a.ii", false));
    }

    #[test]
    fn objective_c_extensions() {
        assert_eq!(Resolution::Accepted(Language::ObjectiveC), resolved("a.m", false));
        assert_eq!(Resolution::Accepted(Language::ObjectiveCPreprocessed), resolved("a.mi", false));
        assert_eq!(Resolution::Accepted(Language::ObjectiveCxx), resolved("a.mm", false));
        assert_eq!(Resolution::Unsupported("objective-c++-cpp-output".into()), resolved("a.mii", false));
    }

    #[test]
    fn unknown_files() {
        assert_eq!(Resolution::Unknown, resolved("main.o", false));
        assert_eq!(Resolution::Unknown, resolved("Makefile", false));
        assert_eq!(Resolution::Unknown, resolved(".c", false));
    }

    #[test]
    fn explicit_language_wins() {
        assert_eq!(Resolution::Accepted(Language::Cxx), resolve(Path::new("a.c"), false, Some("c++")));
        assert_eq!(Resolution::Accepted(Language::C), resolve(Path::new("a.unknown"), false, Some("c")));
        assert_eq!(
            Resolution::Unsupported("assembler".into()),
            resolve(Path::new("a.c"), false, Some("assembler"))
        );
    }

    #[test]
    fn preprocessed_extensions() {
        assert_eq!(".mii", Language::ObjectiveCxx.preprocessed_extension());
        assert_eq!(".mi", Language::ObjectiveC.preprocessed_extension());
        assert_eq!(".ii", Language::Cxx.preprocessed_extension());
        assert_eq!(".i", Language::C.preprocessed_extension());
        assert_eq!(".i", Language::CPreprocessed.preprocessed_extension());
    }
}
