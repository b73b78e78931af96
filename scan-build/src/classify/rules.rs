// SPDX-License-Identifier: GPL-3.0-or-later

//! The ordered rule table of the argument classifier.
//!
//! Each rule pairs a matcher (which tokens it recognizes) with a take
//! instruction (what to record and how many tokens to consume). The table
//! is evaluated top to bottom and the first matching rule wins, so the
//! order of the entries is part of the grammar: specific forms have to
//! precede the generic catch-alls below them.

use super::Action;
use regex::Regex;
use std::sync::LazyLock;

/// Append-only collections of the classification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    CompileOptions,
    LinkOptions,
    ArchsSeen,
    Files,
}

/// Scalar fields of the classification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Language,
    Output,
}

/// Describes which tokens a rule recognizes.
#[derive(Debug)]
pub enum Matcher {
    /// The token is one of the literal flags.
    AnyOf(&'static [&'static str]),
    /// The token matches the pattern. When the pattern has a capture group,
    /// an empty capture means the value is in the next token.
    Pattern(Regex),
    /// Anything that does not look like a flag.
    Positional,
}

/// Describes what a matching rule records and how many tokens it consumes.
#[derive(Debug, Clone, Copy)]
pub enum Take {
    /// Raise the action of the command to at least this level.
    Action(Action),
    /// Append the current token and the following `n - 1` tokens to the buckets.
    /// An empty bucket list discards the tokens.
    Count(usize, &'static [Bucket]),
    /// Append the current token, and the next one when the value is not attached.
    Joined(&'static [Bucket]),
    /// Append the literal instead of the current token.
    As(&'static str, &'static [Bucket]),
    /// Store the next token into the field.
    Second(Field),
    /// Replace the bucket with the lines of the file named by the next token.
    FromFile(Bucket),
}

#[derive(Debug)]
pub struct Rule {
    pub matcher: Matcher,
    pub take: Take,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// The value of the flag is attached to the token itself.
    pub joined: bool,
}

impl Rule {
    const fn new(matcher: Matcher, take: Take) -> Self {
        Self { matcher, take }
    }

    fn pattern(pattern: &str, take: Take) -> Self {
        let regex = Regex::new(pattern).expect("Invalid flag regex pattern");
        Self::new(Matcher::Pattern(regex), take)
    }

    pub fn matches(&self, token: &str) -> Option<Match> {
        match &self.matcher {
            Matcher::AnyOf(flags) => flags.contains(&token).then_some(Match { joined: true }),
            Matcher::Positional => (!token.starts_with('-')).then_some(Match { joined: true }),
            Matcher::Pattern(regex) => regex.captures(token).map(|captures| {
                let joined = captures.get(1).is_none_or(|value| !value.as_str().is_empty());
                Match { joined }
            }),
        }
    }
}

const COMPILE: &[Bucket] = &[Bucket::CompileOptions];
const COMPILE_AND_LINK: &[Bucket] = &[Bucket::CompileOptions, Bucket::LinkOptions];
const LINK: &[Bucket] = &[Bucket::LinkOptions];
const DISCARD: &[Bucket] = &[];

/// The rules to classify the arguments of a GCC-compatible compiler driver.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Actions
        Rule::pattern(r"^-(E|MM?)$", Take::Action(Action::Preprocess)),
        Rule::new(Matcher::AnyOf(&["-c"]), Take::Action(Action::Compile)),
        Rule::new(Matcher::AnyOf(&["-print-prog-name"]), Take::Action(Action::Info)),
        // Architecture, inputs and outputs
        Rule::new(Matcher::AnyOf(&["-arch"]), Take::Count(2, &[Bucket::ArchsSeen])),
        Rule::new(Matcher::AnyOf(&["-filelist"]), Take::FromFile(Bucket::Files)),
        Rule::new(Matcher::Positional, Take::Count(1, &[Bucket::Files])),
        Rule::new(Matcher::AnyOf(&["-x"]), Take::Second(Field::Language)),
        Rule::new(Matcher::AnyOf(&["-o"]), Take::Second(Field::Output)),
        // Relevant for both compilation and linking
        Rule::new(Matcher::AnyOf(&["-write-strings", "-v"]), Take::Count(1, COMPILE_AND_LINK)),
        Rule::new(
            Matcher::AnyOf(&["-ftrapv-handler", "--sysroot", "-target"]),
            Take::Count(2, COMPILE_AND_LINK),
        ),
        Rule::pattern(r"^-isysroot", Take::Count(2, COMPILE_AND_LINK)),
        Rule::pattern(r"^-m(32|64)$", Take::Count(1, COMPILE_AND_LINK)),
        Rule::pattern(r"^-mios-simulator-version-min(.*)", Take::Joined(COMPILE_AND_LINK)),
        Rule::pattern(r"^-stdlib(.*)", Take::Joined(COMPILE_AND_LINK)),
        Rule::pattern(r"^-mmacosx-version-min(.*)", Take::Joined(COMPILE_AND_LINK)),
        Rule::pattern(r"^-miphoneos-version-min(.*)", Take::Joined(COMPILE_AND_LINK)),
        // Optimization levels, `-O` and `-Os` are normalized
        Rule::pattern(r"^-O[1-3]$", Take::Count(1, COMPILE_AND_LINK)),
        Rule::new(Matcher::AnyOf(&["-O"]), Take::As("-O1", COMPILE_AND_LINK)),
        Rule::new(Matcher::AnyOf(&["-Os"]), Take::As("-O2", COMPILE_AND_LINK)),
        // Preprocessor and compilation only
        Rule::pattern(r"^-[DIU](.*)$", Take::Joined(COMPILE)),
        Rule::new(Matcher::AnyOf(&["-nostdinc"]), Take::Count(1, COMPILE)),
        Rule::pattern(r"^-std=", Take::Count(1, COMPILE)),
        Rule::pattern(r"^-include", Take::Count(2, COMPILE)),
        Rule::new(
            Matcher::AnyOf(&["-idirafter", "-imacros", "-iprefix", "-isystem", "-iwithprefix", "-iwithprefixbefore"]),
            Take::Count(2, COMPILE),
        ),
        Rule::pattern(r"^-m.*", Take::Count(1, COMPILE)),
        Rule::pattern(r"^-iquote(.*)", Take::Joined(COMPILE)),
        Rule::pattern(r"^-Wno-", Take::Count(1, COMPILE)),
        // Linking only
        Rule::pattern(r"^-framework$", Take::Count(2, LINK)),
        Rule::pattern(r"^-fobjc-link-runtime(.*)", Take::Joined(LINK)),
        Rule::pattern(r"^-[lL]", Take::Count(1, LINK)),
        // Ignored
        Rule::pattern(r"^-M[TF]$", Take::Count(2, DISCARD)),
        Rule::pattern(r"^-[eu]$", Take::Count(2, DISCARD)),
        Rule::new(Matcher::AnyOf(&["-fsyntax-only", "-save-temps"]), Take::Count(1, DISCARD)),
        Rule::new(
            Matcher::AnyOf(&[
                "-install_name",
                "-exported_symbols_list",
                "-current_version",
                "-compatibility_version",
                "-init",
                "-seg1addr",
                "-bundle_loader",
                "-multiply_defined",
                "--param",
                "--serialize-diagnostics",
            ]),
            Take::Count(2, DISCARD),
        ),
        Rule::new(Matcher::AnyOf(&["-sectorder"]), Take::Count(4, DISCARD)),
        // Catch-all for the remaining feature flags
        Rule::pattern(r"^-[fF](.+)$", Take::Count(1, COMPILE_AND_LINK)),
    ]
});

/// Finds the first rule which recognizes the token.
pub fn lookup(token: &str) -> Option<(&'static Rule, Match)> {
    RULES.iter().find_map(|rule| rule.matches(token).map(|found| (rule, found)))
}
