// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;
use std::sync::LazyLock;

// Settings of the static analyzer, read by the compiler wrapper.
pub const KEY_ANALYZER__HTML: &str = "CCC_ANALYZER_HTML";
pub const KEY_ANALYZER__OUTPUT_FORMAT: &str = "CCC_ANALYZER_OUTPUT_FORMAT";
pub const KEY_ANALYZER__STORE_MODEL: &str = "CCC_ANALYZER_STORE_MODEL";
pub const KEY_ANALYZER__CONSTRAINTS_MODEL: &str = "CCC_ANALYZER_CONSTRAINTS_MODEL";
pub const KEY_ANALYZER__INTERNAL_STATS: &str = "CCC_ANALYZER_INTERNAL_STATS";
pub const KEY_ANALYZER__STATS: &str = "CCC_ANALYZER_STATS";
pub const KEY_ANALYZER__ANALYZE_HEADERS: &str = "CCC_ANALYZER_ANALYZE_HEADERS";
pub const KEY_ANALYZER__MAX_LOOP: &str = "CCC_ANALYZER_MAX_LOOP";
pub const KEY_ANALYZER__CONFIG: &str = "CCC_ANALYZER_CONFIG";
pub const KEY_ANALYZER__PLUGINS: &str = "CCC_ANALYZER_PLUGINS";
pub const KEY_ANALYZER__ENABLE_CHECKERS: &str = "CCC_ANALYZER_ENABLE_CHECKERS";
pub const KEY_ANALYZER__DISABLE_CHECKERS: &str = "CCC_ANALYZER_DISABLE_CHECKERS";
pub const KEY_ANALYZER__UBIVIZ: &str = "CCC_UBI";
pub const KEY_ANALYZER__REPORT_FAILURES: &str = "CCC_REPORT_FAILURES";

// Verbosity of the compiler wrapper.
pub const KEY_ANALYZER__VERBOSE: &str = "CCC_ANALYZER_VERBOSE";
pub const KEY_ANALYZER__LOG: &str = "CCC_ANALYZER_LOG";

// The compilers the wrapper delegates to.
pub const KEY_WRAPPER__C_COMPILER: &str = "CCC_CC";
pub const KEY_WRAPPER__CXX_COMPILER: &str = "CCC_CXX";
pub const KEY_WRAPPER__CLANG: &str = "CLANG";
pub const KEY_WRAPPER__CLANG_CXX: &str = "CLANG_CXX";

// man page for `exec` (Linux system call)
pub const KEY_OS__PATH: &str = "PATH";

// https://gcc.gnu.org/onlinedocs/cpp/Environment-Variables.html
pub const KEY_GCC__C_INCLUDE_1: &str = "CPATH";
pub const KEY_GCC__C_INCLUDE_2: &str = "C_INCLUDE_PATH";
pub const KEY_GCC__C_INCLUDE_3: &str = "CPLUS_INCLUDE_PATH";
pub const KEY_GCC__OBJC_INCLUDE: &str = "OBJC_INCLUDE_PATH";

static ANALYZER_KEYS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        KEY_ANALYZER__HTML,
        KEY_ANALYZER__OUTPUT_FORMAT,
        KEY_ANALYZER__STORE_MODEL,
        KEY_ANALYZER__CONSTRAINTS_MODEL,
        KEY_ANALYZER__INTERNAL_STATS,
        KEY_ANALYZER__STATS,
        KEY_ANALYZER__ANALYZE_HEADERS,
        KEY_ANALYZER__MAX_LOOP,
        KEY_ANALYZER__CONFIG,
        KEY_ANALYZER__PLUGINS,
        KEY_ANALYZER__ENABLE_CHECKERS,
        KEY_ANALYZER__DISABLE_CHECKERS,
        KEY_ANALYZER__UBIVIZ,
        KEY_ANALYZER__REPORT_FAILURES,
        KEY_ANALYZER__VERBOSE,
        KEY_ANALYZER__LOG,
    ]
    .into_iter()
    .collect()
});

static COMPILER_KEYS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [KEY_WRAPPER__C_COMPILER, KEY_WRAPPER__CXX_COMPILER, KEY_WRAPPER__CLANG, KEY_WRAPPER__CLANG_CXX]
        .into_iter()
        .collect()
});

static GCC_INCLUDE_KEYS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [KEY_GCC__C_INCLUDE_1, KEY_GCC__C_INCLUDE_2, KEY_GCC__C_INCLUDE_3, KEY_GCC__OBJC_INCLUDE]
        .into_iter()
        .collect()
});

/// The variables which change how a compilation gets analyzed.
pub fn relevant_env(key: &str) -> bool {
    ANALYZER_KEYS.contains(key)
        || COMPILER_KEYS.contains(key)
        || GCC_INCLUDE_KEYS.contains(key)
        // Windows PATH variable is case sensitive and not always capitalized
        || key.to_uppercase() == KEY_OS__PATH
}
