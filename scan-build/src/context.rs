// SPDX-License-Identifier: GPL-3.0-or-later

use crate::environment;
use anyhow::{Context as AnyhowContext, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Application context containing runtime environment information.
///
/// Captured once at startup, so the configuration and the pipeline set up
/// can work without further queries of the process state.
#[derive(Debug, Clone)]
pub struct Context {
    /// Path to the current executable
    pub current_executable: PathBuf,
    /// Current working directory when the program was invoked
    pub current_directory: PathBuf,
    /// All environment variables at startup
    pub environment: HashMap<String, String>,
}

impl Context {
    /// Capture the current application context.
    pub fn capture() -> Result<Self> {
        let current_executable =
            env::current_exe().with_context(|| "Failed to get current executable path")?;

        let current_directory =
            env::current_dir().with_context(|| "Failed to get current working directory")?;

        let environment = env::vars().collect::<HashMap<String, String>>();

        Ok(Context { current_executable, current_directory, environment })
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Application Context:")?;
        writeln!(f, "Current Executable: {}", self.current_executable.display())?;
        writeln!(f, "Current Directory: {}", self.current_directory.display())?;
        writeln!(f, "Total Environment Variables: {} entries", self.environment.len())?;

        writeln!(f, "Relevant Environment Variables:")?;
        let mut relevant: Vec<_> =
            self.environment.iter().filter(|(key, _)| environment::relevant_env(key)).collect();
        relevant.sort();
        for (key, value) in relevant {
            writeln!(f, "  {}={}", key, value)?;
        }

        Ok(())
    }
}
