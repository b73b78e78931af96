// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Termination, ToolError};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time;

/// Runs the command to completion while forwarding termination requests.
///
/// The compiler wrapper stands in for the real compiler, so a build
/// system that stops the wrapper has to stop the compiler as well.
pub fn supervise(command: &mut Command) -> Result<Termination, ToolError> {
    let executable = PathBuf::from(command.get_program());
    let signaled = Arc::new(AtomicUsize::new(0));
    for signal in signal_hook::consts::TERM_SIGNALS {
        signal_hook::flag::register_usize(*signal, Arc::clone(&signaled), *signal as usize)
            .map_err(|source| ToolError::Signal { executable: executable.clone(), source })?;
    }

    let mut child =
        command.spawn().map_err(|source| ToolError::Spawn { executable: executable.clone(), source })?;

    loop {
        if signaled.swap(0usize, Ordering::SeqCst) != 0 {
            log::debug!("Received signal, forwarding to child process");
            child.kill().map_err(|source| ToolError::Kill { executable: executable.clone(), source })?;
        }

        match child.try_wait() {
            Ok(Some(exit_status)) => {
                log::debug!("Child process exited: {exit_status:?}");
                return Ok(Termination::from(exit_status));
            }
            Ok(None) => thread::sleep(time::Duration::from_millis(50)),
            Err(source) => return Err(ToolError::Wait { executable, source }),
        }
    }
}
