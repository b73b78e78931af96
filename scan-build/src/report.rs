// SPDX-License-Identifier: GPL-3.0-or-later

//! The directory the analyzer writes its reports into.

use std::path::{Path, PathBuf};

/// A uniquely named report directory of a single run.
#[derive(Debug)]
pub struct ReportDirectory {
    path: PathBuf,
    keep_empty: bool,
}

impl ReportDirectory {
    /// Creates `scan-build-XXXXXX` in the parent directory.
    pub fn create(parent: &Path, keep_empty: bool) -> std::io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let path = tempfile::Builder::new().prefix("scan-build-").rand_bytes(6).tempdir_in(parent)?.keep();
        log::debug!("Report directory created: {}", path.display());
        Ok(Self { path, keep_empty })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory if the analysis did not write anything into it.
    ///
    /// Returns the path of the directory when it was kept.
    pub fn finish(self) -> std::io::Result<Option<PathBuf>> {
        let empty = std::fs::read_dir(&self.path)?.next().is_none();
        if empty && !self.keep_empty {
            std::fs::remove_dir(&self.path)?;
            log::warn!("Removing directory '{}' because it contains no report.", self.path.display());
            return Ok(None);
        }
        log::warn!("Run 'scan-view {}' to examine bug reports.", self.path.display());
        Ok(Some(self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_location() {
        let parent = tempfile::tempdir().unwrap();

        let report = ReportDirectory::create(parent.path(), false).unwrap();

        assert!(report.path().is_dir());
        assert_eq!(Some(parent.path()), report.path().parent());
        let name = report.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("scan-build-"));
        assert_eq!("scan-build-".len() + 6, name.len());
    }

    #[test]
    fn test_empty_directory_is_removed() {
        let parent = tempfile::tempdir().unwrap();
        let report = ReportDirectory::create(parent.path(), false).unwrap();
        let path = report.path().to_path_buf();

        assert_eq!(None, report.finish().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_directory_is_kept_on_request() {
        let parent = tempfile::tempdir().unwrap();
        let report = ReportDirectory::create(parent.path(), true).unwrap();
        let path = report.path().to_path_buf();

        assert_eq!(Some(path.clone()), report.finish().unwrap());
        assert!(path.is_dir());
    }

    #[test]
    fn test_directory_with_reports_is_kept() {
        let parent = tempfile::tempdir().unwrap();
        let report = ReportDirectory::create(parent.path(), false).unwrap();
        std::fs::write(report.path().join("report-abc.html"), "<html/>").unwrap();
        let path = report.path().to_path_buf();

        assert_eq!(Some(path.clone()), report.finish().unwrap());
        assert!(path.is_dir());
    }
}
