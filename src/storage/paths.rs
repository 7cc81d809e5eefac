// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the on-disk data layout.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DATA_DIR;

/// Storage path utilities.
///
/// ```text
/// {root}/
///   {network}/
///     history.json    # Deployment history for that network
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything recorded for one network.
    pub fn network_dir(&self, network: &str) -> PathBuf {
        self.root.join(sanitize(network))
    }

    /// Path to the deployment history of a network.
    pub fn history_file(&self, network: &str) -> PathBuf {
        self.network_dir(network).join("history.json")
    }
}

/// Network names come from user input; keep them to a single path segment.
fn sanitize(network: &str) -> String {
    let cleaned: String = network
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_dir() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new(".ctrex"));
        assert_eq!(
            paths.history_file("localhost"),
            PathBuf::from(".ctrex/localhost/history.json")
        );
    }

    #[test]
    fn custom_root_for_testing() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(
            paths.history_file("sepolia"),
            PathBuf::from("/tmp/test-data/sepolia/history.json")
        );
    }

    #[test]
    fn network_names_stay_in_one_segment() {
        let paths = StoragePaths::new("/d");
        assert_eq!(paths.network_dir("../Main Net"), PathBuf::from("/d/___main_net"));
        assert_eq!(paths.network_dir("  "), PathBuf::from("/d/default"));
    }
}
