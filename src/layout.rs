use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Separator placed between prefix and version in install directory names.
pub const SEPARATOR: char = '-';

/// Name prefix reserved for per-invocation scratch clones under the install root.
pub const SCRATCH_PREFIX: &str = ".nvim-manager-scratch-";

/// Fixed scratch directory used by older releases of the tool.
pub const LEGACY_SCRATCH_DIR: &str = "temp-nvim-config";

/// Encapsulates the `<root>/<prefix>-<version>` install directory convention.
///
/// All encoding and decoding of install directory names goes through this
/// type. When several registered prefixes share a textual prefix
/// (`kickstart` and `kickstart-modular`), a directory name is attributed to
/// the longest registered prefix that matches it.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
    /// Registered prefixes, longest first.
    known_prefixes: Vec<String>,
}

impl InstallLayout {
    /// Create a layout with no registered prefixes.
    ///
    /// Lookups then fall back to plain `prefix-` matching.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            known_prefixes: Vec::new(),
        }
    }

    /// Create a layout that disambiguates between the given prefixes.
    pub fn with_prefixes<I, S>(root: impl Into<PathBuf>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known_prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        known_prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        known_prefixes.dedup();

        Self {
            root: root.into(),
            known_prefixes,
        }
    }

    /// Returns reference to the install root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the registered prefixes, longest first.
    pub fn known_prefixes(&self) -> &[String] {
        &self.known_prefixes
    }

    /// Directory name for an install, also the activation value for the launcher.
    pub fn dir_name(prefix: &str, version: &str) -> String {
        format!("{prefix}{SEPARATOR}{version}")
    }

    /// Path an install of `version` under `prefix` lives at.
    ///
    /// Pure join, no I/O and no validation of `version`.
    pub fn install_path(&self, prefix: &str, version: &str) -> PathBuf {
        self.root.join(Self::dir_name(prefix, version))
    }

    /// Split a directory name into its registered prefix and version.
    pub fn parse_dir_name<'a, 'n>(&'a self, name: &'n str) -> Option<(&'a str, &'n str)> {
        self.known_prefixes
            .iter()
            .find_map(|prefix| strip_prefix(name, prefix).map(|version| (prefix.as_str(), version)))
    }

    /// Versions installed under `prefix`, read fresh from disk.
    ///
    /// A missing or unreadable root yields an empty set. Non-directory
    /// entries and names claimed by a longer registered prefix are skipped.
    pub fn list_installed(&self, prefix: &str) -> BTreeSet<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "install root not readable");
                return BTreeSet::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| {
                self.version_for(&name, prefix)
                    .map(|version| version.to_string())
            })
            .collect()
    }

    fn version_for<'n>(&self, name: &'n str, prefix: &str) -> Option<&'n str> {
        let version = strip_prefix(name, prefix)?;
        let claimed_by_longer = self
            .known_prefixes
            .iter()
            .filter(|other| other.len() > prefix.len())
            .any(|other| strip_prefix(name, other).is_some());

        if claimed_by_longer { None } else { Some(version) }
    }

    /// Remove scratch directories left behind by interrupted runs.
    ///
    /// Per-invocation scratch directories are only removed once older than
    /// `max_age`; the legacy fixed scratch directory is always removed.
    pub fn sweep_stale_scratch(&self, max_age: Duration) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return 0;
        };

        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };

            let stale = if name == LEGACY_SCRATCH_DIR {
                true
            } else if name.starts_with(SCRATCH_PREFIX) {
                entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age >= max_age)
            } else {
                false
            };

            if !stale || !path.is_dir() {
                continue;
            }

            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed stale scratch directory");
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale scratch directory"),
            }
        }

        removed
    }
}

fn strip_prefix<'n>(name: &'n str, prefix: &str) -> Option<&'n str> {
    name.strip_prefix(prefix)?.strip_prefix(SEPARATOR)
}
