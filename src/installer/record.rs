use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::resolver::RefKind;
use crate::{Error, Result};

/// Sidecar file written into every install directory.
pub const RECORD_FILENAME: &str = ".nvim-manager.json";

/// Parameters an install was produced from, so updates can replay them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRecord {
    pub repository: String,
    pub config_path: String,
    pub prefix: String,
    pub version: String,
    pub ref_kind: RefKind,
    pub git_commit_sha: String,
    pub installed_at: String,
}

impl InstallRecord {
    /// Get the path to the record inside an install directory.
    pub fn path_in(install_dir: &Path) -> PathBuf {
        install_dir.join(RECORD_FILENAME)
    }

    /// Read the record of an install, if it has one.
    pub fn read(install_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(install_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::JsonParse { path, source: e })
    }

    pub fn write(&self, install_dir: &Path) -> Result<()> {
        let path = Self::path_in(install_dir);

        let content = serde_json::to_string_pretty(self).map_err(|e| Error::JsonParse {
            path: path.clone(),
            source: e,
        })?;

        std::fs::write(&path, content).map_err(|e| Error::FileWrite { path, source: e })
    }
}

/// Get current time in ISO 8601 format (UTC).
pub(crate) fn iso8601_now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format_iso8601(secs)
}

fn format_iso8601(secs: u64) -> String {
    const SECONDS_PER_DAY: u64 = 86400;
    const SECONDS_PER_HOUR: u64 = 3600;
    const SECONDS_PER_MINUTE: u64 = 60;

    let days_since_epoch = secs / SECONDS_PER_DAY;
    let time_of_day = secs % SECONDS_PER_DAY;

    let (year, remaining_days) = year_from_days(days_since_epoch);
    let (month, day) = month_day_from_days(year, remaining_days);

    let hours = time_of_day / SECONDS_PER_HOUR;
    let minutes = (time_of_day % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let seconds = time_of_day % SECONDS_PER_MINUTE;

    format!("{year:04}-{month:02}-{day:02}T{hours:02}:{minutes:02}:{seconds:02}Z")
}

/// Calculate year and remaining days from days since Unix epoch.
fn year_from_days(days_since_epoch: u64) -> (i32, u64) {
    let mut year = 1970;
    let mut remaining = days_since_epoch;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining < days_in_year {
            return (year, remaining);
        }
        remaining -= days_in_year;
        year += 1;
    }
}

/// Calculate month (1-12) and day (1-31) from year and day-of-year.
fn month_day_from_days(year: i32, day_of_year: u64) -> (u32, u32) {
    let february = if is_leap_year(year) { 29 } else { 28 };
    let days_in_months: [u64; 12] = [31, february, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    let mut remaining = day_of_year;
    for (i, &days) in days_in_months.iter().enumerate() {
        if remaining < days {
            return ((i + 1) as u32, (remaining + 1) as u32);
        }
        remaining -= days;
    }

    (12, 31)
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstallRecord {
        InstallRecord {
            repository: "https://github.com/waylonwalker/devtainer".to_string(),
            config_path: "nvim/.config/nvim".to_string(),
            prefix: "nvim-waylonwalker".to_string(),
            version: "main".to_string(),
            ref_kind: RefKind::Branch,
            git_commit_sha: "abc123".to_string(),
            installed_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_read_missing_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(InstallRecord::read(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let record = sample();

        record.write(temp_dir.path()).unwrap();
        let content = std::fs::read_to_string(InstallRecord::path_in(temp_dir.path())).unwrap();
        assert!(content.contains("\"refKind\": \"branch\""));
        assert!(content.contains("\"gitCommitSha\": \"abc123\""));

        assert_eq!(InstallRecord::read(temp_dir.path()).unwrap(), Some(record));
    }

    #[test]
    fn test_corrupt_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(InstallRecord::path_in(temp_dir.path()), "{ not json").unwrap();

        let result = InstallRecord::read(temp_dir.path());
        assert!(matches!(result, Err(Error::JsonParse { .. })));
    }

    #[test]
    fn test_format_iso8601() {
        assert_eq!(format_iso8601(0), "1970-01-01T00:00:00Z");
        // 2024-02-29 12:34:56 UTC
        assert_eq!(format_iso8601(1_709_210_096), "2024-02-29T12:34:56Z");
    }

    #[test]
    fn test_iso8601_now_shape() {
        let timestamp = iso8601_now();
        assert_eq!(timestamp.len(), 20);
        assert!(timestamp.ends_with('Z'));
        assert!(timestamp.contains('T'));
    }
}
