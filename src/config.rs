use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;

/// Phase durations in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimerSettings {
    #[serde(deserialize_with = "minutes")]
    pub work: u32,
    #[serde(deserialize_with = "minutes")]
    pub short_break: u32,
    #[serde(deserialize_with = "minutes")]
    pub long_break: u32,
}

/// Accepts any JSON integer. Values below one or beyond `u32` become 0 so that
/// `sanitized` swaps in the field default instead of rejecting the document.
fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw).unwrap_or(0))
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

impl TimerSettings {
    /// Replaces zero durations with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |name: &str, value: u32, fallback: u32| {
            if value == 0 {
                tracing::warn!(field = name, fallback, "non-positive duration, using default");
                fallback
            } else {
                value
            }
        };
        Self {
            work: pick("work", self.work, defaults.work),
            short_break: pick("short_break", self.short_break, defaults.short_break),
            long_break: pick("long_break", self.long_break, defaults.long_break),
        }
    }
}

/// Completed work phases per local calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SessionStats(BTreeMap<NaiveDate, u32>);

impl SessionStats {
    pub fn increment(&mut self, date: NaiveDate) -> u32 {
        let count = self.0.entry(date).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn count_for(&self, date: NaiveDate) -> u32 {
        self.0.get(&date).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().map(|&c| c as u64).sum()
    }

    pub fn active_days(&self) -> usize {
        self.0.values().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.0.iter().map(|(d, c)| (*d, *c))
    }

    /// Consecutive days with at least one completion, ending at `date`.
    /// A day with nothing logged yet does not break a streak that ran through yesterday.
    pub fn streak_ending(&self, date: NaiveDate) -> u32 {
        let mut day = if self.count_for(date) > 0 {
            date
        } else {
            date - Duration::days(1)
        };
        let mut streak = 0;
        while self.count_for(day) > 0 {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }
}

impl FromIterator<(NaiveDate, u32)> for SessionStats {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// On-disk aggregate of settings and stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedDocument {
    #[serde(default)]
    pub timer_settings: TimerSettings,
    #[serde(default)]
    pub session_stats: SessionStats,
}

impl PersistedDocument {
    pub fn sanitized(self) -> Self {
        Self {
            timer_settings: self.timer_settings.sanitized(),
            session_stats: self.session_stats,
        }
    }
}

pub trait ConfigStore {
    /// Never fails: a missing or unreadable document yields defaults.
    fn load(&self) -> PersistedDocument;
    fn save(&self, doc: &PersistedDocument) -> Result<(), StoreError>;

    /// Bumps `date` in memory, then persists. The count survives a failed write.
    fn record_completion(
        &self,
        doc: &mut PersistedDocument,
        date: NaiveDate,
    ) -> Result<u32, StoreError> {
        let count = doc.session_stats.increment(date);
        self.save(doc)?;
        Ok(count)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn load(&self) -> PersistedDocument {
        (**self).load()
    }

    fn save(&self, doc: &PersistedDocument) -> Result<(), StoreError> {
        (**self).save(doc)
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::document_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Keeps an unparseable document around instead of silently overwriting it.
    fn quarantine(&self) {
        let target = self.sibling(".corrupt");
        match fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(path = %target.display(), "moved unreadable document aside"),
            Err(err) => tracing::warn!(error = %err, "could not move unreadable document aside"),
        }
    }

    fn write_atomically(&self, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.sibling(".tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_path);
        })
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> PersistedDocument {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<PersistedDocument>(&bytes) {
                Ok(doc) => return doc.sanitized(),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "document is malformed, using defaults"
                    );
                    self.quarantine();
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no document yet, writing defaults");
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "document is unreadable, using defaults"
                );
                self.quarantine();
            }
        }

        let doc = PersistedDocument::default();
        if let Err(err) = self.save(&doc) {
            tracing::warn!(error = %err, "could not persist default document");
        }
        doc
    }

    fn save(&self, doc: &PersistedDocument) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(doc)?;
        self.write_atomically(&data)
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
