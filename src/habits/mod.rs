//! Monthly habit tracker.
//!
//! One JSON file per month in the remote repository, keyed by day of month
//! and then habit name. Writes go through the same hash-checked create/update
//! path as documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::documents::remote_path;
use crate::errors::AppError;
use crate::github::DocumentStore;

/// Habits shown on a fresh month.
pub const DEFAULT_HABITS: [&str; 7] = [
    "Exercise",
    "Reading",
    "Meditation",
    "Water (8 cups)",
    "Healthy Eating",
    "Sleep 8hrs",
    "Journal",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HabitStatus {
    Completed,
    Missed,
}

impl HabitStatus {
    /// none -> completed -> missed -> none
    pub fn toggle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(HabitStatus::Completed),
            Some(HabitStatus::Completed) => Some(HabitStatus::Missed),
            Some(HabitStatus::Missed) => None,
        }
    }
}

/// Per-habit tally for a month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HabitStats {
    pub completed: u32,
    pub missed: u32,
    /// Completed share of tracked days, in whole percent
    pub rate: u32,
}

/// A month of habit entries: day of month -> habit -> status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLog")]
pub struct HabitLog(BTreeMap<String, BTreeMap<String, HabitStatus>>);

/// Stored form; cleared cells may be written as `null`.
#[derive(Deserialize)]
struct RawLog(BTreeMap<String, BTreeMap<String, Option<HabitStatus>>>);

impl From<RawLog> for HabitLog {
    fn from(raw: RawLog) -> Self {
        let days = raw
            .0
            .into_iter()
            .map(|(day, habits)| {
                let habits: BTreeMap<_, _> = habits
                    .into_iter()
                    .filter_map(|(habit, status)| status.map(|s| (habit, s)))
                    .collect();
                (day, habits)
            })
            .filter(|(_, habits)| !habits.is_empty())
            .collect();
        HabitLog(days)
    }
}

impl HabitLog {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize habit log: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn status(&self, day: u32, habit: &str) -> Option<HabitStatus> {
        self.0
            .get(&day.to_string())
            .and_then(|habits| habits.get(habit))
            .copied()
    }

    pub fn set(&mut self, day: u32, habit: &str, status: Option<HabitStatus>) {
        let key = day.to_string();
        match status {
            Some(status) => {
                self.0
                    .entry(key)
                    .or_default()
                    .insert(habit.to_string(), status);
            }
            None => {
                if let Some(habits) = self.0.get_mut(&key) {
                    habits.remove(habit);
                    if habits.is_empty() {
                        self.0.remove(&key);
                    }
                }
            }
        }
    }

    /// Advance one cell and return its new status.
    pub fn toggle(&mut self, day: u32, habit: &str) -> Option<HabitStatus> {
        let next = HabitStatus::toggle(self.status(day, habit));
        self.set(day, habit, next);
        next
    }

    pub fn stats(&self, habit: &str) -> HabitStats {
        let mut stats = HabitStats::default();
        for status in self.0.values().filter_map(|habits| habits.get(habit)) {
            match status {
                HabitStatus::Completed => stats.completed += 1,
                HabitStatus::Missed => stats.missed += 1,
            }
        }
        let total = stats.completed + stats.missed;
        if total > 0 {
            stats.rate = ((stats.completed as f64 / total as f64) * 100.0).round() as u32;
        }
        stats
    }
}

/// A validated calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    first_day: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .filter(|_| (1000..=9999).contains(&year))
            .map(|first_day| Self { first_day })
            .ok_or_else(|| AppError::Validation(format!("Invalid month {}-{}", year, month)))
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn days(&self) -> u32 {
        let (year, month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }

    /// Collection-relative data file, e.g. `habit-tracker/data/2024-03.json`.
    pub fn data_path(&self) -> String {
        format!("habit-tracker/data/{:04}-{:02}.json", self.year(), self.month())
    }

    /// Human label, e.g. `March 2024`.
    pub fn label(&self) -> String {
        self.first_day.format("%B %Y").to_string()
    }
}

/// Loaded month with the hash to save against.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitMonth {
    pub year: i32,
    pub month: u32,
    pub days: u32,
    pub habits: Vec<String>,
    pub log: HabitLog,
    pub hash: Option<String>,
    pub stats: BTreeMap<String, HabitStats>,
}

/// Request body for saving a month.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHabitsRequest {
    pub log: HabitLog,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Habit logs in the remote repository.
pub struct HabitTracker {
    store: Arc<dyn DocumentStore>,
    prefix: String,
}

impl HabitTracker {
    pub fn new(store: Arc<dyn DocumentStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn remote_path(&self, month: Month) -> String {
        remote_path(&self.prefix, &month.data_path())
    }

    /// The month's log and its hash; an absent file is an empty log with no hash.
    pub async fn load_month(&self, month: Month) -> Result<(HabitLog, Option<String>), AppError> {
        match self.store.read_file(&self.remote_path(month)).await? {
            Some(file) => Ok((HabitLog::from_json(&file.content)?, Some(file.hash))),
            None => Ok((HabitLog::default(), None)),
        }
    }

    /// Persist a month. Without a hash the file is created, with one it is updated.
    /// Returns the new hash.
    pub async fn save_month(
        &self,
        month: Month,
        log: &HabitLog,
        hash: Option<&str>,
    ) -> Result<String, AppError> {
        let path = self.remote_path(month);
        let content = log.to_json()?;

        let new_hash = match hash {
            Some(hash) => {
                let message = format!("Update habit tracker data for {}", month.label());
                self.store.update_file(&path, &content, hash, &message).await?
            }
            None => {
                let message = format!("Create habit tracker data for {}", month.label());
                self.store.create_file(&path, &content, &message).await?
            }
        };

        tracing::info!("Saved habit log {}", path);
        Ok(new_hash)
    }

    pub async fn month_view(&self, month: Month) -> Result<HabitMonth, AppError> {
        let (log, hash) = self.load_month(month).await?;
        let habits: Vec<String> = DEFAULT_HABITS.iter().map(|h| h.to_string()).collect();
        let stats = habits.iter().map(|h| (h.clone(), log.stats(h))).collect();

        Ok(HabitMonth {
            year: month.year(),
            month: month.month(),
            days: month.days(),
            habits,
            log,
            hash,
            stats,
        })
    }
}
