use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gesture::SwipeDirection;
use crate::backend::{DocumentStore, paths, to_fields};
use crate::error::{AppResult, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyResult {
    Remembered,
    Forgot,
}

impl From<SwipeDirection> for StudyResult {
    fn from(direction: SwipeDirection) -> Self {
        match direction {
            SwipeDirection::Right => StudyResult::Remembered,
            SwipeDirection::Left => StudyResult::Forgot,
        }
    }
}

impl From<StudyResult> for SwipeDirection {
    fn from(result: StudyResult) -> Self {
        match result {
            StudyResult::Remembered => SwipeDirection::Right,
            StudyResult::Forgot => SwipeDirection::Left,
        }
    }
}

/// 每次判定写入一条，只写不读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyLogEntry {
    pub card_id: String,
    pub user_id: String,
    pub result: StudyResult,
    pub view_duration_ms: u64,
    #[serde(with = "ts_milliseconds")]
    pub logged_at: DateTime<Utc>,
}

impl StudyLogEntry {
    pub async fn record(&self, store: &dyn DocumentStore, deck_id: &str) -> AppResult<String> {
        let fields = to_fields(self)
            .map_err(|e| StoreError::Unavailable(format!("Failed to encode study log: {}", e)))?;
        let log_id = store.add(&paths::logs(deck_id, &self.card_id), fields).await?;
        tracing::debug!(
            "Logged {:?} for card {} ({} ms)",
            self.result,
            self.card_id,
            self.view_duration_ms
        );
        Ok(log_id)
    }
}
