//! Completed-booking records.
//!
//! One JSON blob per date under `booking:<date>`; last write wins. History
//! walks the last N calendar days and filters to the requesting email; N is
//! a few weeks at most, so the O(N) scan is fine.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{BOOKING_NAMESPACE, KvStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub court: String,
    pub time: String,
    pub date: String,
    pub subject_email: String,
    pub completed_at: DateTime<Utc>,
    pub status: String,
}

pub struct BookingRecordStore {
    store: Arc<dyn KvStore>,
}

impl BookingRecordStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Upsert the record for its date. No merge.
    pub async fn save(&self, record: &BookingRecord) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.store
            .put(&format!("{BOOKING_NAMESPACE}{}", record.date), value)
            .await
    }

    /// Records from the last `lookback_days` calendar days that belong to
    /// `subject_email`, newest first.
    pub async fn history(
        &self,
        subject_email: &str,
        lookback_days: u64,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let today = Utc::now().date_naive();
        let mut records = Vec::new();

        for offset in 0..lookback_days {
            let Some(day) = today.checked_sub_days(Days::new(offset)) else {
                break;
            };
            if let Some(record) = self.lookup(day).await? {
                if record.subject_email == subject_email {
                    records.push(record);
                }
            }
        }

        Ok(records)
    }

    async fn lookup(&self, date: NaiveDate) -> Result<Option<BookingRecord>, StoreError> {
        let key = format!("{BOOKING_NAMESPACE}{date}");
        match self.store.get(&key).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    tracing::warn!(key, "Skipping unreadable booking record: {e}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn record(date: &str, email: &str) -> BookingRecord {
        BookingRecord {
            court: "Alice Marble".to_string(),
            time: "2:00 PM".to_string(),
            date: date.to_string(),
            subject_email: email.to_string(),
            completed_at: Utc::now(),
            status: "confirmed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_history_is_scoped_to_owner() {
        let records = BookingRecordStore::new(Arc::new(MemoryStore::new()));
        let today = Utc::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        records.save(&record(&today.to_string(), "a@b.com")).await.unwrap();
        records
            .save(&record(&yesterday.to_string(), "c@d.com"))
            .await
            .unwrap();

        let mine = records.history("a@b.com", 30).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].date, today.to_string());
        assert_eq!(mine[0].subject_email, "a@b.com");
    }

    #[tokio::test]
    async fn test_history_respects_lookback() {
        let records = BookingRecordStore::new(Arc::new(MemoryStore::new()));
        let old = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(10))
            .unwrap();
        records.save(&record(&old.to_string(), "a@b.com")).await.unwrap();

        assert!(records.history("a@b.com", 5).await.unwrap().is_empty());
        assert_eq!(records.history("a@b.com", 30).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_last_write_wins() {
        let records = BookingRecordStore::new(Arc::new(MemoryStore::new()));
        let today = Utc::now().date_naive().to_string();

        records.save(&record(&today, "a@b.com")).await.unwrap();
        let mut second = record(&today, "a@b.com");
        second.time = "4:00 PM".to_string();
        records.save(&second).await.unwrap();

        let history = records.history("a@b.com", 2).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].time, "4:00 PM");
    }
}
