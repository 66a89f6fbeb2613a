use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use crate::backends::Store;
use crate::common::{Record, StoredRecord};

/// 📦 A store that never forgets. Until the process exits. Then it forgets everything.
///
/// 🔒 The `Arc<Mutex<Vec<StoredRecord>>>` is an existential nesting doll:
/// "I need to share ownership of a list that several batch writes append to at
/// once." The Mutex is load-bearing: it is what keeps sequence ids gapless when
/// three writes land at the same moment.
///
/// Clone-able because tests need to peek inside after handing the store to the
/// pipeline. Every clone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryStore {
    pub(crate) records: Arc<Mutex<Vec<StoredRecord>>>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    /// 🚰 Lock, stamp, push. Sequence ids start at 1 and never repeat.
    async fn insert_many(&self, records: Vec<Record>) -> Result<Vec<u64>> {
        let mut stored = self.records.lock().await;
        let first_seq = stored.len() as u64 + 1;
        let ids: Vec<u64> = (first_seq..first_seq + records.len() as u64).collect();
        stored.extend(
            ids.iter()
                .zip(records)
                .map(|(&seq, record)| StoredRecord { seq, record }),
        );
        trace!("📥 in-memory store swallowed {} records whole", ids.len());
        Ok(ids)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredRecord>> {
        let stored = self.records.lock().await;
        Ok(stored.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> Record {
        Record {
            id,
            firstname: format!("first{id}"),
            lastname: "last".into(),
            email: "e@x.io".into(),
            email2: "e2@x.io".into(),
            profession: "tester".into(),
        }
    }

    #[tokio::test]
    async fn the_one_where_every_record_gets_a_deli_ticket() {
        let store = InMemoryStore::new();
        let first = store.insert_many(vec![record(1), record(2)]).await.unwrap();
        let second = store.insert_many(vec![record(3)]).await.unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![3]);
        assert_eq!(store.records.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn the_one_where_recent_means_newest_first_and_no_more_than_asked() {
        let store = InMemoryStore::new();
        store
            .insert_many((1..=12).map(record).collect())
            .await
            .unwrap();

        let recent = store.recent(10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].seq, 12);
        assert_eq!(recent[0].record.id, 12);
        assert_eq!(recent[9].seq, 3);
    }

    #[tokio::test]
    async fn the_one_where_an_empty_store_has_nothing_recent_to_say() {
        let store = InMemoryStore::new();
        assert!(store.recent(10).await.unwrap().is_empty());
        assert!(store.insert_many(vec![]).await.unwrap().is_empty());
    }
}
