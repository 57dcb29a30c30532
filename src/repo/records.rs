use std::sync::Arc;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::filters::{visible_records, SearchFilters};
use crate::models::{InspectionRecord, NewInspectionRecord, UpdateInspectionRecord, User};
use crate::store::KeyValueStore;

use super::{attachments_key, RECORDS_KEY};

pub struct RecordRepository {
    store: Arc<dyn KeyValueStore>,
}

impl RecordRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the full record list, most-recent first. A missing key is an
    /// empty list; an unparsable one is treated the same and logged, never
    /// surfaced as an error.
    pub async fn list(&self) -> Result<Vec<InspectionRecord>> {
        let Some(raw) = self.store.get(RECORDS_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!(error = %err, "stored record list is unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, records: &[InspectionRecord]) -> Result<()> {
        self.store
            .put(RECORDS_KEY, serde_json::to_string(records)?)
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<InspectionRecord>> {
        Ok(self.list().await?.into_iter().find(|record| record.id == id))
    }

    /// Creates a record with a millisecond-timestamp id and an `INS-` serial
    /// derived from it, prepended so the list stays most-recent first.
    pub async fn create(
        &self,
        new: NewInspectionRecord,
        created_by: &str,
    ) -> Result<InspectionRecord> {
        let mut records = self.list().await?;

        let mut timestamp = Utc::now().timestamp_millis();
        while records.iter().any(|record| record.id == timestamp.to_string()) {
            timestamp += 1;
        }

        let record = InspectionRecord {
            id: timestamp.to_string(),
            serial_number: format!("INS-{timestamp}"),
            basic_data: new.basic_data,
            inspection_results: new.inspection_results,
            recommendations: new.recommendations,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            created_by: created_by.to_string(),
        };

        records.insert(0, record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    /// Shallow merge: present sections replace wholesale, absent ones are
    /// left untouched.
    pub async fn update(
        &self,
        id: &str,
        updates: UpdateInspectionRecord,
    ) -> Result<Option<InspectionRecord>> {
        let mut records = self.list().await?;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };

        if let Some(basic_data) = updates.basic_data {
            record.basic_data = basic_data;
        }
        if let Some(inspection_results) = updates.inspection_results {
            record.inspection_results = inspection_results;
        }
        if let Some(recommendations) = updates.recommendations {
            record.recommendations = recommendations;
        }

        let updated = record.clone();
        self.save(&records).await?;
        Ok(Some(updated))
    }

    /// Removes the record and cascades: the canonical attachments key goes,
    /// and so does every other store key containing the record id as a
    /// substring (the legacy layouts left related data under ad-hoc keys).
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.list().await?;
        let before = records.len();
        records.retain(|record| record.id != id);
        let existed = records.len() != before;

        if existed {
            self.save(&records).await?;
            info!(record_id = %id, remaining = records.len(), "record deleted");
        }

        self.store.remove(&attachments_key(id)).await?;
        for key in self.store.keys().await? {
            if key.contains(id) {
                self.store.remove(&key).await?;
            }
        }

        Ok(existed)
    }

    /// Role-scoped search over the stored list; the single filter resolver
    /// is the only implementation of the predicate chain.
    pub async fn search(
        &self,
        user: &User,
        my_records_view: bool,
        filters: &SearchFilters,
    ) -> Result<Vec<InspectionRecord>> {
        let records = self.list().await?;
        Ok(visible_records(&records, user, my_records_view, filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BasicData;
    use crate::store::MemoryStore;

    fn new_record(inspector: &str) -> NewInspectionRecord {
        NewInspectionRecord {
            basic_data: BasicData {
                date: "2024-03-10".to_string(),
                inspector_name: vec![inspector.to_string()],
                work_place: vec!["مركز دسوق".to_string()],
                ..BasicData::default()
            },
            inspection_results: Default::default(),
            recommendations: String::new(),
        }
    }

    fn repo() -> RecordRepository {
        RecordRepository::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn create_assigns_timestamp_id_and_prepends() {
        let repo = repo();
        let first = repo.create(new_record("أحمد"), "أحمد").await.unwrap();
        let second = repo.create(new_record("سارة"), "سارة").await.unwrap();

        assert!(first.serial_number.starts_with("INS-"));
        assert_eq!(first.serial_number, format!("INS-{}", first.id));
        assert_ne!(first.id, second.id);

        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second.id);
    }

    #[tokio::test]
    async fn update_merges_only_present_fields() {
        let repo = repo();
        let record = repo.create(new_record("أحمد"), "أحمد").await.unwrap();

        let updated = repo
            .update(
                &record.id,
                UpdateInspectionRecord {
                    recommendations: Some("متابعة".to_string()),
                    ..UpdateInspectionRecord::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.recommendations, "متابعة");
        assert_eq!(updated.basic_data.inspector_name, vec!["أحمد".to_string()]);
    }

    #[tokio::test]
    async fn delete_sweeps_keys_containing_the_record_id() {
        let store = Arc::new(MemoryStore::new());
        let repo = RecordRepository::new(store.clone());
        let record = repo.create(new_record("أحمد"), "أحمد").await.unwrap();

        store
            .put(&attachments_key(&record.id), "[]".to_string())
            .await
            .unwrap();
        store
            .put(&format!("notes_{}", record.id), "{}".to_string())
            .await
            .unwrap();

        assert!(repo.delete(&record.id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
        assert_eq!(
            store.get(&attachments_key(&record.id)).await.unwrap(),
            None
        );
        assert_eq!(
            store.get(&format!("notes_{}", record.id)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unreadable_record_list_is_treated_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(RECORDS_KEY, "not json".to_string())
            .await
            .unwrap();

        let repo = RecordRepository::new(store);
        assert!(repo.list().await.unwrap().is_empty());
    }
}
