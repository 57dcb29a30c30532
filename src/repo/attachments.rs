use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::{Attachment, InspectionRecord};
use crate::store::KeyValueStore;

use super::{attachments_key, RECORDS_KEY};

/// Key name patterns older builds of the client wrote attachments under.
fn legacy_keys(record_id: &str) -> [String; 4] {
    [
        format!("record_{record_id}_attachments"),
        format!("record_attachments_{record_id}"),
        format!("attachments-{record_id}"),
        format!("{record_id}_attachments"),
    ]
}

pub struct AttachmentRepository {
    store: Arc<dyn KeyValueStore>,
}

impl AttachmentRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Locates every attachment for a record, tolerating all three historical
    /// storage layouts. Ordered fallback, stopping at the first non-empty
    /// valid result:
    ///
    /// 1. the canonical `attachments_{id}` key
    /// 2. attachments embedded in the record's violation items, which are
    ///    written back to the canonical key once found
    /// 3. the legacy alternative key names
    ///
    /// "Has attachments" and any count shown to users derive from this
    /// resolution; no counter is stored anywhere.
    pub async fn resolve(&self, record_id: &str) -> Result<Vec<Attachment>> {
        if record_id.trim().is_empty() {
            return Ok(Vec::new());
        }

        let canonical = self.read_key(&attachments_key(record_id)).await?;
        if !canonical.is_empty() {
            return Ok(canonical);
        }

        let embedded = self.collect_embedded(record_id).await?;
        if !embedded.is_empty() {
            debug!(
                record_id,
                count = embedded.len(),
                "caching embedded attachments under the canonical key"
            );
            self.write_canonical(record_id, &embedded).await?;
            return Ok(embedded);
        }

        for key in legacy_keys(record_id) {
            let found = self.read_key(&key).await?;
            if !found.is_empty() {
                debug!(record_id, key = %key, "attachments found under legacy key");
                return Ok(found);
            }
        }

        Ok(Vec::new())
    }

    pub async fn find(&self, record_id: &str, attachment_id: &str) -> Result<Option<Attachment>> {
        Ok(self
            .resolve(record_id)
            .await?
            .into_iter()
            .find(|attachment| attachment.id == attachment_id))
    }

    /// Appends valid entries to whatever resolution currently yields and
    /// writes the combined list to the canonical key, migrating legacy
    /// layouts along the way. Returns the full stored list.
    pub async fn append(
        &self,
        record_id: &str,
        new_entries: Vec<Attachment>,
    ) -> Result<Vec<Attachment>> {
        let mut attachments = self.resolve(record_id).await?;
        attachments.extend(new_entries.into_iter().filter(Attachment::is_valid));
        self.write_canonical(record_id, &attachments).await?;
        Ok(attachments)
    }

    /// One-shot migration: resolves every record and writes the canonical
    /// key, so reads never need the fallback paths again. Returns
    /// (records touched, attachments indexed).
    pub async fn reindex(&self) -> Result<(usize, usize)> {
        let records = self.stored_records().await?;
        let mut touched = 0;
        let mut total = 0;

        for record in &records {
            let attachments = self.resolve(&record.id).await?;
            if !attachments.is_empty() {
                self.write_canonical(&record.id, &attachments).await?;
                touched += 1;
                total += attachments.len();
            }
        }

        Ok((touched, total))
    }

    async fn write_canonical(&self, record_id: &str, attachments: &[Attachment]) -> Result<()> {
        self.store
            .put(&attachments_key(record_id), serde_json::to_string(attachments)?)
            .await
    }

    /// Parses one storage key as an attachment list, dropping invalid
    /// entries. Unreadable values are logged and treated as absent.
    async fn read_key(&self, key: &str) -> Result<Vec<Attachment>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Attachment>>(&raw) {
            Ok(entries) => Ok(entries
                .into_iter()
                .filter(Attachment::is_valid)
                .collect()),
            Err(err) => {
                warn!(key, error = %err, "stored attachment list is unreadable, skipping");
                Ok(Vec::new())
            }
        }
    }

    async fn stored_records(&self) -> Result<Vec<InspectionRecord>> {
        let Some(raw) = self.store.get(RECORDS_KEY).await? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    /// Walks the record's violation items for embedded attachments: the six
    /// flat categories plus the shortages/stagnant/expired inventory lists.
    /// Random inventory rows never carry attachments.
    async fn collect_embedded(&self, record_id: &str) -> Result<Vec<Attachment>> {
        let records = self.stored_records().await?;
        let Some(record) = records.into_iter().find(|record| record.id == record_id) else {
            return Ok(Vec::new());
        };

        Ok(collect_from_record(&record))
    }
}

/// Pure extraction of every valid embedded attachment in a record.
pub fn collect_from_record(record: &InspectionRecord) -> Vec<Attachment> {
    let results = &record.inspection_results;
    let mut found = Vec::new();

    for (_, items) in results.flat_sections() {
        for item in items {
            found.extend(item.attachments.iter().filter(|a| a.is_valid()).cloned());
        }
    }

    let inventory = &results.inventory_management;
    for item in &inventory.shortages {
        found.extend(item.attachments.iter().filter(|a| a.is_valid()).cloned());
    }
    for item in &inventory.stagnant {
        found.extend(item.attachments.iter().filter(|a| a.is_valid()).cloned());
    }
    for item in &inventory.expired {
        found.extend(item.attachments.iter().filter(|a| a.is_valid()).cloned());
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BasicData, InspectionItem, InspectionResults, ShortageItem};
    use crate::store::MemoryStore;

    fn attachment(id: &str, name: &str) -> Attachment {
        Attachment {
            id: id.to_string(),
            name: name.to_string(),
            content: "aGVsbG8=".to_string(),
            mime_type: "text/plain".to_string(),
            size: 5,
        }
    }

    fn record_with_embedded(id: &str) -> InspectionRecord {
        InspectionRecord {
            id: id.to_string(),
            serial_number: format!("INS-{id}"),
            basic_data: BasicData::default(),
            inspection_results: InspectionResults {
                human_resources: vec![InspectionItem {
                    violation: "مخالفة".to_string(),
                    attachments: vec![attachment("a1", "photo.png")],
                    ..InspectionItem::default()
                }],
                inventory_management: crate::models::InventoryManagement {
                    shortages: vec![ShortageItem {
                        item: "أنسولين".to_string(),
                        unit: "عبوة".to_string(),
                        required_quantity: 3.0,
                        attachments: vec![attachment("a2", "invoice.pdf")],
                    }],
                    ..Default::default()
                },
                ..Default::default()
            },
            recommendations: String::new(),
            created_at: String::new(),
            created_by: String::new(),
        }
    }

    async fn store_with_records(records: &[InspectionRecord]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put(RECORDS_KEY, serde_json::to_string(records).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn canonical_key_wins_when_present() {
        let store = store_with_records(&[record_with_embedded("100")]).await;
        store
            .put(
                &attachments_key("100"),
                serde_json::to_string(&[attachment("c1", "canonical.txt")]).unwrap(),
            )
            .await
            .unwrap();

        let repo = AttachmentRepository::new(store);
        let resolved = repo.resolve("100").await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "canonical.txt");
    }

    #[tokio::test]
    async fn embedded_attachments_are_found_and_cached() {
        let store = store_with_records(&[record_with_embedded("200")]).await;
        let repo = AttachmentRepository::new(store.clone());

        let resolved = repo.resolve("200").await.unwrap();
        assert_eq!(resolved.len(), 2);

        // Self-heal: the canonical key now exists with both entries.
        let cached = store.get(&attachments_key("200")).await.unwrap().unwrap();
        let cached: Vec<Attachment> = serde_json::from_str(&cached).unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn legacy_keys_are_probed_last() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "record_300_attachments",
                serde_json::to_string(&[attachment("l1", "legacy.doc")]).unwrap(),
            )
            .await
            .unwrap();

        let repo = AttachmentRepository::new(store);
        let resolved = repo.resolve("300").await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "legacy.doc");
    }

    #[tokio::test]
    async fn invalid_entries_are_dropped_and_fallback_continues() {
        let store = Arc::new(MemoryStore::new());
        // Canonical key holds only entries without content; resolution must
        // keep falling through to the legacy key.
        store
            .put(
                &attachments_key("400"),
                r#"[{"id":"x","name":"broken.txt","content":"","type":"","size":0}]"#.to_string(),
            )
            .await
            .unwrap();
        store
            .put(
                "400_attachments",
                serde_json::to_string(&[attachment("l2", "found.txt")]).unwrap(),
            )
            .await
            .unwrap();

        let repo = AttachmentRepository::new(store);
        let resolved = repo.resolve("400").await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "found.txt");
    }

    #[tokio::test]
    async fn resolve_returns_empty_when_nothing_is_stored() {
        let repo = AttachmentRepository::new(Arc::new(MemoryStore::new()));
        assert!(repo.resolve("500").await.unwrap().is_empty());
        assert!(repo.resolve("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_merges_with_legacy_content() {
        let store = store_with_records(&[record_with_embedded("600")]).await;
        let repo = AttachmentRepository::new(store.clone());

        let stored = repo
            .append("600", vec![attachment("n1", "new.png"), Attachment::default()])
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);

        let resolved = repo.resolve("600").await.unwrap();
        assert_eq!(resolved.len(), 3);
    }

    #[tokio::test]
    async fn reindex_materializes_canonical_keys() {
        let store = store_with_records(&[record_with_embedded("700")]).await;
        let repo = AttachmentRepository::new(store.clone());

        let (touched, total) = repo.reindex().await.unwrap();
        assert_eq!(touched, 1);
        assert_eq!(total, 2);
        assert!(store.get(&attachments_key("700")).await.unwrap().is_some());
    }
}
