use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::models::{ViolationItem, VIOLATION_CATEGORIES};
use crate::store::KeyValueStore;

use super::VIOLATIONS_KEY;

/// The pre-approved violation catalog, grouped by category key.
pub type ViolationsBySection = BTreeMap<String, Vec<ViolationItem>>;

pub struct ViolationRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ViolationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the catalog, seeding the default entries when the key is absent
    /// or unreadable.
    pub async fn all(&self) -> Result<ViolationsBySection> {
        if let Some(raw) = self.store.get(VIOLATIONS_KEY).await? {
            match serde_json::from_str::<ViolationsBySection>(&raw) {
                Ok(sections) => return Ok(with_all_categories(sections)),
                Err(err) => {
                    warn!(error = %err, "stored violation catalog is unreadable, reseeding defaults");
                }
            }
        }

        let sections = default_violations();
        self.save(&sections).await?;
        Ok(sections)
    }

    async fn save(&self, sections: &ViolationsBySection) -> Result<()> {
        self.store
            .put(VIOLATIONS_KEY, serde_json::to_string(sections)?)
            .await
    }

    pub async fn add(&self, section: &str, title: &str) -> Result<ViolationItem> {
        let mut sections = self.all().await?;
        let now = iso_now();
        let item = ViolationItem {
            id: format!("violation_{}", Uuid::new_v4()),
            title: title.trim().to_string(),
            description: title.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        sections
            .entry(section.to_string())
            .or_default()
            .push(item.clone());
        self.save(&sections).await?;
        Ok(item)
    }

    pub async fn update(
        &self,
        section: &str,
        id: &str,
        title: &str,
    ) -> Result<Option<ViolationItem>> {
        let mut sections = self.all().await?;
        let Some(items) = sections.get_mut(section) else {
            return Ok(None);
        };
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };

        item.title = title.trim().to_string();
        item.description = title.trim().to_string();
        item.updated_at = iso_now();

        let updated = item.clone();
        self.save(&sections).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, section: &str, id: &str) -> Result<bool> {
        let mut sections = self.all().await?;
        let Some(items) = sections.get_mut(section) else {
            return Ok(false);
        };

        let before = items.len();
        items.retain(|item| item.id != id);
        let existed = items.len() != before;
        if existed {
            self.save(&sections).await?;
        }
        Ok(existed)
    }
}

fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Every category key is present in responses, even when empty.
fn with_all_categories(mut sections: ViolationsBySection) -> ViolationsBySection {
    for (key, _) in VIOLATION_CATEGORIES {
        sections.entry(key.to_string()).or_default();
    }
    sections
}

fn seed_item(id: &str, title: &str) -> ViolationItem {
    let now = iso_now();
    ViolationItem {
        id: id.to_string(),
        title: title.to_string(),
        description: title.to_string(),
        created_at: now.clone(),
        updated_at: now,
    }
}

pub fn default_violations() -> ViolationsBySection {
    let mut sections = with_all_categories(BTreeMap::new());
    sections.insert(
        "humanResources".to_string(),
        vec![
            seed_item("1", "عدم وجود صيدلي مسؤول مرخص"),
            seed_item("2", "عدم تواجد الصيدلي المسؤول أثناء ساعات العمل"),
        ],
    );
    sections.insert(
        "documentsAndBooks".to_string(),
        vec![seed_item("3", "عدم وجود دفتر المواعين المستحضرات")],
    );
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn first_load_seeds_defaults_for_all_categories() {
        let repo = ViolationRepository::new(Arc::new(MemoryStore::new()));
        let sections = repo.all().await.unwrap();

        assert_eq!(sections.len(), VIOLATION_CATEGORIES.len());
        assert_eq!(sections["humanResources"].len(), 2);
        assert!(sections["securityAndSafety"].is_empty());
    }

    #[tokio::test]
    async fn add_update_delete_round_trip() {
        let repo = ViolationRepository::new(Arc::new(MemoryStore::new()));

        let added = repo
            .add("dispensingPolicies", "  صرف أدوية بدون روشتة ")
            .await
            .unwrap();
        assert_eq!(added.title, "صرف أدوية بدون روشتة");

        let updated = repo
            .update("dispensingPolicies", &added.id, "صرف مخدرات بدون إذن")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "صرف مخدرات بدون إذن");
        assert_eq!(updated.description, updated.title);

        assert!(repo.delete("dispensingPolicies", &added.id).await.unwrap());
        assert!(!repo.delete("dispensingPolicies", &added.id).await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_catalog_is_reseeded() {
        let store = Arc::new(MemoryStore::new());
        store
            .put(VIOLATIONS_KEY, "broken".to_string())
            .await
            .unwrap();

        let repo = ViolationRepository::new(store);
        let sections = repo.all().await.unwrap();
        assert_eq!(sections["humanResources"].len(), 2);
    }
}
