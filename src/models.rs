use serde::{Deserialize, Deserializer, Serialize};

/// Accepts both the legacy single-string shape and the list shape for
/// `inspectorName`/`workPlace`; everything downstream sees a list.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(value) => vec![value],
        StringOrList::Many(values) => values,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Inspector,
    Supervisor,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Inspector => "inspector",
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_work_places: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub work_place: Option<String>,
    #[serde(default)]
    pub administrative_work_places: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub work_place: Option<String>,
    pub administrative_work_places: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

impl Attachment {
    /// An entry is only usable when both the name and the stored content are
    /// present; anything else is dropped during resolution.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicData {
    pub day: String,
    pub date: String,
    pub time: String,
    #[serde(deserialize_with = "string_or_list")]
    pub inspector_name: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub work_place: Vec<String>,
    pub institution_name: String,
    pub inspection_location: String,
    pub present_pharmacist: String,
    pub inspection_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_work_places: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionItem {
    pub violation: String,
    pub action_taken: String,
    pub responsible: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShortageItem {
    pub item: String,
    pub unit: String,
    pub required_quantity: f64,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StagnantItem {
    pub item: String,
    pub unit: String,
    pub quantity: f64,
    pub expiry_date: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpiredItem {
    pub item: String,
    pub unit: String,
    pub quantity: f64,
    pub expiry_date: String,
    pub attachments: Vec<Attachment>,
}

/// Random inventory rows never carry attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RandomInventoryItem {
    pub item: String,
    pub unit: String,
    pub book_balance: f64,
    pub dispensed: f64,
    pub actual_balance: f64,
    pub shortage: f64,
    pub surplus: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryManagement {
    pub shortages: Vec<ShortageItem>,
    pub stagnant: Vec<StagnantItem>,
    pub expired: Vec<ExpiredItem>,
    pub random_inventory: Vec<RandomInventoryItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionResults {
    pub human_resources: Vec<InspectionItem>,
    pub documents_and_books: Vec<InspectionItem>,
    pub dispensing_policies: Vec<InspectionItem>,
    pub storage_and_health: Vec<InspectionItem>,
    pub inventory_management: InventoryManagement,
    pub security_and_safety: Vec<InspectionItem>,
    pub other_violations: Vec<InspectionItem>,
}

impl InspectionResults {
    /// The six flat categories. Inventory management is shaped differently
    /// and is handled through its own accessors.
    pub fn flat_sections(&self) -> [(&'static str, &Vec<InspectionItem>); 6] {
        [
            ("humanResources", &self.human_resources),
            ("documentsAndBooks", &self.documents_and_books),
            ("dispensingPolicies", &self.dispensing_policies),
            ("storageAndHealth", &self.storage_and_health),
            ("securityAndSafety", &self.security_and_safety),
            ("otherViolations", &self.other_violations),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    pub id: String,
    pub serial_number: String,
    #[serde(default)]
    pub basic_data: BasicData,
    #[serde(default)]
    pub inspection_results: InspectionResults,
    #[serde(default)]
    pub recommendations: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInspectionRecord {
    pub basic_data: BasicData,
    #[serde(default)]
    pub inspection_results: InspectionResults,
    #[serde(default)]
    pub recommendations: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateInspectionRecord {
    pub basic_data: Option<BasicData>,
    pub inspection_results: Option<InspectionResults>,
    pub recommendations: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The seven violation category keys with their display labels.
pub const VIOLATION_CATEGORIES: &[(&str, &str)] = &[
    ("humanResources", "القوة البشرية"),
    ("documentsAndBooks", "الدفاتر والمستندات"),
    ("dispensingPolicies", "سياسات الصرف والقوائم"),
    ("storageAndHealth", "الاشتراطات الصحية والتخزين"),
    ("inventoryManagement", "إدارة المخزون"),
    ("securityAndSafety", "الأمن والسلامة"),
    ("otherViolations", "مخالفات أخرى"),
];

pub fn category_label(key: &str) -> Option<&'static str> {
    VIOLATION_CATEGORIES
        .iter()
        .find(|(category, _)| *category == key)
        .map(|(_, label)| *label)
}

pub fn is_known_category(key: &str) -> bool {
    category_label(key).is_some()
}

pub const PREDEFINED_SUPERVISORY_WORKPLACES: &[&str] = &[
    "إدارة الصيدلة بكفرالشيخ",
    "مركز سيدي غازي",
    "مركز دسوق",
    "مركز سيدي سالم",
    "مركز قلين",
    "مركز فوة",
    "مركز مطوبس",
    "مركز الرياض",
    "مركز الحامول",
    "مركز بيلا",
    "مركز بلطيم",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_data_accepts_legacy_single_string_fields() {
        let raw = r#"{
            "day": "الأحد",
            "date": "2024-03-10",
            "time": "10:30",
            "inspectorName": "أحمد",
            "workPlace": "مركز دسوق",
            "institutionName": "صيدلية النور",
            "inspectionLocation": "دسوق",
            "presentPharmacist": "محمد",
            "inspectionReason": "التفتيش الدوري"
        }"#;

        let parsed: BasicData = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.inspector_name, vec!["أحمد".to_string()]);
        assert_eq!(parsed.work_place, vec!["مركز دسوق".to_string()]);
    }

    #[test]
    fn basic_data_accepts_list_fields() {
        let raw = r#"{
            "inspectorName": ["أحمد", "سارة"],
            "workPlace": ["مركز دسوق", "مركز فوة"]
        }"#;

        let parsed: BasicData = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.inspector_name.len(), 2);
        assert_eq!(parsed.work_place.len(), 2);
    }

    #[test]
    fn record_tolerates_missing_sections() {
        let raw = r#"{"id": "1700000000000", "serialNumber": "INS-1700000000000"}"#;
        let parsed: InspectionRecord = serde_json::from_str(raw).unwrap();
        assert!(parsed.inspection_results.human_resources.is_empty());
        assert!(parsed.recommendations.is_empty());
    }

    #[test]
    fn attachment_validity_requires_name_and_content() {
        let valid = Attachment {
            id: "a".into(),
            name: "report.pdf".into(),
            content: "aGVsbG8=".into(),
            mime_type: "application/pdf".into(),
            size: 5,
        };
        assert!(valid.is_valid());

        let missing_content = Attachment {
            content: "   ".into(),
            ..valid.clone()
        };
        assert!(!missing_content.is_valid());
    }
}
