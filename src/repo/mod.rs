pub mod attachments;
pub mod records;
pub mod users;
pub mod violations;

/// Storage keys are kept byte-for-byte compatible with the legacy client so
/// existing data files load unchanged.
pub const RECORDS_KEY: &str = "pharmacy_inspection_records";
pub const USERS_KEY: &str = "pharmacy_users";
pub const VIOLATIONS_KEY: &str = "violationsBySection";

pub fn attachments_key(record_id: &str) -> String {
    format!("attachments_{record_id}")
}
