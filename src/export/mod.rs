pub mod csv;
pub mod html;

use serde::Serialize;

use crate::models::{category_label, InspectionItem, InspectionRecord};

/// Display form of a list-valued basic-data field.
pub fn display_value(values: &[String]) -> String {
    values.join(", ")
}

#[derive(Debug, Clone)]
pub struct ViolationRow {
    pub violation: String,
    pub action_taken: String,
}

fn push_flat(rows: &mut Vec<ViolationRow>, items: &[InspectionItem]) {
    for item in items {
        if item.violation.is_empty() {
            continue;
        }
        rows.push(ViolationRow {
            violation: item.violation.clone(),
            action_taken: if item.action_taken.is_empty() {
                "لم يتم تحديد إجراء".to_string()
            } else {
                item.action_taken.clone()
            },
        });
    }
}

/// Flattens a record into exportable violation rows. The six flat categories
/// contribute their own text; inventory findings are synthesized into
/// narrative rows with standard corrective actions.
pub fn extract_violations(record: &InspectionRecord) -> Vec<ViolationRow> {
    let results = &record.inspection_results;
    let mut rows = Vec::new();

    push_flat(&mut rows, &results.human_resources);
    push_flat(&mut rows, &results.documents_and_books);
    push_flat(&mut rows, &results.dispensing_policies);
    push_flat(&mut rows, &results.storage_and_health);

    let inventory = &results.inventory_management;
    for item in &inventory.shortages {
        rows.push(ViolationRow {
            violation: format!(
                "نقص في المخزون: {} ({} {})",
                item.item, item.required_quantity, item.unit
            ),
            action_taken: "تسجيل النقص والطلب من المورد".to_string(),
        });
    }
    for item in &inventory.stagnant {
        rows.push(ViolationRow {
            violation: format!(
                "أصناف راكدة: {} ({} {}) - انتهاء {}",
                item.item, item.quantity, item.unit, item.expiry_date
            ),
            action_taken: "مراجعة سياسة الطلب وتقليل الكميات".to_string(),
        });
    }
    for item in &inventory.expired {
        rows.push(ViolationRow {
            violation: format!(
                "أصناف منتهية الصلاحية: {} ({} {}) - انتهت {}",
                item.item, item.quantity, item.unit, item.expiry_date
            ),
            action_taken: "إتلاف الأصناف منتهية الصلاحية فوراً".to_string(),
        });
    }
    for item in &inventory.random_inventory {
        if item.shortage > 0.0 {
            rows.push(ViolationRow {
                violation: format!(
                    "عجز في الجرد العشوائي: {} - عجز {} {}",
                    item.item, item.shortage, item.unit
                ),
                action_taken: "تحديد أسباب العجز واتخاذ الإجراءات التصحيحية".to_string(),
            });
        }
        if item.surplus > 0.0 {
            rows.push(ViolationRow {
                violation: format!(
                    "زيادة في الجرد العشوائي: {} - زيادة {} {}",
                    item.item, item.surplus, item.unit
                ),
                action_taken: "مراجعة إجراءات التسجيل والقيد".to_string(),
            });
        }
    }

    push_flat(&mut rows, &results.security_and_safety);
    push_flat(&mut rows, &results.other_violations);

    rows
}

/// Violation count as shown in statistics: the lengths of the six flat
/// category lists. Inventory findings are not counted here.
pub fn violation_count(record: &InspectionRecord) -> usize {
    record
        .inspection_results
        .flat_sections()
        .iter()
        .map(|(_, items)| items.len())
        .sum()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    pub total_records: usize,
    pub total_violations: usize,
    pub top_inspector: String,
}

/// Simple report counters: record total, violation total, and the inspector
/// appearing on the most records (first seen wins a tie).
pub fn statistics(records: &[InspectionRecord]) -> ReportStatistics {
    let total_violations = records.iter().map(violation_count).sum();

    let mut order: Vec<String> = Vec::new();
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for record in records {
        for name in &record.basic_data.inspector_name {
            if !counts.contains_key(name) {
                order.push(name.clone());
            }
            *counts.entry(name.clone()).or_insert(0) += 1;
        }
    }

    let mut top_inspector = "لا يوجد مفتشون".to_string();
    let mut max_records = 0;
    for name in &order {
        let count = counts[name];
        if count > max_records {
            max_records = count;
            top_inspector = name.clone();
        }
    }

    ReportStatistics {
        total_records: records.len(),
        total_violations,
        top_inspector,
    }
}

pub(crate) fn section_title(key: &str) -> String {
    category_label(key).unwrap_or(key).to_string()
}
