use crate::models::InspectionRecord;

use super::{display_value, extract_violations};

/// Byte-order mark so spreadsheet applications pick up the UTF-8 encoding.
const BOM: &str = "\u{feff}";

const HEADERS: &[&str] = &[
    "رقم المحضر",
    "التاريخ",
    "اليوم",
    "اسم المفتش",
    "جهة العمل",
    "اسم المؤسسة",
    "مكان التفتيش",
    "المخالفات",
    "الإجراءات المتخذة",
];

/// One header row plus one row per record. Array fields are comma-joined,
/// violation and action lists pipe-joined, and every cell quoted.
pub fn records_to_csv(records: &[InspectionRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format_row(HEADERS.iter().map(|h| h.to_string())));

    for record in records {
        let rows = extract_violations(record);
        let violations = if rows.is_empty() {
            "لا توجد مخالفات".to_string()
        } else {
            rows.iter()
                .map(|row| row.violation.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        };
        let actions = if rows.is_empty() {
            "لا توجد إجراءات".to_string()
        } else {
            rows.iter()
                .map(|row| row.action_taken.as_str())
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let basic = &record.basic_data;
        lines.push(format_row(
            [
                record.serial_number.clone(),
                basic.date.clone(),
                basic.day.clone(),
                display_value(&basic.inspector_name),
                display_value(&basic.work_place),
                basic.institution_name.clone(),
                basic.inspection_location.clone(),
                violations,
                actions,
            ]
            .into_iter(),
        ));
    }

    format!("{BOM}{}", lines.join("\n"))
}

fn format_row(cells: impl Iterator<Item = String>) -> String {
    cells
        .map(|cell| quote(&cell))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BasicData, InspectionItem};

    fn record(institution: &str) -> InspectionRecord {
        InspectionRecord {
            id: "1700000000000".to_string(),
            serial_number: "INS-1700000000000".to_string(),
            basic_data: BasicData {
                day: "الأحد".to_string(),
                date: "2024-03-10".to_string(),
                inspector_name: vec!["أحمد".to_string(), "سارة".to_string()],
                work_place: vec!["مركز دسوق".to_string()],
                institution_name: institution.to_string(),
                ..BasicData::default()
            },
            inspection_results: Default::default(),
            recommendations: String::new(),
            created_at: String::new(),
            created_by: String::new(),
        }
    }

    /// Minimal quoted-CSV reader used to verify round-tripping.
    fn parse_line(line: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    cells.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }
        cells.push(current);
        cells
    }

    #[test]
    fn one_header_row_plus_one_row_per_record() {
        let csv = records_to_csv(&[record("صيدلية النور"), record("صيدلية الشفاء")]);
        assert!(csv.starts_with('\u{feff}'));

        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(parse_line(lines[0]).len(), 9);
    }

    #[test]
    fn commas_and_quotes_round_trip() {
        let tricky = r#"صيدلية "النور", فرع دسوق"#;
        let csv = records_to_csv(&[record(tricky)]);
        let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();

        let cells = parse_line(lines[1]);
        assert_eq!(cells[5], tricky);
        assert_eq!(cells[3], "أحمد, سارة");
    }

    #[test]
    fn empty_violation_list_renders_placeholders() {
        let csv = records_to_csv(&[record("صيدلية النور")]);
        assert!(csv.contains("لا توجد مخالفات"));
        assert!(csv.contains("لا توجد إجراءات"));
    }

    #[test]
    fn violations_are_pipe_joined() {
        let mut r = record("صيدلية النور");
        r.inspection_results.human_resources = vec![
            InspectionItem {
                violation: "أولى".to_string(),
                action_taken: "إنذار".to_string(),
                ..InspectionItem::default()
            },
            InspectionItem {
                violation: "ثانية".to_string(),
                action_taken: "غلق".to_string(),
                ..InspectionItem::default()
            },
        ];

        let csv = records_to_csv(&[r]);
        assert!(csv.contains("أولى | ثانية"));
        assert!(csv.contains("إنذار | غلق"));
    }
}
