use crate::models::{InspectionRecord, InspectionItem, InventoryManagement};

use super::{display_value, extract_violations, section_title};

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "غير محدد".to_string()
    } else {
        escape_html(value)
    }
}

const REPORT_STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  font-family: 'Cairo', Arial, sans-serif;
  direction: rtl;
  text-align: right;
  line-height: 1.6;
  color: #2c3e50;
  background: white;
  font-size: 14px;
}
.record-page { width: 100%; min-height: 100vh; padding: 25mm; background: white; }
.page-header { text-align: center; border-bottom: 2px solid #34495e; padding-bottom: 20px; margin-bottom: 30px; }
.page-header h1 { font-size: 28px; font-weight: 700; margin-bottom: 15px; }
.record-info { display: flex; justify-content: space-between; font-size: 16px; font-weight: 600; color: #34495e; }
.intro-section { background: #f8f9fa; border: 1px solid #dee2e6; border-radius: 5px; padding: 20px; margin: 25px 0; line-height: 1.8; font-size: 15px; text-align: justify; }
.section { margin-bottom: 25px; page-break-inside: avoid; }
.section-title { font-size: 18px; font-weight: 600; margin-bottom: 15px; border-bottom: 2px solid #2c3e50; padding-bottom: 8px; text-align: center; }
.subsection-title { font-size: 14px; font-weight: 600; margin: 15px 0 10px 0; color: #34495e; text-align: center; background: #ecf0f1; padding: 8px; border-radius: 3px; }
.table-container { margin-bottom: 20px; page-break-inside: avoid; }
.print-table { width: 100%; border-collapse: collapse; margin: 10px 0; font-size: 13px; border: 1px solid #bdc3c7; }
.print-table th, .print-table td { border: 1px solid #bdc3c7; padding: 8px; text-align: center; }
.print-table th { background: #34495e; color: white; font-weight: 600; font-size: 12px; }
.print-table tbody tr:nth-child(even) { background: #f8f9fa; }
.random-table th, .random-table td { font-size: 11px; padding: 6px; }
.violation-item { margin-bottom: 15px; border: 1px solid #dee2e6; border-radius: 5px; background: #fafafa; padding: 15px; }
.violation-number { font-size: 16px; font-weight: 600; margin-bottom: 10px; color: #e74c3c; }
.violation-details div { margin: 8px 0; font-size: 14px; }
.no-violations { background: #d5f4e6; border: 1px solid #27ae60; border-radius: 5px; padding: 30px; text-align: center; margin: 30px 0; font-size: 16px; color: #27ae60; font-weight: 600; }
.recommendations-section { background: #fff3cd; border: 1px solid #ffeaa7; border-radius: 5px; padding: 20px; margin: 25px 0; }
.recommendations-section h3 { color: #856404; font-size: 16px; font-weight: 600; text-align: center; margin-bottom: 15px; }
.signatures-section { margin-top: 40px; background: #f8f9fa; border-radius: 5px; padding: 25px; border: 1px solid #dee2e6; }
.signatures-section h3 { font-size: 18px; font-weight: 600; text-align: center; margin-bottom: 25px; }
.signatures-grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 25px; }
.signature-box { text-align: center; background: white; padding: 20px 15px; border-radius: 5px; border: 1px solid #dee2e6; }
.signature-line { height: 2px; background: #2c3e50; margin: 30px 0 10px 0; }
.signature-label { font-size: 12px; font-weight: 600; }
@media print {
  body { margin: 0; padding: 0; font-size: 12px; }
  .record-page { page-break-after: always; padding: 15mm; min-height: auto; }
  .record-page:last-child { page-break-after: avoid; }
  .section, .violation-item, .recommendations-section, .signatures-section { page-break-inside: avoid; }
  .print-table thead { display: table-header-group; }
}
"#;

const TABLE_STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Cairo', Arial, sans-serif; direction: rtl; margin: 20px; font-size: 14px; line-height: 1.6; color: #2c3e50; background: #f8f9fa; }
.container { max-width: 1400px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
.header { background: #34495e; color: white; padding: 25px; text-align: center; }
.header h1 { font-size: 24px; font-weight: 700; margin-bottom: 10px; }
.info-section { background: #ecf0f1; padding: 20px; border-bottom: 2px solid #34495e; }
.info-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; }
.info-item { background: white; padding: 12px 15px; border-radius: 5px; border-left: 3px solid #34495e; }
.info-label { font-weight: 600; color: #7f8c8d; font-size: 12px; margin-bottom: 3px; }
.info-value { font-weight: 700; font-size: 14px; }
.table-container { padding: 20px; overflow-x: auto; }
table { width: 100%; border-collapse: collapse; font-size: 13px; background: white; border: 1px solid #bdc3c7; }
thead { background: #34495e; color: white; }
th { padding: 12px 10px; text-align: center; font-weight: 600; border: 1px solid #2c3e50; }
td { padding: 10px 8px; border: 1px solid #bdc3c7; vertical-align: top; font-size: 12px; }
.row-number { background: #ecf0f1; font-weight: 700; text-align: center; width: 50px; }
.merged-cell { background: #f8f9fa; font-weight: 600; }
.violation-text { text-align: right; max-width: 250px; word-wrap: break-word; color: #e74c3c; font-weight: 500; }
.action-text { text-align: right; max-width: 200px; word-wrap: break-word; color: #27ae60; font-weight: 500; }
.no-violations { text-align: center; color: #27ae60; font-weight: 600; font-style: italic; }
.no-violations-row { background: #d5f4e6; }
.footer { background: #ecf0f1; padding: 15px; text-align: center; border-top: 2px solid #34495e; }
.footer p { color: #7f8c8d; font-size: 12px; margin: 3px 0; }
@media print {
  body { margin: 0; padding: 10px; font-size: 11px; background: white; }
  th, td { padding: 6px 4px; border: 1px solid #000 !important; }
}
"#;

/// The narrative opening of every printed record, interpolating the basic
/// data into the standard formula.
fn intro_paragraph(record: &InspectionRecord) -> String {
    let basic = &record.basic_data;
    let location = if basic.inspection_location.trim().is_empty() {
        String::new()
    } else {
        format!(" <strong>{}</strong>", escape_html(&basic.inspection_location))
    };
    let pharmacist = if basic.present_pharmacist.trim().is_empty() {
        String::new()
    } else {
        format!(
            " وتقابلنا مع <strong>{}</strong>",
            escape_html(&basic.present_pharmacist)
        )
    };
    let reason = if basic.inspection_reason.trim().is_empty() {
        "التفتيش الدوري".to_string()
    } else {
        escape_html(&basic.inspection_reason)
    };

    format!(
        "<p>إنه في يوم <strong>{day}</strong> الموافق <strong>{date}</strong> \
         في تمام الساعة <strong>{time}</strong> قمنا نحن <strong>{inspectors}</strong> \
         من مفتشي <strong>{work_places}</strong> بالمرور على <strong>{institution}</strong>{location}{pharmacist} \
         وكان المرور بناءً على <strong>{reason}</strong>.</p>",
        day = or_unset(&basic.day),
        date = or_unset(&basic.date),
        time = or_unset(&basic.time),
        inspectors = or_unset(&display_value(&basic.inspector_name)),
        work_places = or_unset(&display_value(&basic.work_place)),
        institution = or_unset(&basic.institution_name),
        location = location,
        pharmacist = pharmacist,
        reason = reason,
    )
}

fn flat_section_html(key: &str, items: &[InspectionItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut html = format!(
        r#"<div class="section"><h3 class="section-title">{}</h3>"#,
        section_title(key)
    );
    for (index, item) in items.iter().enumerate() {
        html.push_str(&format!(
            r#"<div class="violation-item">
  <div class="violation-number">المخالفة {number}</div>
  <div class="violation-details">
    <div><strong>المخالفة:</strong> {violation}</div>
    <div><strong>الإجراء المتخذ:</strong> {action}</div>
    <div><strong>المسؤول:</strong> {responsible}</div>
  </div>
</div>"#,
            number = index + 1,
            violation = escape_html(&item.violation),
            action = escape_html(&item.action_taken),
            responsible = escape_html(&item.responsible),
        ));
    }
    html.push_str("</div>");
    html
}

fn inventory_table(title: &str, headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut html = format!(
        r#"<div class="table-container"><h4 class="subsection-title">{title}</h4><table class="print-table{extra}"><thead><tr>"#,
        title = title,
        extra = if headers.len() > 4 { " random-table" } else { "" },
    );
    for header in headers {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}

fn inventory_section_html(inventory: &InventoryManagement) -> String {
    let empty = inventory.shortages.is_empty()
        && inventory.stagnant.is_empty()
        && inventory.expired.is_empty()
        && inventory.random_inventory.is_empty();
    if empty {
        return String::new();
    }

    let mut html =
        r#"<div class="section"><h3 class="section-title">إدارة المخزون</h3>"#.to_string();

    if !inventory.shortages.is_empty() {
        html.push_str(&inventory_table(
            "النواقص",
            &["الصنف", "الوحدة", "الكمية المطلوبة"],
            inventory
                .shortages
                .iter()
                .map(|item| {
                    vec![
                        item.item.clone(),
                        item.unit.clone(),
                        item.required_quantity.to_string(),
                    ]
                })
                .collect(),
        ));
    }

    if !inventory.stagnant.is_empty() {
        html.push_str(&inventory_table(
            "الرواكد",
            &["الصنف", "الوحدة", "الكمية", "تاريخ الانتهاء"],
            inventory
                .stagnant
                .iter()
                .map(|item| {
                    vec![
                        item.item.clone(),
                        item.unit.clone(),
                        item.quantity.to_string(),
                        item.expiry_date.clone(),
                    ]
                })
                .collect(),
        ));
    }

    if !inventory.expired.is_empty() {
        html.push_str(&inventory_table(
            "منتهي الصلاحية",
            &["الصنف", "الوحدة", "الكمية", "تاريخ الانتهاء"],
            inventory
                .expired
                .iter()
                .map(|item| {
                    vec![
                        item.item.clone(),
                        item.unit.clone(),
                        item.quantity.to_string(),
                        item.expiry_date.clone(),
                    ]
                })
                .collect(),
        ));
    }

    if !inventory.random_inventory.is_empty() {
        html.push_str(&inventory_table(
            "الجرد العشوائي",
            &[
                "الصنف",
                "الوحدة",
                "رصيد الدفتر",
                "المصروف",
                "الرصيد الفعلي",
                "العجز",
                "الزيادة",
            ],
            inventory
                .random_inventory
                .iter()
                .map(|item| {
                    vec![
                        item.item.clone(),
                        item.unit.clone(),
                        item.book_balance.to_string(),
                        item.dispensed.to_string(),
                        item.actual_balance.to_string(),
                        item.shortage.to_string(),
                        item.surplus.to_string(),
                    ]
                })
                .collect(),
        ));
    }

    html.push_str("</div>");
    html
}

/// Violation sections in report order: the four leading flat categories,
/// inventory management, then security and the catch-all.
fn violations_html(record: &InspectionRecord) -> String {
    let results = &record.inspection_results;
    let mut html = String::new();

    html.push_str(&flat_section_html("humanResources", &results.human_resources));
    html.push_str(&flat_section_html(
        "documentsAndBooks",
        &results.documents_and_books,
    ));
    html.push_str(&flat_section_html(
        "dispensingPolicies",
        &results.dispensing_policies,
    ));
    html.push_str(&flat_section_html(
        "storageAndHealth",
        &results.storage_and_health,
    ));
    html.push_str(&inventory_section_html(&results.inventory_management));
    html.push_str(&flat_section_html(
        "securityAndSafety",
        &results.security_and_safety,
    ));
    html.push_str(&flat_section_html("otherViolations", &results.other_violations));

    if html.is_empty() {
        r#"<div class="no-violations">لا توجد مخالفات مسجلة في هذا المحضر</div>"#.to_string()
    } else {
        html
    }
}

fn signatures_html() -> &'static str {
    r#"<div class="signatures-section">
  <h3>التواقيع</h3>
  <div class="signatures-grid">
    <div class="signature-box"><div class="signature-line"></div><div class="signature-label">توقيع المفتش</div></div>
    <div class="signature-box"><div class="signature-line"></div><div class="signature-label">توقيع مدير التفتيش الصيدلي</div></div>
    <div class="signature-box"><div class="signature-line"></div><div class="signature-label">توقيع مدير إدارة الصيدلة</div></div>
  </div>
</div>"#
}

fn record_page(record: &InspectionRecord) -> String {
    let recommendations = if record.recommendations.trim().is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="recommendations-section"><h3>التوصيات</h3><div>{}</div></div>"#,
            escape_html(&record.recommendations)
        )
    };

    format!(
        r#"<div class="record-page">
  <div class="page-header">
    <h1>محضر تفتيش صيدلي</h1>
    <div class="record-info">
      <div>رقم المحضر: {serial}</div>
      <div>التاريخ: {date}</div>
    </div>
  </div>
  <div class="intro-section">{intro}</div>
  <div class="content-section">{violations}</div>
  {recommendations}
  {signatures}
</div>"#,
        serial = escape_html(&record.serial_number),
        date = or_unset(&record.basic_data.date),
        intro = intro_paragraph(record),
        violations = violations_html(record),
        recommendations = recommendations,
        signatures = signatures_html(),
    )
}

/// One complete printable document, one page per record, in the layout the
/// print and PDF paths share.
pub fn record_report_document(records: &[InspectionRecord]) -> String {
    let pages: String = records.iter().map(record_page).collect();

    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
<meta charset="UTF-8">
<title>محاضر التفتيش الصيدلي</title>
<link href="https://fonts.googleapis.com/css2?family=Cairo:wght@400;600;700&display=swap" rel="stylesheet">
<style>{style}</style>
</head>
<body>
{pages}
</body>
</html>"#,
        style = REPORT_STYLE,
        pages = pages,
    )
}

/// Tabular variant: one row per violation, record columns grouped with
/// rowspans; records without violations render a single placeholder row.
pub fn table_report_document(records: &[InspectionRecord], generated_at: &str) -> String {
    let mut rows = String::new();

    for (record_index, record) in records.iter().enumerate() {
        let row_number = record_index + 1;
        let basic = &record.basic_data;
        let violations = extract_violations(record);

        if violations.is_empty() {
            rows.push_str(&format!(
                r#"<tr class="no-violations-row">
  <td class="row-number">{number}</td>
  <td>{institution}</td>
  <td>{location}</td>
  <td>{date}</td>
  <td>{inspectors}</td>
  <td>{work_places}</td>
  <td class="no-violations">لا توجد مخالفات</td>
  <td class="no-violations">-</td>
  <td></td>
</tr>"#,
                number = row_number,
                institution = escape_html(&basic.institution_name),
                location = escape_html(&basic.inspection_location),
                date = escape_html(&basic.date),
                inspectors = escape_html(&display_value(&basic.inspector_name)),
                work_places = escape_html(&display_value(&basic.work_place)),
            ));
            continue;
        }

        let span = violations.len();
        for (index, violation) in violations.iter().enumerate() {
            let merged = if index == 0 {
                format!(
                    r#"<td rowspan="{span}" class="row-number merged-cell">{number}</td>
  <td rowspan="{span}" class="merged-cell">{institution}</td>
  <td rowspan="{span}" class="merged-cell">{location}</td>
  <td rowspan="{span}" class="merged-cell">{date}</td>
  <td rowspan="{span}" class="merged-cell">{inspectors}</td>
  <td rowspan="{span}" class="merged-cell">{work_places}</td>"#,
                    span = span,
                    number = row_number,
                    institution = escape_html(&basic.institution_name),
                    location = escape_html(&basic.inspection_location),
                    date = escape_html(&basic.date),
                    inspectors = escape_html(&display_value(&basic.inspector_name)),
                    work_places = escape_html(&display_value(&basic.work_place)),
                )
            } else {
                String::new()
            };

            rows.push_str(&format!(
                r#"<tr class="violation-row">
  {merged}
  <td class="violation-text">{violation}</td>
  <td class="action-text">{action}</td>
  <td></td>
</tr>"#,
                merged = merged,
                violation = escape_html(&violation.violation),
                action = escape_html(&violation.action_taken),
            ));
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html dir="rtl" lang="ar">
<head>
<meta charset="UTF-8">
<title>تقرير محاضر التفتيش - جدول</title>
<link href="https://fonts.googleapis.com/css2?family=Cairo:wght@400;600;700&display=swap" rel="stylesheet">
<style>{style}</style>
</head>
<body>
<div class="container">
  <div class="header">
    <h1>تقرير محاضر التفتيش الصيدلي</h1>
    <div class="subtitle">إدارة الصيدلة - مديرية الصحة بكفر الشيخ</div>
  </div>
  <div class="info-section">
    <div class="info-grid">
      <div class="info-item"><div class="info-label">تاريخ التقرير</div><div class="info-value">{generated_at}</div></div>
      <div class="info-item"><div class="info-label">عدد المحاضر</div><div class="info-value">{count} محضر</div></div>
      <div class="info-item"><div class="info-label">نوع التقرير</div><div class="info-value">جدول تفصيلي</div></div>
    </div>
  </div>
  <div class="table-container">
    <table>
      <thead>
        <tr>
          <th>م</th>
          <th>اسم المؤسسة</th>
          <th>مكان التفتيش</th>
          <th>التاريخ</th>
          <th>اسم المفتش</th>
          <th>جهة العمل</th>
          <th>المخالفة</th>
          <th>الإجراء المتخذ</th>
          <th>ملاحظات</th>
        </tr>
      </thead>
      <tbody>
        {rows}
      </tbody>
    </table>
  </div>
  <div class="footer">
    <p class="generation-time">تم إنشاء هذا التقرير في: {generated_at}</p>
    <p>نظام إدارة محاضر التفتيش الصيدلي - إدارة الصيدلة بكفر الشيخ</p>
  </div>
</div>
</body>
</html>"#,
        style = TABLE_STYLE,
        generated_at = escape_html(generated_at),
        count = records.len(),
        rows = rows,
    )
}
