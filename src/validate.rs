use crate::models::BasicData;

/// Checks the required basic-data fields, returning the human-readable names
/// of whatever is missing. An empty result means the data is complete.
pub fn validate_basic_data(basic: &BasicData) -> Vec<String> {
    let mut errors = Vec::new();

    if basic.day.trim().is_empty() {
        errors.push("اليوم".to_string());
    }
    if basic.date.trim().is_empty() {
        errors.push("التاريخ".to_string());
    }
    if basic.time.trim().is_empty() {
        errors.push("الوقت".to_string());
    }
    if basic
        .inspector_name
        .iter()
        .all(|name| name.trim().is_empty())
    {
        errors.push("اسم المفتش".to_string());
    }
    if basic.work_place.iter().all(|place| place.trim().is_empty()) {
        errors.push("جهة العمل".to_string());
    }
    if basic.institution_name.trim().is_empty() {
        errors.push("اسم المؤسسة".to_string());
    }
    if basic.inspection_location.trim().is_empty() {
        errors.push("مكان التفتيش".to_string());
    }
    if basic.present_pharmacist.trim().is_empty() {
        errors.push("اسم الصيدلي المتواجد".to_string());
    }
    if basic.inspection_reason.trim().is_empty() {
        errors.push("سبب التفتيش".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> BasicData {
        BasicData {
            day: "الأحد".to_string(),
            date: "2024-03-10".to_string(),
            time: "10:30".to_string(),
            inspector_name: vec!["أحمد".to_string()],
            work_place: vec!["مركز دسوق".to_string()],
            institution_name: "صيدلية النور".to_string(),
            inspection_location: "دسوق".to_string(),
            present_pharmacist: "محمد".to_string(),
            inspection_reason: "التفتيش الدوري".to_string(),
            administrative_work_places: None,
        }
    }

    #[test]
    fn complete_data_passes() {
        assert!(validate_basic_data(&complete()).is_empty());
    }

    #[test]
    fn missing_fields_are_reported_by_label() {
        let mut basic = complete();
        basic.day = String::new();
        basic.inspector_name = vec!["  ".to_string()];
        basic.present_pharmacist = String::new();

        let errors = validate_basic_data(&basic);
        assert_eq!(errors, vec!["اليوم", "اسم المفتش", "اسم الصيدلي المتواجد"]);
    }

    #[test]
    fn empty_lists_count_as_missing() {
        let mut basic = complete();
        basic.work_place = Vec::new();
        assert_eq!(validate_basic_data(&basic), vec!["جهة العمل"]);
    }
}
