//! The one place fuzzy name/workplace matching lives. Every consumer goes
//! through these helpers instead of re-deriving the containment rules.

/// Case-insensitive substring containment.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Bidirectional containment: either value may be the substring of the other.
pub fn matches(a: &str, b: &str) -> bool {
    contains_ci(a, b) || contains_ci(b, a)
}

/// True when any pair across the two lists matches. Blank entries never match.
pub fn any_match(list_a: &[String], list_b: &[String]) -> bool {
    list_a.iter().any(|a| {
        list_b.iter().any(|b| {
            !a.trim().is_empty() && !b.trim().is_empty() && matches(a.trim(), b.trim())
        })
    })
}

/// Splits a free-text inspector field on the `-` and `/` separators used in
/// legacy data entry, dropping blanks.
pub fn split_names(value: &str) -> Vec<String> {
    value
        .split(['-', '/'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes a record's inspector-name list into individual names.
pub fn parse_inspector_names(values: &[String]) -> Vec<String> {
    values.iter().flat_map(|value| split_names(value)).collect()
}

/// Display form of a list field, matching the stored comma-joined rendering.
pub fn joined(values: &[String]) -> String {
    values.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn containment_is_case_insensitive() {
        assert!(contains_ci("Pharmacy Center", "pharmacy"));
        assert!(!contains_ci("pharmacy", "hospital"));
    }

    #[test]
    fn matches_is_bidirectional() {
        assert!(matches("مركز دسوق", "دسوق"));
        assert!(matches("دسوق", "مركز دسوق"));
        assert!(!matches("مركز فوة", "دسوق"));
    }

    #[test]
    fn any_match_ignores_blank_entries() {
        assert!(!any_match(&list(&["", "  "]), &list(&["", "مركز دسوق"])));
        assert!(any_match(&list(&["مركز دسوق"]), &list(&["دسوق"])));
    }

    #[test]
    fn split_names_handles_both_separators() {
        assert_eq!(split_names("أحمد - سارة/محمد"), list(&["أحمد", "سارة", "محمد"]));
        assert!(split_names("  ").is_empty());
    }

    #[test]
    fn parse_inspector_names_flattens_list_entries() {
        let parsed = parse_inspector_names(&list(&["أحمد - سارة", "محمد"]));
        assert_eq!(parsed, list(&["أحمد", "سارة", "محمد"]));
    }
}
