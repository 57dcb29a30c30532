use serde::Deserialize;

use crate::matching::{any_match, contains_ci, joined, parse_inspector_names, split_names};
use crate::models::{InspectionRecord, Role, User};

/// Selecting this sentinel in the inspectors facet disables inspector
/// filtering entirely.
pub const ALL_INSPECTORS: &str = "الكل";

/// The search facets a caller may combine. Absent or empty fields mean "no
/// restriction"; a filter never fails a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub date_from: String,
    pub date_to: String,
    pub inspector_name: String,
    pub selected_inspectors: Vec<String>,
    pub selected_work_places: Vec<String>,
    pub institution_name: String,
    pub inspection_location: String,
    pub violation_text: String,
    pub inventory_type: String,
}

/// The "my records" rule: the record's joined inspector names must contain
/// the user's name as a substring. Deliberately loose — a name that is a
/// substring of another inspector's name will also match.
pub fn is_my_record(record: &InspectionRecord, user_name: &str) -> bool {
    if user_name.trim().is_empty() {
        return false;
    }
    contains_ci(&joined(&record.basic_data.inspector_name), user_name)
}

/// The workplaces that scope a supervisor's or manager's view: an explicit
/// selection wins, then the administrative workplaces, then (supervisors
/// only) the home workplace. Managers with nothing configured see everything.
pub fn effective_work_places(user: &User, filters: &SearchFilters) -> Vec<String> {
    if !filters.selected_work_places.is_empty() {
        return filters.selected_work_places.clone();
    }

    let administrative = user
        .administrative_work_places
        .clone()
        .unwrap_or_default();

    match user.role {
        Role::Supervisor => {
            if !administrative.is_empty() {
                administrative
            } else if let Some(work_place) = &user.work_place {
                vec![work_place.clone()]
            } else {
                Vec::new()
            }
        }
        Role::Manager => administrative,
        Role::Inspector => Vec::new(),
    }
}

/// Supervisor/manager report views stay empty until at least one workplace is
/// selected. A UX guard, not a security boundary.
pub fn should_show_data(user: &User, my_records_view: bool, filters: &SearchFilters) -> bool {
    my_records_view || user.role == Role::Inspector || !filters.selected_work_places.is_empty()
}

/// The unified filter resolver: role scoping first, then an AND-chain of the
/// explicit facets. A record survives only if every active predicate passes.
pub fn visible_records(
    records: &[InspectionRecord],
    user: &User,
    my_records_view: bool,
    filters: &SearchFilters,
) -> Vec<InspectionRecord> {
    records
        .iter()
        .filter(|record| record_visible(record, user, my_records_view, filters))
        .cloned()
        .collect()
}

fn record_visible(
    record: &InspectionRecord,
    user: &User,
    my_records_view: bool,
    filters: &SearchFilters,
) -> bool {
    if my_records_view || user.role == Role::Inspector {
        if !is_my_record(record, &user.name) {
            return false;
        }
    } else {
        let work_places = effective_work_places(user, filters);
        if !work_places.is_empty() && !any_match(&record.basic_data.work_place, &work_places) {
            return false;
        }

        if !filters.selected_inspectors.is_empty()
            && !filters
                .selected_inspectors
                .iter()
                .any(|selected| selected == ALL_INSPECTORS)
        {
            let record_names = parse_inspector_names(&record.basic_data.inspector_name);
            if !any_match(&record_names, &filters.selected_inspectors) {
                return false;
            }
        }
    }

    passes_field_filters(record, filters)
}

fn passes_field_filters(record: &InspectionRecord, filters: &SearchFilters) -> bool {
    let basic = &record.basic_data;

    // ISO date strings compare correctly as plain strings.
    if !filters.date_from.is_empty() && basic.date.as_str() < filters.date_from.as_str() {
        return false;
    }
    if !filters.date_to.is_empty() && basic.date.as_str() > filters.date_to.as_str() {
        return false;
    }

    if !filters.inspector_name.trim().is_empty() {
        let record_names = parse_inspector_names(&basic.inspector_name);
        let search_names = split_names(&filters.inspector_name);
        let matched = search_names.iter().any(|search| {
            record_names
                .iter()
                .any(|name| contains_ci(name, search))
        });
        if !matched {
            return false;
        }
    }

    if !filters.institution_name.trim().is_empty()
        && !contains_ci(&basic.institution_name, &filters.institution_name)
    {
        return false;
    }

    if !filters.inspection_location.trim().is_empty()
        && !contains_ci(&basic.inspection_location, &filters.inspection_location)
    {
        return false;
    }

    if !filters.violation_text.trim().is_empty()
        && !matches_violation_text(record, &filters.violation_text)
    {
        return false;
    }

    if !filters.inventory_type.trim().is_empty()
        && !matches_inventory_type(record, &filters.inventory_type)
    {
        return false;
    }

    true
}

/// Searches violation text across the six flat categories and the item names
/// of the inventory section.
pub fn matches_violation_text(record: &InspectionRecord, text: &str) -> bool {
    let results = &record.inspection_results;

    let in_flat_sections = results
        .flat_sections()
        .iter()
        .any(|(_, items)| items.iter().any(|item| contains_ci(&item.violation, text)));

    in_flat_sections || matches_inventory_type(record, text)
}

/// Searches item names across all four inventory sub-lists.
pub fn matches_inventory_type(record: &InspectionRecord, text: &str) -> bool {
    let inventory = &record.inspection_results.inventory_management;

    inventory
        .shortages
        .iter()
        .map(|item| item.item.as_str())
        .chain(inventory.stagnant.iter().map(|item| item.item.as_str()))
        .chain(inventory.expired.iter().map(|item| item.item.as_str()))
        .chain(
            inventory
                .random_inventory
                .iter()
                .map(|item| item.item.as_str()),
        )
        .any(|item| contains_ci(item, text))
}
