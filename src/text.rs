//! Collection naming helpers
//!
//! Collections are keyed by the plural of their resource type
//! (`scene` -> `scenes`, `inbox` -> `inboxes`, `qr_code` -> `qr_codes`).

/// Resource type name for a collection name
pub fn singularize(collection: &str) -> String {
    if let Some(stem) = collection.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["xes", "ches", "shes", "sses"] {
        if collection.ends_with(suffix) {
            return collection[..collection.len() - 2].to_string();
        }
    }
    match collection.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => collection.to_string(),
    }
}

/// Collection name for a resource type name
pub fn pluralize(resource_type: &str) -> String {
    let ends_with_consonant_y = resource_type.ends_with('y')
        && !resource_type
            .chars()
            .rev()
            .nth(1)
            .map(|c| "aeiou".contains(c))
            .unwrap_or(false);
    if ends_with_consonant_y {
        return format!("{}ies", &resource_type[..resource_type.len() - 1]);
    }
    for suffix in ["x", "ch", "sh", "ss"] {
        if resource_type.ends_with(suffix) {
            return format!("{}es", resource_type);
        }
    }
    format!("{}s", resource_type)
}
