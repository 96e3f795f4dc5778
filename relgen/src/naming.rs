//! Name derivation helpers shared by graph building and schema derivation.

use heck::ToSnakeCase;

/// Derive a table name from an entity name: snake_case, pluralized with an
/// `s` suffix unless the name already ends in one.
/// e.g. "User" -> "users", "UserProfile" -> "user_profiles", "News" -> "news"
pub fn table_name(entity_name: &str) -> String {
    let mut name = entity_name.to_snake_case();
    if !name.ends_with('s') {
        name.push('s');
    }
    name
}

/// Derive a column name from a field name.
/// e.g. "RoleID" -> "role_id", "CreatedAt" -> "created_at"
pub fn column_name(field_name: &str) -> String {
    field_name.to_snake_case()
}

/// Naive singularization of English words.
pub fn singularize(word: &str) -> String {
    let w = word.to_lowercase();
    if w.ends_with("ies") {
        format!("{}y", &w[..w.len() - 3])
    } else if w.ends_with("ses") || w.ends_with("xes") || w.ends_with("zes") {
        w[..w.len() - 2].to_string()
    } else if w.ends_with("ves") {
        format!("{}f", &w[..w.len() - 3])
    } else if w.ends_with('s') && !w.ends_with("ss") {
        w[..w.len() - 1].to_string()
    } else {
        w
    }
}
