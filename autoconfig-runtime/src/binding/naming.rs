/// Marker character stripped from the front of a field name.
pub const FIELD_MARKER: char = '_';

/// Derives the public accessor name of a field: one leading
/// [`FIELD_MARKER`] is stripped and the first remaining character is
/// uppercased (`_name` and `name` both give `Name`).
pub fn accessor_name(field: &str) -> String {
    let trimmed = field.strip_prefix(FIELD_MARKER).unwrap_or(field);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
