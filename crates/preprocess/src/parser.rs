use crate::schema::Entity;

/// Parse `"Name (TYPE)"` display strings back into entities.
///
/// The split happens on the last opening parenthesis, so names that contain
/// parentheses themselves keep them. Blank strings are skipped and strings
/// without a type suffix get the `Unknown` type.
pub fn parse_entities<S: AsRef<str>>(raw: &[S]) -> Vec<Entity> {
    raw.iter()
        .filter_map(|s| parse_entity(s.as_ref()))
        .collect()
}

/// Parse a single display string. Returns `None` for blank input.
pub fn parse_entity(raw: &str) -> Option<Entity> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some((name, entity_type)) = trimmed.rsplit_once('(') else {
        return Some(Entity::unknown(trimmed));
    };

    let name = name.trim();
    let entity_type = entity_type.trim_matches(|c: char| c == ')' || c.is_whitespace());

    // "(PERSON)" has nothing to name, keep it whole
    if name.is_empty() {
        return Some(Entity::unknown(trimmed));
    }

    if entity_type.is_empty() {
        return Some(Entity::unknown(name));
    }

    Some(Entity::new(name, entity_type))
}
