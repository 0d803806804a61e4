//! Field-path navigation over a [`Field`] tree.
//!
//! The path grammar is a sequence of segments: `/name` addresses a map entry,
//! `[i]` a list index, and the empty path (or `/`) the root. Navigation is
//! strict: setting a subfield under a missing parent fails with an
//! "invalid field path" error, intermediate containers are never materialized,
//! and native values are never coerced into containers.

use super::field::Field;
use crate::edgepipe::error::{PipelineError, PipelineResult};

/// One parsed segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `/name` — map or list-map entry
    Name(String),
    /// `[i]` — list index or list-map position
    Index(usize),
}

/// Parse a field-path string into segments. The empty path and `/` both
/// denote the root and parse to an empty segment list.
pub fn parse_field_path(path: &str) -> PipelineResult<Vec<PathSegment>> {
    if path.is_empty() || path == "/" {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '/' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '/' || c == '[' {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    // A bare trailing slash is only valid as the whole path
                    return Err(PipelineError::field_path_error(path, "empty segment name"));
                }
                segments.push(PathSegment::Name(name));
            }
            '[' => {
                chars.next();
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ']' {
                        break;
                    }
                    digits.push(c);
                    chars.next();
                }
                if chars.next() != Some(']') {
                    return Err(PipelineError::field_path_error(path, "unterminated index"));
                }
                let index: usize = digits.parse().map_err(|_| {
                    PipelineError::field_path_error(path, format!("invalid index '{}'", digits))
                })?;
                segments.push(PathSegment::Index(index));
            }
            _ => {
                return Err(PipelineError::field_path_error(
                    path,
                    format!("unexpected character '{}'", ch),
                ));
            }
        }
    }

    Ok(segments)
}

fn child<'a>(field: &'a Field, segment: &PathSegment) -> Option<&'a Field> {
    match (field, segment) {
        (Field::Map(map), PathSegment::Name(name)) => map.get(name),
        (Field::List(list), PathSegment::Index(index)) => list.get(*index),
        (Field::ListMap(map), PathSegment::Name(name)) => {
            // Key lookup first; an all-digit key that is absent falls back to
            // positional lookup
            map.get(name).or_else(|| {
                name.parse::<usize>()
                    .ok()
                    .and_then(|i| map.get_at(i).map(|(_, v)| v))
            })
        }
        (Field::ListMap(map), PathSegment::Index(index)) => map.get_at(*index).map(|(_, v)| v),
        _ => None,
    }
}

fn child_mut<'a>(field: &'a mut Field, segment: &PathSegment) -> Option<&'a mut Field> {
    match (field, segment) {
        (Field::Map(map), PathSegment::Name(name)) => map.get_mut(name),
        (Field::List(list), PathSegment::Index(index)) => list.get_mut(*index),
        (Field::ListMap(map), PathSegment::Name(name)) => {
            if map.contains_key(name) {
                map.get_mut(name)
            } else if let Ok(i) = name.parse::<usize>() {
                map.get_at_mut(i)
            } else {
                None
            }
        }
        (Field::ListMap(map), PathSegment::Index(index)) => map.get_at_mut(*index),
        _ => None,
    }
}

impl Field {
    /// Resolve a field path against this field, returning `None` when any
    /// segment is missing. Navigation never coerces.
    pub fn get_path(&self, path: &str) -> PipelineResult<Option<&Field>> {
        let segments = parse_field_path(path)?;
        let mut current = self;
        for segment in &segments {
            match child(current, segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Set the field at `path`, returning the previous value if one was
    /// replaced. Every parent segment must already exist; setting under a
    /// missing parent or into a non-container fails with an invalid-field-path
    /// error. A list index equal to the list length appends.
    pub fn set_path(&mut self, path: &str, value: Field) -> PipelineResult<Option<Field>> {
        let segments = parse_field_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            // Empty path replaces the root
            return Ok(Some(std::mem::replace(self, value)));
        };

        let mut current = self;
        for segment in parents {
            current = child_mut(current, segment).ok_or_else(|| {
                PipelineError::field_path_error(path, "parent field does not exist")
            })?;
        }

        match (current, last) {
            (Field::Map(map), PathSegment::Name(name)) => Ok(map.insert(name.clone(), value)),
            (Field::ListMap(map), PathSegment::Name(name)) => Ok(map.put(name.clone(), value)),
            (Field::List(list), PathSegment::Index(index)) => {
                if *index < list.len() {
                    Ok(Some(std::mem::replace(&mut list[*index], value)))
                } else if *index == list.len() {
                    list.push(value);
                    Ok(None)
                } else {
                    Err(PipelineError::field_path_error(
                        path,
                        format!("index {} out of bounds for list of {}", index, list.len()),
                    ))
                }
            }
            _ => Err(PipelineError::field_path_error(
                path,
                "parent field is not a container of the addressed kind",
            )),
        }
    }

    /// Delete the field at `path`, returning it if it existed. Deleting a
    /// missing field is not an error.
    pub fn delete_path(&mut self, path: &str) -> PipelineResult<Option<Field>> {
        let segments = parse_field_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(PipelineError::field_path_error(
                path,
                "cannot delete the root field",
            ));
        };

        let mut current = self;
        for segment in parents {
            match child_mut(current, segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        match (current, last) {
            (Field::Map(map), PathSegment::Name(name)) => Ok(map.remove(name)),
            (Field::ListMap(map), PathSegment::Name(name)) => Ok(map.remove(name)),
            (Field::List(list), PathSegment::Index(index)) => {
                if *index < list.len() {
                    Ok(Some(list.remove(*index)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> Field {
        let mut inner = HashMap::new();
        inner.insert("b".to_string(), Field::string("Test Value"));
        let mut root = HashMap::new();
        root.insert("a".to_string(), Field::Map(inner));
        root.insert(
            "list".to_string(),
            Field::List(vec![Field::long(10), Field::long(20)]),
        );
        Field::Map(root)
    }

    #[test]
    fn parses_composed_paths() {
        let segments = parse_field_path("/list[0]/key").unwrap();
        assert_eq!(
            segments,
            vec![
                PathSegment::Name("list".to_string()),
                PathSegment::Index(0),
                PathSegment::Name("key".to_string()),
            ]
        );
    }

    #[test]
    fn root_paths_are_empty() {
        assert!(parse_field_path("").unwrap().is_empty());
        assert!(parse_field_path("/").unwrap().is_empty());
    }

    #[test]
    fn get_resolves_nested_entries() {
        let root = sample();
        let field = root.get_path("/a/b").unwrap().unwrap();
        assert_eq!(field, &Field::string("Test Value"));
        assert_eq!(root.get_path("/list[1]").unwrap(), Some(&Field::long(20)));
        assert_eq!(root.get_path("/a/b/c").unwrap(), None);
    }

    #[test]
    fn set_under_missing_parent_fails() {
        let mut root = sample();
        let err = root.set_path("/missing/child", Field::long(1)).unwrap_err();
        assert!(err.to_string().starts_with("invalid field path"));
    }

    #[test]
    fn set_appends_at_list_end() {
        let mut root = sample();
        root.set_path("/list[2]", Field::long(30)).unwrap();
        assert_eq!(root.get_path("/list[2]").unwrap(), Some(&Field::long(30)));
        assert!(root.set_path("/list[5]", Field::long(99)).is_err());
    }

    #[test]
    fn list_map_supports_positional_lookup() {
        let mut map = crate::edgepipe::record::OrderedMap::new();
        map.put("policyID", Field::string("119736"));
        map.put("statecode", Field::string("FL"));
        let root = Field::ListMap(map);
        assert_eq!(
            root.get_path("/1").unwrap(),
            Some(&Field::string("FL")),
            "absent all-digit key falls back to position"
        );
        assert_eq!(root.get_path("[0]").unwrap(), Some(&Field::string("119736")));
    }

    #[test]
    fn delete_returns_removed_field() {
        let mut root = sample();
        let removed = root.delete_path("/a/b").unwrap();
        assert_eq!(removed, Some(Field::string("Test Value")));
        assert_eq!(root.get_path("/a/b").unwrap(), None);
        assert_eq!(root.delete_path("/a/b").unwrap(), None);
    }
}
