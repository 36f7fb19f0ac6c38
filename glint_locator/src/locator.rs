use crate::error::LocatorError;
use crate::query::Query;
use std::fmt;
use std::hash::{Hash, Hasher};

/// URL-like resource identifier: scheme, slash-separated path, query args.
///
/// Immutable once parsed. Equality and hashing go by the normalized string
/// form, so `TXT:///a` and `txt:///a` compare equal.
#[derive(Debug, Clone)]
pub struct Locator {
    text: String,
    scheme: String,
    path: String,
    query: Query,
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.' | '_'))
}

impl Locator {
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(LocatorError::Empty);
        }
        let (scheme, rest) = input
            .split_once("://")
            .ok_or(LocatorError::MissingScheme)?;
        if !is_valid_scheme(scheme) {
            return Err(LocatorError::InvalidScheme);
        }
        let scheme = scheme.to_ascii_lowercase();

        let (path_part, query_part) = match rest.split_once('?') {
            Some((path_part, query_part)) => (path_part, Some(query_part)),
            None => (rest, None),
        };
        if !path_part.starts_with('/') {
            return Err(LocatorError::InvalidPath);
        }
        let mut path = String::with_capacity(path_part.len());
        for segment in path_part.split('/').filter(|segment| !segment.is_empty()) {
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }

        let query = match query_part {
            Some(query_part) => Query::parse(query_part)?,
            None => Query::default(),
        };

        let mut text = String::with_capacity(input.len());
        text.push_str(&scheme);
        text.push_str("://");
        text.push_str(&path);
        query.render_into(&mut text);

        Ok(Self {
            text,
            scheme,
            path,
            query,
        })
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme)
    }

    /// Normalized path, always beginning with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|segment| !segment.is_empty())
    }

    /// Compares against the whole path, with or without the leading slash
    pub fn has_path(&self, path: &str) -> bool {
        self.path == path || self.path.strip_prefix('/') == Some(path)
    }

    pub fn has_path_suffix(&self, suffix: &str) -> bool {
        self.path.ends_with(suffix)
    }

    /// Final path segment, empty when the path is bare `/`
    pub fn path_identifier(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Locator {}

impl Hash for Locator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<&str> for Locator {
    type Error = LocatorError;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        Self::parse(input)
    }
}

impl std::str::FromStr for Locator {
    type Err = LocatorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let loc = Locator::parse("txt:///TestText").unwrap();
        assert_eq!(loc.scheme(), "txt");
        assert_eq!(loc.path(), "/TestText");
        assert_eq!(loc.path_identifier(), "TestText");
        assert!(loc.query().is_empty());
    }

    #[test]
    fn test_parse_with_query() {
        let loc = Locator::parse("eagitex:///CrateColor?size=64&levels=4").unwrap();
        assert!(loc.has_scheme("eagitex"));
        assert!(loc.has_path("/CrateColor"));
        assert!(loc.has_path("CrateColor"));
        assert_eq!(loc.query().arg_value_as::<u32>("size"), Some(64));
        assert_eq!(loc.query().arg_value_as::<u32>("levels"), Some(4));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Locator::parse(""), Err(LocatorError::Empty));
        assert_eq!(Locator::parse("   "), Err(LocatorError::Empty));
        assert_eq!(Locator::parse("no-separator"), Err(LocatorError::MissingScheme));
        assert_eq!(Locator::parse("1txt:///a"), Err(LocatorError::InvalidScheme));
        assert_eq!(Locator::parse("txt://no-slash"), Err(LocatorError::InvalidPath));
        assert_eq!(Locator::parse("txt://"), Err(LocatorError::InvalidPath));
    }

    #[test]
    fn test_scheme_case_normalized() {
        let upper = Locator::parse("TXT:///TestText").unwrap();
        let lower = Locator::parse("txt:///TestText").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.as_str(), "txt:///TestText");
    }

    #[test]
    fn test_path_segments() {
        let loc = Locator::parse("glsl:///shaders//common/lighting").unwrap();
        let segments: Vec<&str> = loc.path_segments().collect();
        assert_eq!(segments, vec!["shaders", "common", "lighting"]);
        assert_eq!(loc.path(), "/shaders/common/lighting");
        assert!(loc.has_path_suffix("lighting"));
        assert!(loc.has_path_suffix("common/lighting"));
        assert_eq!(loc.path_identifier(), "lighting");
    }

    #[test]
    fn test_bare_root_path() {
        let loc = Locator::parse("txt:////").unwrap();
        assert_eq!(loc.path(), "/");
        assert_eq!(loc.path_identifier(), "");
        assert_eq!(loc.path_segments().count(), 0);
    }

    #[test]
    fn test_display_round_trip() {
        let original = "shape:///unit_cube?position=true&normal=true&index";
        let loc = Locator::parse(original).unwrap();
        assert_eq!(loc.to_string(), original);
        assert_eq!(Locator::parse(&loc.to_string()).unwrap(), loc);
    }

    #[test]
    fn test_equality_by_normalized_form() {
        use std::collections::HashSet;
        let a = Locator::parse("eagitexi:///checker?level=0").unwrap();
        let b = Locator::parse("EAGITEXI:///checker?level=0").unwrap();
        let c = Locator::parse("eagitexi:///checker?level=1").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_repeated_accessor_is_pure() {
        let loc = Locator::parse("json:///Program?debug").unwrap();
        let first = loc.as_str().to_string();
        for _ in 0..4 {
            assert_eq!(loc.as_str(), first);
            assert!(loc.query().arg_flag("debug"));
        }
    }
}
