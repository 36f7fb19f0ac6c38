use crate::error::LocatorError;
use crate::percent;
use std::str::FromStr;

/// Ordered multimap of locator query arguments.
///
/// Arguments keep their original order; the same name may appear more than
/// once. A name without `=value` is a bare flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    args: Vec<(String, Option<String>)>,
}

impl Query {
    pub(crate) fn parse(input: &str) -> Result<Self, LocatorError> {
        let mut args = Vec::new();
        for part in input.split('&') {
            if part.is_empty() {
                continue;
            }
            let (name, value) = match part.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (part, None),
            };
            if name.is_empty() {
                return Err(LocatorError::InvalidQuery);
            }
            args.push((name.to_string(), value));
        }
        Ok(Self { args })
    }

    pub(crate) fn from_args(args: Vec<(String, Option<String>)>) -> Self {
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.args
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.args.iter().any(|(arg_name, _)| arg_name == name)
    }

    /// First raw value registered under `name`
    pub fn arg_value(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(arg_name, _)| arg_name == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Every raw value registered under `name`, in order
    pub fn arg_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .iter()
            .filter(move |(arg_name, _)| arg_name == name)
            .filter_map(|(_, value)| value.as_deref())
    }

    /// Parses the first value of `name` as `T`. An absent argument or a value
    /// that fails to parse both yield `None`.
    pub fn arg_value_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.arg_value(name).and_then(|value| value.parse().ok())
    }

    /// `arg_value_as` with a fallback for absent or unparseable values
    pub fn arg_value_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.arg_value_as(name).unwrap_or(default)
    }

    /// First value of `name` with percent-escapes decoded. Invalid escapes
    /// yield `None`.
    pub fn decoded_arg_value(&self, name: &str) -> Option<String> {
        self.arg_value(name).and_then(percent::decode)
    }

    /// First value of `name` when it is a plain identifier (alphanumeric and
    /// underscore, non-empty)
    pub fn arg_identifier(&self, name: &str) -> Option<&str> {
        self.arg_value(name).filter(|value| {
            !value.is_empty()
                && value
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        })
    }

    /// Boolean flag lookup. A missing argument is `false`; a bare argument or
    /// a `true`/`1` value is `true`; anything else is `false`.
    pub fn arg_flag(&self, name: &str) -> bool {
        match self.args.iter().find(|(arg_name, _)| arg_name == name) {
            Some((_, None)) => true,
            Some((_, Some(value))) => value == "true" || value == "1",
            None => false,
        }
    }

    pub(crate) fn render_into(&self, out: &mut String) {
        for (index, (name, value)) in self.args.iter().enumerate() {
            out.push(if index == 0 { '?' } else { '&' });
            out.push_str(name);
            if let Some(value) = value {
                out.push('=');
                out.push_str(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(input: &str) -> Query {
        Query::parse(input).unwrap()
    }

    #[test]
    fn test_parse_empty() {
        let q = query("");
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn test_parse_pairs_and_flags() {
        let q = query("size=64&mipmap&level=0");
        assert_eq!(q.len(), 3);
        assert_eq!(q.arg_value("size"), Some("64"));
        assert_eq!(q.arg_value("mipmap"), None);
        assert!(q.has_arg("mipmap"));
        assert!(!q.has_arg("missing"));
    }

    #[test]
    fn test_parse_empty_name_fails() {
        assert_eq!(Query::parse("=5"), Err(LocatorError::InvalidQuery));
    }

    #[test]
    fn test_order_preserved() {
        let q = query("b=2&a=1&b=3");
        let names: Vec<&str> = q.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_multimap_values() {
        let q = query("attrib=position&attrib=normal");
        let values: Vec<&str> = q.arg_values("attrib").collect();
        assert_eq!(values, vec!["position", "normal"]);
        assert_eq!(q.arg_value("attrib"), Some("position"));
    }

    #[test]
    fn test_typed_lookup() {
        let q = query("size=64&label=wide");
        assert_eq!(q.arg_value_as::<u32>("size"), Some(64));
        assert_eq!(q.arg_value_as::<u32>("label"), None);
        assert_eq!(q.arg_value_as::<u32>("missing"), None);
    }

    #[test]
    fn test_typed_lookup_default() {
        let q = query("size=64&label=wide");
        assert_eq!(q.arg_value_or("size", 1u32), 64);
        assert_eq!(q.arg_value_or("label", 1u32), 1);
        assert_eq!(q.arg_value_or("missing", 7u32), 7);
    }

    #[test]
    fn test_decoded_value() {
        let q = query("title=Hello%2C%20World%21&bad=%zz");
        assert_eq!(q.decoded_arg_value("title").as_deref(), Some("Hello, World!"));
        assert_eq!(q.decoded_arg_value("bad"), None);
    }

    #[test]
    fn test_identifier_value() {
        let q = query("name=unit_cube&odd=a-b&empty=");
        assert_eq!(q.arg_identifier("name"), Some("unit_cube"));
        assert_eq!(q.arg_identifier("odd"), None);
        assert_eq!(q.arg_identifier("empty"), None);
    }

    #[test]
    fn test_flags() {
        let q = query("position&normal=true&uv=1&index=false&weird=yes");
        assert!(q.arg_flag("position"));
        assert!(q.arg_flag("normal"));
        assert!(q.arg_flag("uv"));
        assert!(!q.arg_flag("index"));
        assert!(!q.arg_flag("weird"));
        assert!(!q.arg_flag("missing"));
    }

    #[test]
    fn test_render_round_trip() {
        let q = query("size=64&mipmap&level=0");
        let mut rendered = String::new();
        q.render_into(&mut rendered);
        assert_eq!(rendered, "?size=64&mipmap&level=0");
        assert_eq!(Query::parse(&rendered[1..]).unwrap(), q);
    }
}
