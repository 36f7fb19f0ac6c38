use crate::error::LocatorError;
use crate::locator::Locator;
use crate::percent;
use std::fmt::Display;

/// Composes a [`Locator`] from parts, percent-encoding where required.
///
/// Providers use this to emit synthetic nested locators, e.g. a texture
/// header referencing per-level pixel images. `build` parses the rendered
/// string, so a built locator is always exactly re-parseable.
#[derive(Debug, Clone, Default)]
pub struct LocatorBuilder {
    scheme: String,
    segments: Vec<String>,
    args: Vec<(String, Option<String>)>,
}

impl LocatorBuilder {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            segments: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn path_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Splits `path` on `/` and appends each non-empty segment
    pub fn path(mut self, path: &str) -> Self {
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            self.segments.push(segment.to_string());
        }
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.args.push((name.into(), Some(value.to_string())));
        self
    }

    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.args.push((name.into(), None));
        self
    }

    pub fn build(self) -> Result<Locator, LocatorError> {
        let mut text = String::new();
        text.push_str(&self.scheme);
        text.push_str("://");
        if self.segments.is_empty() {
            text.push('/');
        }
        for segment in &self.segments {
            text.push('/');
            text.push_str(&percent::encode(segment));
        }
        for (index, (name, value)) in self.args.iter().enumerate() {
            text.push(if index == 0 { '?' } else { '&' });
            text.push_str(&percent::encode(name));
            if let Some(value) = value {
                text.push('=');
                text.push_str(&percent::encode(value));
            }
        }
        Locator::parse(&text)
    }
}
