use crate::io::{MemoryBlobIo, SourceBlobIo};
use crate::provider::ResourceProvider;
use glint_locator::prelude::{Locator, LocatorBuilder};

/// Library of named documents embedded in the process, serving one scheme.
///
/// Documents are addressed by locator path; a `?path=` query argument takes
/// precedence when present, which is how named GLSL include fragments are
/// looked up (`glsl:///Name?path=/include/path`).
pub struct EmbeddedProvider {
    scheme: &'static str,
    documents: Vec<(String, Vec<u8>)>,
}

fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

impl EmbeddedProvider {
    pub fn new(scheme: &'static str) -> Self {
        Self {
            scheme,
            documents: Vec::new(),
        }
    }

    /// Standard text library, including the `txt:///TestText` self-test
    /// document
    pub fn builtin_text() -> Self {
        let mut provider = Self::new("txt");
        provider.add_text_document("/TestText", "Hello, World!");
        provider
    }

    pub fn add_document(&mut self, path: &str, content: Vec<u8>) {
        let path = normalize_path(path);
        match self
            .documents
            .iter_mut()
            .find(|(existing, _)| *existing == path)
        {
            Some((_, existing)) => *existing = content,
            None => self.documents.push((path, content)),
        }
    }

    pub fn add_text_document(&mut self, path: &str, content: &str) {
        self.add_document(path, content.as_bytes().to_vec());
    }

    pub fn with_text_document(mut self, path: &str, content: &str) -> Self {
        self.add_text_document(path, content);
        self
    }

    fn document_key(&self, locator: &Locator) -> Option<String> {
        if !locator.has_scheme(self.scheme) {
            return None;
        }
        match locator.query().decoded_arg_value("path") {
            Some(path) => Some(normalize_path(&path)),
            None => Some(locator.path().to_string()),
        }
    }

    fn lookup(&self, locator: &Locator) -> Option<&[u8]> {
        let key = self.document_key(locator)?;
        self.documents
            .iter()
            .find(|(path, _)| *path == key)
            .map(|(_, content)| content.as_slice())
    }
}

impl ResourceProvider for EmbeddedProvider {
    fn kind(&self) -> &'static str {
        "embedded"
    }

    fn has_resource(&self, locator: &Locator) -> bool {
        self.lookup(locator).is_some()
    }

    fn get_resource_io(&self, locator: &Locator) -> Option<Box<dyn SourceBlobIo>> {
        self.lookup(locator)
            .map(|content| Box::new(MemoryBlobIo::new(content.to_vec())) as Box<dyn SourceBlobIo>)
    }

    fn for_each_locator(&self, callback: &mut dyn FnMut(&Locator)) {
        for (path, _) in &self.documents {
            if let Ok(locator) = LocatorBuilder::new(self.scheme).path(path).build() {
                callback(&locator);
            }
        }
    }
}
