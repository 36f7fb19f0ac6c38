use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use glint_locator::prelude::LocatorBuilder;
use glint_provider::prelude::RequestId;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// GLSL source document with `#include` directives spliced in.
///
/// Includes are fetched through the same scheme as the root document and
/// expanded at finalize time. Each fragment is spliced at most once; a cycle
/// fails the load.
#[derive(Default)]
pub struct GlslSourceResource {
    cell: ResourceCell,
    source: RefCell<Option<String>>,
}

impl GlslSourceResource {
    pub fn source(&self) -> Option<String> {
        self.source.borrow().clone()
    }
}

/// Target of an `#include "..."` or `#include <...>` line, if any
fn include_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?.trim_start();
    let (close, rest) = match rest.strip_prefix('"') {
        Some(rest) => ('"', rest),
        None => ('>', rest.strip_prefix('<')?),
    };
    let end = rest.find(close)?;
    Some(&rest[..end])
}

fn include_key(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn expand(
    key: &str,
    sources: &HashMap<String, String>,
    stack: &mut Vec<String>,
    expanded: &mut HashSet<String>,
    out: &mut String,
) -> Result<(), LoadError> {
    if stack.iter().any(|entry| entry == key) {
        return Err(LoadError::IncludeCycle(key.to_string()));
    }
    if !expanded.insert(key.to_string()) {
        return Ok(());
    }
    let Some(content) = sources.get(key) else {
        return Err(LoadError::MissingInclude(key.to_string()));
    };
    stack.push(key.to_string());
    for line in content.lines() {
        match include_target(line) {
            Some(target) => expand(&include_key(target), sources, stack, expanded, out)?,
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    stack.pop();
    Ok(())
}

impl Loadable for GlslSourceResource {
    fn kind(&self) -> &'static str {
        "glsl_source"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(GlslSourceLoadTask {
            resource: self,
            root: params.locator.path().to_string(),
            params: params.clone(),
            pending: HashMap::new(),
            sources: HashMap::new(),
        }))
    }
}

struct GlslSourceLoadTask {
    resource: Rc<GlslSourceResource>,
    params: LoadParams,
    root: String,
    /// Open fetches: request id to include key and partial content
    pending: HashMap<RequestId, (String, BlobAccumulator)>,
    /// Fetched fragments by include key
    sources: HashMap<String, String>,
}

impl LoadTask for GlslSourceLoadTask {
    fn start(
        &mut self,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        let request = requests.fetch(
            self.params.locator.clone(),
            self.params.priority,
            self.params.timeout,
        );
        self.pending
            .insert(request, (self.root.clone(), BlobAccumulator::default()));
        Ok(())
    }

    fn on_event(
        &mut self,
        event: TaskEvent<'_>,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        match event {
            TaskEvent::Chunk {
                request,
                offset,
                data,
            } => {
                if let Some((_, accumulator)) = self.pending.get_mut(&request) {
                    accumulator.append(offset, data)?;
                }
                Ok(())
            }
            TaskEvent::StreamDone { request } => {
                let Some((key, accumulator)) = self.pending.remove(&request) else {
                    return Ok(());
                };
                let content = String::from_utf8(accumulator.into_bytes())
                    .map_err(|_| LoadError::Encoding)?;
                for line in content.lines() {
                    let Some(target) = include_target(line) else {
                        continue;
                    };
                    let key = include_key(target);
                    let already_known = self.sources.contains_key(&key)
                        || self.pending.values().any(|(pending, _)| *pending == key);
                    if already_known {
                        continue;
                    }
                    let locator = LocatorBuilder::new(self.params.locator.scheme())
                        .path(&key)
                        .build()
                        .map_err(|_| LoadError::Parse(format!("bad include path {target:?}")))?;
                    let request =
                        requests.fetch(locator, self.params.priority, self.params.timeout);
                    self.pending
                        .insert(request, (key, BlobAccumulator::default()));
                }
                self.sources.insert(key, content);
                Ok(())
            }
            TaskEvent::DependencyDone { .. } => Ok(()),
        }
    }

    fn finalize(self: Box<Self>, _ctx: &ResourceContext) -> Result<(), LoadError> {
        let task = *self;
        let mut out = String::new();
        let mut stack = Vec::new();
        let mut expanded = HashSet::new();
        expand(&task.root, &task.sources, &mut stack, &mut expanded, &mut out)?;
        *task.resource.source.borrow_mut() = Some(out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_target_forms() {
        assert_eq!(include_target("#include \"/lib/common\""), Some("/lib/common"));
        assert_eq!(include_target("  #include <math>"), Some("math"));
        assert_eq!(include_target("#include\t\"a\""), Some("a"));
        assert_eq!(include_target("// #include nothing"), None);
        assert_eq!(include_target("#include unquoted"), None);
        assert_eq!(include_target("#include \"unterminated"), None);
        assert_eq!(include_target("void main() {}"), None);
    }

    fn sources(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, content)| (key.to_string(), content.to_string()))
            .collect()
    }

    fn expand_root(root: &str, sources: &HashMap<String, String>) -> Result<String, LoadError> {
        let mut out = String::new();
        expand(
            root,
            sources,
            &mut Vec::new(),
            &mut HashSet::new(),
            &mut out,
        )?;
        Ok(out)
    }

    #[test]
    fn test_expand_splices_includes() {
        let sources = sources(&[
            ("/main", "#include \"/lib\"\nvoid main() {}\n"),
            ("/lib", "float ambient();\n"),
        ]);
        assert_eq!(
            expand_root("/main", &sources).unwrap(),
            "float ambient();\nvoid main() {}\n"
        );
    }

    #[test]
    fn test_expand_each_fragment_once() {
        let sources = sources(&[
            ("/main", "#include \"/a\"\n#include \"/b\"\nmain\n"),
            ("/a", "#include \"/shared\"\na\n"),
            ("/b", "#include \"/shared\"\nb\n"),
            ("/shared", "shared\n"),
        ]);
        let out = expand_root("/main", &sources).unwrap();
        assert_eq!(out.matches("shared").count(), 1);
        assert_eq!(out, "shared\na\nb\nmain\n");
    }

    #[test]
    fn test_expand_detects_cycles() {
        let sources = sources(&[
            ("/a", "#include \"/b\"\n"),
            ("/b", "#include \"/a\"\n"),
        ]);
        assert!(matches!(
            expand_root("/a", &sources),
            Err(LoadError::IncludeCycle(_))
        ));
    }

    #[test]
    fn test_expand_missing_fragment() {
        let sources = sources(&[("/a", "#include \"/gone\"\n")]);
        assert!(matches!(
            expand_root("/a", &sources),
            Err(LoadError::MissingInclude(key)) if key == "/gone"
        ));
    }
}
