use crate::context::ResourceContext;
use crate::error::ResourceError;
use crate::interface::Loadable;
use crate::loader::ResourceLoader;
use crate::status::{LoadParams, LoadStatus};
use glint_provider::prelude::RequestId;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// Identified handle to a managed resource.
///
/// Cloning the handle clones the `Rc`, not the resource; every handle with
/// the same id observes the same load status and payload.
pub struct ManagedResource<T> {
    id: String,
    resource: Rc<T>,
}

impl<T> Clone for ManagedResource<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl<T: Loadable> ManagedResource<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource(&self) -> &Rc<T> {
        &self.resource
    }

    pub fn status(&self) -> LoadStatus {
        self.resource.load_status()
    }

    pub fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }
}

struct ManagedEntry {
    any: Rc<dyn Any>,
    loadable: Rc<dyn Loadable>,
    params: Option<LoadParams>,
    reload_when: Option<Box<dyn Fn() -> bool>>,
}

/// Registry of resources addressed by string identifier.
///
/// The manager owns one instance per id and hands out shared handles;
/// [`update`](Self::update) drives loads for entries that have parameters
/// and are not already loading.
#[derive(Default)]
pub struct ResourceManager {
    entries: HashMap<String, ManagedEntry>,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resource registered under `id`, creating it on first use.
    ///
    /// Asking for the same id with a different concrete type is an error,
    /// the first registration wins.
    pub fn ensure<T>(&mut self, id: &str) -> Result<ManagedResource<T>, ResourceError>
    where
        T: Loadable + Default + 'static,
    {
        if let Some(entry) = self.entries.get(id) {
            let resource = entry
                .any
                .clone()
                .downcast::<T>()
                .map_err(|_| ResourceError::TypeConflict { id: id.to_string() })?;
            return Ok(ManagedResource {
                id: id.to_string(),
                resource,
            });
        }
        let resource = Rc::new(T::default());
        self.entries.insert(
            id.to_string(),
            ManagedEntry {
                any: resource.clone(),
                loadable: resource.clone(),
                params: None,
                reload_when: None,
            },
        );
        Ok(ManagedResource {
            id: id.to_string(),
            resource,
        })
    }

    /// Attaches load parameters to an entry; returns whether the id is known
    pub fn add_parameters(&mut self, id: &str, params: LoadParams) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.params = Some(params);
                true
            }
            None => false,
        }
    }

    /// Installs a predicate that triggers a reload of an already loaded
    /// entry on the next [`update`](Self::update) pass
    pub fn set_reload_when(
        &mut self,
        id: &str,
        condition: impl Fn() -> bool + 'static,
    ) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.reload_when = Some(Box::new(condition));
                true
            }
            None => false,
        }
    }

    /// Drops the entry; handles already handed out keep the resource alive
    pub fn forget(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all_loaded(&self) -> bool {
        self.entries
            .values()
            .all(|entry| entry.loadable.is_loaded())
    }

    /// Starts loads for entries with parameters that want one.
    ///
    /// Created, failed, and cancelled entries are (re)loaded; loaded entries
    /// only when their reload condition says so. Returns whether any load
    /// was started.
    pub fn update(&mut self, loader: &mut ResourceLoader, ctx: &ResourceContext) -> bool {
        let mut started = false;
        for entry in self.entries.values() {
            let Some(params) = &entry.params else {
                continue;
            };
            let wants_load = match entry.loadable.load_status() {
                LoadStatus::Loading => false,
                LoadStatus::Loaded => entry
                    .reload_when
                    .as_ref()
                    .is_some_and(|condition| condition()),
                LoadStatus::Created | LoadStatus::Cancelled | LoadStatus::Failed => true,
            };
            if wants_load {
                started |= loader.load(entry.loadable.clone(), ctx, params) != RequestId::INVALID;
            }
        }
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{TextResource, ValueTreeResource};

    #[test]
    fn test_ensure_returns_shared_instance() {
        let mut manager = ResourceManager::new();
        let first: ManagedResource<TextResource> = manager.ensure("greeting").unwrap();
        let second: ManagedResource<TextResource> = manager.ensure("greeting").unwrap();
        assert!(Rc::ptr_eq(first.resource(), second.resource()));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ensure_rejects_type_conflict() {
        let mut manager = ResourceManager::new();
        let _text: ManagedResource<TextResource> = manager.ensure("greeting").unwrap();
        let conflict = manager.ensure::<ValueTreeResource>("greeting");
        assert!(matches!(
            conflict,
            Err(ResourceError::TypeConflict { id }) if id == "greeting"
        ));
    }

    #[test]
    fn test_forget_removes_entry() {
        let mut manager = ResourceManager::new();
        let handle: ManagedResource<TextResource> = manager.ensure("greeting").unwrap();
        assert!(manager.forget("greeting"));
        assert!(!manager.forget("greeting"));
        assert!(manager.is_empty());
        assert_eq!(handle.status(), LoadStatus::Created);
    }

    #[test]
    fn test_parameters_require_known_id() {
        let mut manager = ResourceManager::new();
        let params = LoadParams::new(
            glint_locator::prelude::Locator::parse("txt:///TestText").unwrap(),
        );
        assert!(!manager.add_parameters("missing", params.clone()));
        let _handle: ManagedResource<TextResource> = manager.ensure("greeting").unwrap();
        assert!(manager.add_parameters("greeting", params));
        assert!(!manager.set_reload_when("missing", || false));
        assert!(manager.set_reload_when("greeting", || false));
    }
}
