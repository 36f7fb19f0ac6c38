use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::rc::Rc;

/// JSON document bound straight onto a typed value
pub struct MappedResource<T> {
    cell: ResourceCell,
    value: RefCell<Option<T>>,
}

impl<T> Default for MappedResource<T> {
    fn default() -> Self {
        Self {
            cell: ResourceCell::default(),
            value: RefCell::new(None),
        }
    }
}

impl<T: Clone> MappedResource<T> {
    pub fn value(&self) -> Option<T> {
        self.value.borrow().clone()
    }
}

impl<T: DeserializeOwned + 'static> Loadable for MappedResource<T> {
    fn kind(&self) -> &'static str {
        "mapped"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(MappedLoadTask {
            resource: self,
            params: params.clone(),
            data: BlobAccumulator::default(),
        }))
    }
}

struct MappedLoadTask<T> {
    resource: Rc<MappedResource<T>>,
    params: LoadParams,
    data: BlobAccumulator,
}

impl<T: DeserializeOwned + 'static> LoadTask for MappedLoadTask<T> {
    fn start(
        &mut self,
        _ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        requests.fetch(
            self.params.locator.clone(),
            self.params.priority,
            self.params.timeout,
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        event: TaskEvent<'_>,
        _ctx: &ResourceContext,
        _requests: &mut TaskRequests,
    ) -> Result<(), LoadError> {
        match event {
            TaskEvent::Chunk { offset, data, .. } => self.data.append(offset, data),
            _ => Ok(()),
        }
    }

    fn finalize(self: Box<Self>, _ctx: &ResourceContext) -> Result<(), LoadError> {
        let task = *self;
        let value: T = serde_json::from_slice(task.data.bytes())
            .map_err(|error| LoadError::Parse(error.to_string()))?;
        *task.resource.value.borrow_mut() = Some(value);
        Ok(())
    }
}
