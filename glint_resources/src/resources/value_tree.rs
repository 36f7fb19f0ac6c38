use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use std::cell::RefCell;
use std::rc::Rc;

/// Parsed JSON document kept as a dynamic value tree
#[derive(Default)]
pub struct ValueTreeResource {
    cell: ResourceCell,
    value: RefCell<Option<serde_json::Value>>,
}

impl ValueTreeResource {
    pub fn value(&self) -> Option<serde_json::Value> {
        self.value.borrow().clone()
    }
}

impl Loadable for ValueTreeResource {
    fn kind(&self) -> &'static str {
        "value_tree"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(ValueTreeLoadTask {
            resource: self,
            params: params.clone(),
            data: BlobAccumulator::default(),
        }))
    }
}

struct ValueTreeLoadTask {
    resource: Rc<ValueTreeResource>,
    params: LoadParams,
    data: BlobAccumulator,
}

impl LoadTask for ValueTreeLoadTask {
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
        let value = serde_json::from_slice(task.data.bytes())
            .map_err(|error| LoadError::Parse(error.to_string()))?;
        *task.resource.value.borrow_mut() = Some(value);
        Ok(())
    }
}
