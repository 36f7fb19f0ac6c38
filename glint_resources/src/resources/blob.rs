use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use std::cell::RefCell;
use std::rc::Rc;

/// Raw byte blob, kept exactly as streamed
#[derive(Default)]
pub struct BlobResource {
    cell: ResourceCell,
    bytes: RefCell<Option<Vec<u8>>>,
}

impl BlobResource {
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.borrow().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Loadable for BlobResource {
    fn kind(&self) -> &'static str {
        "blob"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(BlobLoadTask {
            resource: self,
            params: params.clone(),
            data: BlobAccumulator::default(),
        }))
    }
}

struct BlobLoadTask {
    resource: Rc<BlobResource>,
    params: LoadParams,
    data: BlobAccumulator,
}

impl LoadTask for BlobLoadTask {
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
        *task.resource.bytes.borrow_mut() = Some(task.data.into_bytes());
        Ok(())
    }
}
