use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{
    BlobAccumulator, LoadTask, Loadable, ResourceCell, TaskEvent, TaskRequests,
};
use crate::status::LoadParams;
use std::cell::RefCell;
use std::rc::Rc;

/// UTF-8 text document
#[derive(Default)]
pub struct TextResource {
    cell: ResourceCell,
    text: RefCell<Option<String>>,
}

impl TextResource {
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl Loadable for TextResource {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn cell(&self) -> &ResourceCell {
        &self.cell
    }

    fn begin_load(
        self: Rc<Self>,
        _ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>> {
        Some(Box::new(TextLoadTask {
            resource: self,
            params: params.clone(),
            data: BlobAccumulator::default(),
        }))
    }
}

struct TextLoadTask {
    resource: Rc<TextResource>,
    params: LoadParams,
    data: BlobAccumulator,
}

impl LoadTask for TextLoadTask {
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
        let text = String::from_utf8(task.data.into_bytes()).map_err(|_| LoadError::Encoding)?;
        *task.resource.text.borrow_mut() = Some(text);
        Ok(())
    }
}
