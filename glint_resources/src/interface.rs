use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::status::{LoadParams, LoadStatus};
use glint_locator::prelude::Locator;
use glint_provider::prelude::{LoadPriority, RequestId};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Load state every resource kind embeds; mutated only by the scheduler
#[derive(Debug, Default)]
pub struct ResourceCell {
    status: Cell<LoadStatus>,
    pending: Cell<RequestId>,
}

impl ResourceCell {
    pub fn status(&self) -> LoadStatus {
        self.status.get()
    }

    pub fn set_status(&self, status: LoadStatus) {
        self.status.set(status);
    }

    /// Request id of the in-flight attempt, invalid otherwise
    pub fn pending(&self) -> RequestId {
        self.pending.get()
    }

    pub fn set_pending(&self, request: RequestId) {
        self.pending.set(request);
    }
}

/// One kind of loadable resource.
///
/// Implementations embed a [`ResourceCell`] and expose their decoded payload
/// through shared accessors; the scheduler drives the state machine and is
/// the only writer of the cell.
pub trait Loadable {
    fn kind(&self) -> &'static str;

    fn cell(&self) -> &ResourceCell;

    /// Builds the task for one load attempt, or `None` when the locator does
    /// not denote this kind of resource
    fn begin_load(
        self: Rc<Self>,
        ctx: &ResourceContext,
        params: &LoadParams,
    ) -> Option<Box<dyn LoadTask>>;

    fn load_status(&self) -> LoadStatus {
        self.cell().status()
    }

    fn is_loaded(&self) -> bool {
        self.load_status().is_loaded()
    }
}

/// Scheduler-side events delivered to a running load task.
///
/// Failures are not delivered; a failed fetch or dependency terminates the
/// whole attempt in the scheduler.
pub enum TaskEvent<'a> {
    Chunk {
        request: RequestId,
        offset: u64,
        data: &'a [u8],
    },
    StreamDone {
        request: RequestId,
    },
    DependencyDone {
        resource: Rc<dyn Loadable>,
    },
}

/// State machine of one load attempt
pub trait LoadTask {
    /// Queues the initial fetches and dependency loads
    fn start(&mut self, ctx: &ResourceContext, requests: &mut TaskRequests)
        -> Result<(), LoadError>;

    /// Feeds one event; may queue follow-up requests
    fn on_event(
        &mut self,
        event: TaskEvent<'_>,
        ctx: &ResourceContext,
        requests: &mut TaskRequests,
    ) -> Result<(), LoadError>;

    /// Builds the payload once every queued request has completed
    fn finalize(self: Box<Self>, ctx: &ResourceContext) -> Result<(), LoadError>;
}

pub(crate) enum TaskRequestItem {
    Fetch {
        request: RequestId,
        locator: Locator,
        priority: LoadPriority,
        timeout: Option<Duration>,
    },
    Dependency {
        resource: Rc<dyn Loadable>,
        params: LoadParams,
    },
}

/// Fetches and dependency loads queued by a task, applied by the scheduler
/// after the task call returns.
///
/// Request ids are allocated here so a task can correlate later events with
/// the fetches it queued.
pub struct TaskRequests {
    next_raw: u64,
    items: Vec<TaskRequestItem>,
}

impl TaskRequests {
    pub(crate) fn new(next_raw: u64) -> Self {
        Self {
            next_raw,
            items: Vec::new(),
        }
    }

    pub fn fetch(
        &mut self,
        locator: Locator,
        priority: LoadPriority,
        timeout: Option<Duration>,
    ) -> RequestId {
        let request = RequestId::from_raw(self.next_raw);
        self.next_raw += 1;
        self.items.push(TaskRequestItem::Fetch {
            request,
            locator,
            priority,
            timeout,
        });
        request
    }

    /// Queues a sub-resource load; completion arrives as
    /// [`TaskEvent::DependencyDone`]
    pub fn load_dependency(&mut self, resource: Rc<dyn Loadable>, params: LoadParams) {
        self.items.push(TaskRequestItem::Dependency { resource, params });
    }

    pub(crate) fn next_raw(&self) -> u64 {
        self.next_raw
    }

    pub(crate) fn take_items(&mut self) -> Vec<TaskRequestItem> {
        std::mem::take(&mut self.items)
    }
}

/// Reassembles a streamed blob from in-order fragments
#[derive(Debug, Default)]
pub struct BlobAccumulator {
    bytes: Vec<u8>,
}

impl BlobAccumulator {
    pub fn append(&mut self, offset: u64, data: &[u8]) -> Result<(), LoadError> {
        if offset != self.bytes.len() as u64 {
            return Err(LoadError::FragmentOrder);
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
