use crate::context::ResourceContext;
use crate::error::LoadError;
use crate::interface::{LoadTask, Loadable, TaskEvent, TaskRequestItem, TaskRequests};
use crate::status::{LoadParams, LoadStatus};
use glint_locator::prelude::Locator;
use glint_provider::driver::default_blob_timeout;
use glint_provider::prelude::{
    BlobEvent, FetchRequest, LoadPriority, ProviderClient, ProviderDriver, ProviderServer,
    RequestId,
};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// One in-flight load attempt, keyed by the request id handed back from
/// [`ResourceLoader::load`]
struct Attempt {
    resource: Rc<dyn Loadable>,
    /// Taken while an event is dispatched into it, restored right after
    task: Option<Box<dyn LoadTask>>,
    /// Open blob transfers plus open dependency loads
    outstanding: u32,
    /// Attempts waiting on this resource as their dependency
    waiters: Vec<RequestId>,
}

struct Transfer {
    attempt: RequestId,
    locator: Locator,
    deadline: Instant,
    /// A caller-specified timeout takes precedence over the one in `Begin`
    explicit_deadline: bool,
}

enum Signal {
    DependencyReady {
        attempt: RequestId,
        resource: Rc<dyn Loadable>,
    },
    DependencyFailed {
        attempt: RequestId,
    },
}

fn provisional_deadline(timeout: Option<Duration>) -> Instant {
    Instant::now() + timeout.unwrap_or_else(|| default_blob_timeout(0))
}

type LoadedCallback = Box<dyn FnMut(&Rc<dyn Loadable>)>;
type FailedCallback = Box<dyn FnMut(&Rc<dyn Loadable>, &LoadError)>;

/// Single-threaded scheduler driving resource load attempts over the
/// provider service.
///
/// All progress happens inside [`update_and_process_all`]; nothing here ever
/// blocks on the service. A resource has at most one attempt in flight, and
/// an attempt completes all-or-nothing: any failed transfer or dependency
/// tears the whole attempt down.
///
/// [`update_and_process_all`]: ResourceLoader::update_and_process_all
pub struct ResourceLoader {
    _server: Option<ProviderServer>,
    client: ProviderClient,
    next_request: u64,
    attempts: HashMap<RequestId, Attempt>,
    transfers: HashMap<RequestId, Transfer>,
    signals: VecDeque<Signal>,
    loaded_callbacks: Vec<LoadedCallback>,
    failed_callbacks: Vec<FailedCallback>,
}

impl ResourceLoader {
    pub fn new(client: ProviderClient) -> Self {
        Self {
            _server: None,
            client,
            next_request: 1,
            attempts: HashMap::new(),
            transfers: HashMap::new(),
            signals: VecDeque::new(),
            loaded_callbacks: Vec::new(),
            failed_callbacks: Vec::new(),
        }
    }

    /// Spawns a private provider service over `driver` and keeps it alive
    /// for the lifetime of the loader
    pub fn with_driver(driver: ProviderDriver) -> anyhow::Result<Self> {
        let (server, client) = ProviderServer::new(driver)?;
        let mut loader = Self::new(client);
        loader._server = Some(server);
        Ok(loader)
    }

    pub fn with_builtin_providers() -> anyhow::Result<Self> {
        Self::with_driver(ProviderDriver::with_builtin_providers())
    }

    pub fn on_loaded(&mut self, callback: impl FnMut(&Rc<dyn Loadable>) + 'static) {
        self.loaded_callbacks.push(Box::new(callback));
    }

    pub fn on_failed(&mut self, callback: impl FnMut(&Rc<dyn Loadable>, &LoadError) + 'static) {
        self.failed_callbacks.push(Box::new(callback));
    }

    pub fn pending_attempts(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_idle(&self) -> bool {
        self.attempts.is_empty() && self.signals.is_empty()
    }

    fn allocate_request(&mut self) -> RequestId {
        let request = RequestId::from_raw(self.next_request);
        self.next_request += 1;
        request
    }

    /// Starts a load attempt, or joins the one already in flight.
    ///
    /// Returns the attempt's request id, invalid when the resource kind
    /// rejects the locator or the attempt cannot start. Terminal statuses
    /// are not retried implicitly; calling this again after a failure is
    /// the explicit retry.
    pub fn load(
        &mut self,
        resource: Rc<dyn Loadable>,
        ctx: &ResourceContext,
        params: &LoadParams,
    ) -> RequestId {
        if resource.load_status() == LoadStatus::Loading {
            let pending = resource.cell().pending();
            if self.attempts.contains_key(&pending) {
                return pending;
            }
        }
        let Some(mut task) = resource.clone().begin_load(ctx, params) else {
            tracing::debug!(
                kind = resource.kind(),
                locator = %params.locator,
                "resource kind rejected locator"
            );
            return RequestId::INVALID;
        };
        let attempt_id = self.allocate_request();
        let mut requests = TaskRequests::new(self.next_request);
        let started = task.start(ctx, &mut requests);
        self.next_request = requests.next_raw();
        if let Err(error) = started {
            tracing::warn!(kind = resource.kind(), %error, "load attempt failed to start");
            resource.cell().set_status(LoadStatus::Failed);
            resource.cell().set_pending(RequestId::INVALID);
            return RequestId::INVALID;
        }
        resource.cell().set_status(LoadStatus::Loading);
        resource.cell().set_pending(attempt_id);
        self.attempts.insert(
            attempt_id,
            Attempt {
                resource,
                task: Some(task),
                outstanding: 0,
                waiters: Vec::new(),
            },
        );
        self.apply_requests(attempt_id, requests, ctx);
        self.maybe_finalize(attempt_id, ctx);
        attempt_id
    }

    /// Like [`load`](Self::load) but leaves already loaded resources alone
    pub fn load_if_needed(
        &mut self,
        resource: Rc<dyn Loadable>,
        ctx: &ResourceContext,
        params: &LoadParams,
    ) -> RequestId {
        if resource.is_loaded() {
            return RequestId::INVALID;
        }
        self.load(resource, ctx, params)
    }

    /// Abandons an in-flight attempt; attempts depending on it are
    /// cancelled as well
    pub fn cancel(&mut self, request: RequestId) {
        self.fail_attempt(request, LoadStatus::Cancelled, LoadError::Cancelled);
    }

    /// Pumps service events, transfer deadlines, and queued dependency
    /// signals. Returns whether anything made progress. Never blocks.
    pub fn update_and_process_all(&mut self, ctx: &ResourceContext) -> bool {
        let mut progressed = false;
        while let Some(event) = self.client.try_recv() {
            progressed = true;
            self.handle_blob_event(event, ctx);
        }
        let now = Instant::now();
        let expired: Vec<RequestId> = self
            .transfers
            .iter()
            .filter(|(_, transfer)| transfer.deadline <= now)
            .map(|(request, _)| *request)
            .collect();
        for request in expired {
            progressed = true;
            self.expire_transfer(request);
        }
        while let Some(signal) = self.signals.pop_front() {
            progressed = true;
            match signal {
                Signal::DependencyReady { attempt, resource } => {
                    self.complete_dependency(attempt, resource, ctx);
                }
                Signal::DependencyFailed { attempt } => {
                    self.fail_attempt(attempt, LoadStatus::Cancelled, LoadError::DependencyFailed);
                }
            }
        }
        progressed
    }

    fn apply_requests(
        &mut self,
        attempt_id: RequestId,
        mut requests: TaskRequests,
        ctx: &ResourceContext,
    ) {
        for item in requests.take_items() {
            match item {
                TaskRequestItem::Fetch {
                    request,
                    locator,
                    priority,
                    timeout,
                } => self.begin_transfer(attempt_id, request, locator, priority, timeout),
                TaskRequestItem::Dependency { resource, params } => {
                    self.begin_dependency(attempt_id, resource, params, ctx);
                }
            }
        }
    }

    fn begin_transfer(
        &mut self,
        attempt_id: RequestId,
        request: RequestId,
        locator: Locator,
        priority: LoadPriority,
        timeout: Option<Duration>,
    ) {
        let Some(attempt) = self.attempts.get_mut(&attempt_id) else {
            return;
        };
        attempt.outstanding += 1;
        self.transfers.insert(
            request,
            Transfer {
                attempt: attempt_id,
                locator: locator.clone(),
                deadline: provisional_deadline(timeout),
                explicit_deadline: timeout.is_some(),
            },
        );
        let fetch = FetchRequest {
            request,
            locator,
            priority,
            timeout,
        };
        if self.client.fetch(fetch).is_err() {
            self.transfers.remove(&request);
            self.fail_attempt(attempt_id, LoadStatus::Failed, LoadError::ServiceStopped);
        }
    }

    fn begin_dependency(
        &mut self,
        attempt_id: RequestId,
        resource: Rc<dyn Loadable>,
        params: LoadParams,
        ctx: &ResourceContext,
    ) {
        {
            let Some(attempt) = self.attempts.get_mut(&attempt_id) else {
                return;
            };
            attempt.outstanding += 1;
        }
        if resource.is_loaded() {
            self.signals.push_back(Signal::DependencyReady {
                attempt: attempt_id,
                resource,
            });
            return;
        }
        let dependency = self.load(resource.clone(), ctx, &params);
        if !dependency.is_valid() {
            self.signals
                .push_back(Signal::DependencyFailed { attempt: attempt_id });
            return;
        }
        match self.attempts.get_mut(&dependency) {
            Some(attempt) => attempt.waiters.push(attempt_id),
            // the dependency settled within the load call
            None if resource.is_loaded() => self.signals.push_back(Signal::DependencyReady {
                attempt: attempt_id,
                resource,
            }),
            None => self
                .signals
                .push_back(Signal::DependencyFailed { attempt: attempt_id }),
        }
    }

    fn handle_blob_event(&mut self, event: BlobEvent, ctx: &ResourceContext) {
        match event {
            BlobEvent::Begin {
                request, timeout, ..
            } => {
                if let Some(transfer) = self.transfers.get_mut(&request) {
                    if !transfer.explicit_deadline {
                        transfer.deadline = Instant::now() + timeout;
                    }
                }
            }
            BlobEvent::Chunk {
                request,
                offset,
                data,
            } => {
                let Some(transfer) = self.transfers.get(&request) else {
                    return;
                };
                let attempt_id = transfer.attempt;
                self.dispatch_event(
                    attempt_id,
                    TaskEvent::Chunk {
                        request,
                        offset,
                        data: &data,
                    },
                    ctx,
                );
            }
            BlobEvent::Done { request } => {
                let Some(transfer) = self.transfers.remove(&request) else {
                    return;
                };
                let attempt_id = transfer.attempt;
                if let Some(attempt) = self.attempts.get_mut(&attempt_id) {
                    attempt.outstanding = attempt.outstanding.saturating_sub(1);
                }
                self.dispatch_event(attempt_id, TaskEvent::StreamDone { request }, ctx);
                self.maybe_finalize(attempt_id, ctx);
            }
            BlobEvent::NotFound { request } => {
                if let Some(transfer) = self.transfers.remove(&request) {
                    tracing::warn!(locator = %transfer.locator, "resource not found");
                    self.fail_attempt(transfer.attempt, LoadStatus::Failed, LoadError::NotFound);
                }
            }
        }
    }

    fn expire_transfer(&mut self, request: RequestId) {
        let Some(transfer) = self.transfers.remove(&request) else {
            return;
        };
        let _ = self.client.cancel(request);
        tracing::warn!(locator = %transfer.locator, "blob transfer timed out");
        self.fail_attempt(transfer.attempt, LoadStatus::Failed, LoadError::Timeout);
    }

    fn dispatch_event(&mut self, attempt_id: RequestId, event: TaskEvent<'_>, ctx: &ResourceContext) {
        let Some(mut task) = self
            .attempts
            .get_mut(&attempt_id)
            .and_then(|attempt| attempt.task.take())
        else {
            return;
        };
        let mut requests = TaskRequests::new(self.next_request);
        let result = task.on_event(event, ctx, &mut requests);
        self.next_request = requests.next_raw();
        if let Some(attempt) = self.attempts.get_mut(&attempt_id) {
            attempt.task = Some(task);
        }
        match result {
            Ok(()) => self.apply_requests(attempt_id, requests, ctx),
            Err(error) => self.fail_attempt(attempt_id, LoadStatus::Failed, error),
        }
    }

    fn complete_dependency(
        &mut self,
        attempt_id: RequestId,
        resource: Rc<dyn Loadable>,
        ctx: &ResourceContext,
    ) {
        let Some(attempt) = self.attempts.get_mut(&attempt_id) else {
            return;
        };
        attempt.outstanding = attempt.outstanding.saturating_sub(1);
        self.dispatch_event(attempt_id, TaskEvent::DependencyDone { resource }, ctx);
        self.maybe_finalize(attempt_id, ctx);
    }

    fn maybe_finalize(&mut self, attempt_id: RequestId, ctx: &ResourceContext) {
        match self.attempts.get(&attempt_id) {
            Some(attempt) if attempt.outstanding == 0 && attempt.task.is_some() => {}
            _ => return,
        }
        let Some(attempt) = self.attempts.remove(&attempt_id) else {
            return;
        };
        let Attempt {
            resource,
            task,
            waiters,
            ..
        } = attempt;
        let Some(task) = task else {
            return;
        };
        match task.finalize(ctx) {
            Ok(()) => {
                resource.cell().set_status(LoadStatus::Loaded);
                resource.cell().set_pending(RequestId::INVALID);
                tracing::debug!(kind = resource.kind(), "resource loaded");
                self.notify_loaded(&resource);
                for waiter in waiters {
                    self.signals.push_back(Signal::DependencyReady {
                        attempt: waiter,
                        resource: resource.clone(),
                    });
                }
            }
            Err(error) => {
                resource.cell().set_status(LoadStatus::Failed);
                resource.cell().set_pending(RequestId::INVALID);
                tracing::warn!(kind = resource.kind(), %error, "resource failed to finalize");
                self.notify_failed(&resource, &error);
                for waiter in waiters {
                    self.signals
                        .push_back(Signal::DependencyFailed { attempt: waiter });
                }
            }
        }
    }

    fn fail_attempt(&mut self, attempt_id: RequestId, status: LoadStatus, error: LoadError) {
        let Some(attempt) = self.attempts.remove(&attempt_id) else {
            return;
        };
        attempt.resource.cell().set_status(status);
        attempt.resource.cell().set_pending(RequestId::INVALID);
        let stale: Vec<RequestId> = self
            .transfers
            .iter()
            .filter(|(_, transfer)| transfer.attempt == attempt_id)
            .map(|(request, _)| *request)
            .collect();
        for request in stale {
            self.transfers.remove(&request);
            let _ = self.client.cancel(request);
        }
        tracing::debug!(
            kind = attempt.resource.kind(),
            status = ?status,
            %error,
            "load attempt ended"
        );
        self.notify_failed(&attempt.resource, &error);
        for waiter in attempt.waiters {
            self.fail_attempt(waiter, LoadStatus::Cancelled, LoadError::DependencyFailed);
        }
    }

    fn notify_loaded(&mut self, resource: &Rc<dyn Loadable>) {
        for callback in &mut self.loaded_callbacks {
            callback(resource);
        }
    }

    fn notify_failed(&mut self, resource: &Rc<dyn Loadable>, error: &LoadError) {
        for callback in &mut self.failed_callbacks {
            callback(resource, error);
        }
    }
}
