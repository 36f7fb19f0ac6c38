use crate::driver::ProviderDriver;
use crate::error::ProviderError;
use crate::request::{LoadPriority, RequestId};
use anyhow::Result;
use glint_locator::prelude::Locator;
use std::time::Duration;
use tokio::sync::oneshot::error::TryRecvError;

/// Fixed size of one streamed blob fragment
pub const BLOB_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub request: RequestId,
    pub locator: Locator,
    pub priority: LoadPriority,
    /// Overrides the provider/driver timeout when set
    pub timeout: Option<Duration>,
}

#[derive(Debug)]
enum ProviderPacket {
    Fetch(FetchRequest),
    Cancel(RequestId),
}

/// Downstream blob transfer events, per request.
///
/// Chunks of one request arrive in offset order; interleaving across
/// requests is unspecified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobEvent {
    Begin {
        request: RequestId,
        total_size: u64,
        timeout: Duration,
    },
    Chunk {
        request: RequestId,
        offset: u64,
        data: Vec<u8>,
    },
    Done {
        request: RequestId,
    },
    NotFound {
        request: RequestId,
    },
}

/// Consumer endpoint of the provider service
#[derive(Debug)]
pub struct ProviderClient {
    server_send: crossbeam_channel::Sender<ProviderPacket>,
    event_recv: crossbeam_channel::Receiver<BlobEvent>,
}

impl ProviderClient {
    fn new(
        server_send: crossbeam_channel::Sender<ProviderPacket>,
        event_recv: crossbeam_channel::Receiver<BlobEvent>,
    ) -> Self {
        Self {
            server_send,
            event_recv,
        }
    }

    pub fn fetch(&self, request: FetchRequest) -> Result<(), ProviderError> {
        self.server_send
            .send(ProviderPacket::Fetch(request))
            .map_err(|_| ProviderError::ServiceStopped)
    }

    /// Discards the request if it has not been served yet; best effort
    pub fn cancel(&self, request: RequestId) -> Result<(), ProviderError> {
        self.server_send
            .send(ProviderPacket::Cancel(request))
            .map_err(|_| ProviderError::ServiceStopped)
    }

    pub fn try_recv(&self) -> Option<BlobEvent> {
        self.event_recv.try_recv().ok()
    }
}

fn apply_packet(
    driver: &ProviderDriver,
    queue: &mut Vec<(LoadPriority, FetchRequest)>,
    packet: ProviderPacket,
) {
    match packet {
        ProviderPacket::Fetch(fetch) => {
            let priority = driver.get_blob_priority(&fetch.locator, fetch.priority);
            queue.push((priority, fetch));
        }
        ProviderPacket::Cancel(request) => {
            queue.retain(|(_, fetch)| fetch.request != request);
        }
    }
}

/// Highest priority wins; earliest submission wins among equals
fn next_request_index(queue: &[(LoadPriority, FetchRequest)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, (priority, _)) in queue.iter().enumerate() {
        match best {
            Some(best_index) if queue[best_index].0 >= *priority => {}
            _ => best = Some(index),
        }
    }
    best
}

fn serve(
    driver: &ProviderDriver,
    event_send: &crossbeam_channel::Sender<BlobEvent>,
    fetch: FetchRequest,
) -> Result<(), crossbeam_channel::SendError<BlobEvent>> {
    let request = fetch.request;
    let Some(io) = driver.get_resource_io(&fetch.locator) else {
        return event_send.send(BlobEvent::NotFound { request });
    };
    let total_size = io.total_size();
    let timeout = fetch
        .timeout
        .unwrap_or_else(|| driver.get_blob_timeout(&fetch.locator, total_size));
    event_send.send(BlobEvent::Begin {
        request,
        total_size,
        timeout,
    })?;
    let mut buffer = vec![0u8; BLOB_CHUNK_SIZE];
    let mut offset = 0u64;
    while offset < total_size {
        let written = io.fetch_fragment(offset, &mut buffer);
        if written == 0 {
            tracing::warn!("Blob source for {} ended early at {}", fetch.locator, offset);
            break;
        }
        event_send.send(BlobEvent::Chunk {
            request,
            offset,
            data: buffer[..written].to_vec(),
        })?;
        offset += written as u64;
    }
    event_send.send(BlobEvent::Done { request })
}

/// Service thread streaming provider blobs to one [`ProviderClient`].
///
/// Stands in for the out-of-process resource provider service; the consumer
/// shares no memory with it, only the channel messages.
#[derive(Debug)]
pub struct ProviderServer {
    drop_sender: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ProviderServer {
    pub fn new(driver: ProviderDriver) -> Result<(Self, ProviderClient)> {
        let (server_send, server_recv) = crossbeam_channel::unbounded::<ProviderPacket>();
        let (event_send, event_recv) = crossbeam_channel::unbounded::<BlobEvent>();

        let (drop_sender, mut drop_receiver) = tokio::sync::oneshot::channel();
        let thread = std::thread::spawn(move || {
            let mut queue: Vec<(LoadPriority, FetchRequest)> = Vec::new();
            loop {
                match drop_receiver.try_recv() {
                    Ok(_) | Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Empty) => {}
                }
                if queue.is_empty() {
                    match server_recv.recv_timeout(Duration::from_millis(10)) {
                        Ok(packet) => apply_packet(&driver, &mut queue, packet),
                        Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
                    }
                }
                // take cancellations into account before picking the next
                // request to serve
                loop {
                    match server_recv.try_recv() {
                        Ok(packet) => apply_packet(&driver, &mut queue, packet),
                        Err(_) => break,
                    }
                }
                // one request per pass so later cancellations can still pull
                // queued requests
                if let Some(index) = next_request_index(&queue) {
                    let (_, fetch) = queue.remove(index);
                    if serve(&driver, &event_send, fetch).is_err() {
                        break;
                    }
                }
            }
            tracing::trace!("PROVIDER SERVER STOPPED");
        });

        Ok((
            Self {
                thread: Some(thread),
                drop_sender: Some(drop_sender),
            },
            ProviderClient::new(server_send, event_recv),
        ))
    }
}

impl Drop for ProviderServer {
    fn drop(&mut self) {
        tracing::trace!("Dropping provider server");
        if let Some(drop_sender) = self.drop_sender.take() {
            let _ = drop_sender.send(());
        }
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}
