//! Background path planning. Requests are queued to a worker thread which runs them one at a
//! time against a shared snapshot of the map; results are collected by polling. A request can
//! be cancelled until its result has been handed out: if the worker has not started on it yet
//! it is skipped, otherwise the finished result is dropped.
use fxhash::{FxBuildHasher, FxHashSet};
use grid_util::Point;
use indexmap::IndexMap;
use log::{debug, warn};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{PlanError, PlanResult};
use crate::grid_map::GridMap;
use crate::solver::{find_path, SearchMode};
use crate::Path;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Identifies one request made to a [PathWorker].
pub type Ticket = u64;

struct PathRequest {
    ticket: Ticket,
    map: Arc<GridMap>,
    start: Point,
    dest: Point,
    mode: SearchMode,
}

struct PathResponse {
    ticket: Ticket,
    result: PlanResult<Path>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingRequest {
    unit: usize,
    start: Point,
    dest: Point,
}

/// A finished request handed back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct PathDelivery {
    pub ticket: Ticket,
    pub unit: usize,
    pub start: Point,
    pub dest: Point,
    pub result: PlanResult<Path>,
}

pub struct PathWorker {
    requests: Option<Sender<PathRequest>>,
    responses: Receiver<PathResponse>,
    pending: FxIndexMap<Ticket, PendingRequest>,
    cancelled: Arc<Mutex<FxHashSet<Ticket>>>,
    next_ticket: Ticket,
    handle: Option<JoinHandle<()>>,
}

fn run(
    requests: Receiver<PathRequest>,
    responses: Sender<PathResponse>,
    cancelled: Arc<Mutex<FxHashSet<Ticket>>>,
) {
    for request in requests {
        let skip = cancelled
            .lock()
            .map(|mut set| set.remove(&request.ticket))
            .unwrap_or(false);
        if skip {
            debug!("Dropping cancelled path request {}", request.ticket);
            continue;
        }
        let result = find_path(&request.map, request.start, request.dest, request.mode);
        let response = PathResponse {
            ticket: request.ticket,
            result,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}

impl PathWorker {
    /// Starts the worker thread.
    pub fn spawn() -> PathWorker {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let cancelled = Arc::new(Mutex::new(FxHashSet::default()));
        let worker_cancelled = Arc::clone(&cancelled);
        let handle = thread::spawn(move || run(request_rx, response_tx, worker_cancelled));
        PathWorker {
            requests: Some(request_tx),
            responses: response_rx,
            pending: FxIndexMap::default(),
            cancelled,
            next_ticket: 0,
            handle: Some(handle),
        }
    }

    /// Queues a search on behalf of `unit`.
    pub fn request(
        &mut self,
        unit: usize,
        map: Arc<GridMap>,
        start: Point,
        dest: Point,
        mode: SearchMode,
    ) -> PlanResult<Ticket> {
        let ticket = self.next_ticket;
        let requests = self.requests.as_ref().ok_or(PlanError::WorkerClosed)?;
        requests
            .send(PathRequest {
                ticket,
                map,
                start,
                dest,
                mode,
            })
            .map_err(|_| PlanError::WorkerClosed)?;
        self.next_ticket += 1;
        self.pending
            .insert(ticket, PendingRequest { unit, start, dest });
        Ok(ticket)
    }

    /// Cancels a request that has not been delivered yet. Returns false if the ticket is
    /// unknown or already delivered.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        if self.pending.shift_remove(&ticket).is_none() {
            return false;
        }
        if let Ok(mut set) = self.cancelled.lock() {
            set.insert(ticket);
        }
        true
    }

    /// Tickets waiting for delivery, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.pending.keys().copied()
    }

    fn deliver(&mut self, response: PathResponse) -> Option<PathDelivery> {
        match self.pending.shift_remove(&response.ticket) {
            Some(PendingRequest { unit, start, dest }) => Some(PathDelivery {
                ticket: response.ticket,
                unit,
                start,
                dest,
                result: response.result,
            }),
            None => {
                // Finished before the cancellation reached the worker
                if let Ok(mut set) = self.cancelled.lock() {
                    set.remove(&response.ticket);
                }
                None
            }
        }
    }

    /// Collects every result that is ready without blocking.
    pub fn poll(&mut self) -> Vec<PathDelivery> {
        let mut deliveries = Vec::new();
        loop {
            match self.responses.try_recv() {
                Ok(response) => deliveries.extend(self.deliver(response)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Path worker disconnected with {} pending", self.pending.len());
                    break;
                }
            }
        }
        deliveries
    }

    /// Blocks until the next pending request is delivered. Returns [None] if nothing is
    /// pending or the worker has stopped.
    pub fn wait(&mut self) -> Option<PathDelivery> {
        while !self.pending.is_empty() {
            let response = self.responses.recv().ok()?;
            if let Some(delivery) = self.deliver(response) {
                return Some(delivery);
            }
        }
        None
    }
}

impl Drop for PathWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Path worker panicked");
            }
        }
    }
}
