//! The message bus and its distributor thread.
//!
//! Producers publish onto an unbounded queue from any thread. A single
//! dedicated thread drains the queue, fans each message out to the links
//! leaving its source, runs the link filters and hands survivors to the
//! destination endpoints.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::runtime::Builder;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::bus::message::Message;
use crate::bus::targeted::TargetedMessage;
use crate::common::{RelayError, Shutdownable};
use crate::routing::RoutingGraph;

/// Minimum time one distribution cycle takes unless configured otherwise.
pub const DEFAULT_CYCLE_FLOOR: Duration = Duration::from_millis(50);

const DISTRIBUTOR_THREAD: &str = "message-distributor";

/// Cloneable handle for publishing messages onto the bus.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Message>,
}

impl Publisher {
    /// Queue `message` for distribution. Never blocks.
    ///
    /// Returns `false` when the bus has shut down and the message was dropped.
    pub fn publish(&self, message: Message) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(mpsc::error::SendError(message)) => {
                debug!(source = message.source(), "Bus is stopped, dropping message");
                false
            }
        }
    }
}

/// Asynchronous fan-out of published messages.
pub struct MessageBus {
    publisher: Publisher,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MessageBus {
    /// Start the distributor thread over `graph`.
    ///
    /// Each cycle takes at least `cycle_floor`, measured from the moment a
    /// message is taken off the queue.
    pub fn start(graph: Arc<RoutingGraph>, cycle_floor: Duration) -> Result<Self, RelayError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let worker = thread::Builder::new()
            .name(DISTRIBUTOR_THREAD.to_string())
            .spawn(move || {
                runtime.block_on(run_distributor(graph, rx, shutdown_rx, cycle_floor));
            })?;

        info!(cycle_floor_ms = cycle_floor.as_millis() as u64, "Message distributor started");

        Ok(Self {
            publisher: Publisher { tx },
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    pub fn publish(&self, message: Message) -> bool {
        self.publisher.publish(message)
    }

    /// Stop the distributor. Queued messages are discarded.
    ///
    /// Waits for the thread to exit unless called from the distributor itself.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            return;
        }
        if worker.join().is_err() {
            warn!("Message distributor thread panicked");
        } else {
            info!("Message distributor stopped");
        }
    }
}

impl Shutdownable for MessageBus {
    fn shutdown(&self) {
        self.stop();
    }
}

impl Drop for MessageBus {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_distributor(
    graph: Arc<RoutingGraph>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
    cycle_floor: Duration,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = shutdown_rx.wait_for(|stop| *stop) => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let started = Instant::now();
        distribute(&graph, message);

        let remaining = cycle_floor.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            tokio::select! {
                biased;
                _ = shutdown_rx.wait_for(|stop| *stop) => break,
                _ = tokio::time::sleep(remaining) => {}
            }
        }
    }
    debug!("Message distributor loop ended");
}

/// Deliver `message` to every resolvable destination of its source.
pub(crate) fn distribute(graph: &RoutingGraph, message: Message) {
    let destinations = graph.destinations_for(message.source());
    if destinations.is_empty() {
        trace!(source = message.source(), "No destinations for message");
        return;
    }

    let message = Arc::new(message);
    for (link, endpoint) in destinations {
        let mut targeted = TargetedMessage::new(message.clone(), endpoint.clone());

        if let Err(e) = endpoint.pre_process(&mut targeted) {
            warn!(endpoint = endpoint.name(), "Unable to preprocess a received message: {}", e);
        }

        link.chain().run(&mut targeted);
        if targeted.is_rejected() {
            trace!(link = %link, "Message rejected by filters");
            continue;
        }

        if let Err(e) = endpoint.receive(&targeted) {
            warn!(endpoint = endpoint.name(), "Unable to deliver a message: {}", e);
        }
    }
}
