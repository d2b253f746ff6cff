//! Switch controller
//!
//! Receives connection and packet-in notifications for every device and
//! runs one `DeviceSession` per connection on its own task. Notifications
//! for a device are processed one at a time in arrival order; different
//! devices proceed concurrently.

mod trace;

pub use trace::{replay, LogConnection, Trace, TraceEvent};

use crate::config::FlowConfig;
use crate::dataplane::{Connection, DeviceSession, FirewallFilter, SwitchHandler};
use crate::protocol::openflow::{Dpid, PacketIn};
use crate::telemetry::MetricsRegistry;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

enum Command {
    PacketIn(PacketIn),
    /// Acknowledged once every earlier command has been handled
    Sync(oneshot::Sender<()>),
}

struct SessionHandle {
    /// Distinguishes a session from a later one on the same dpid
    id: u64,
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Owner of all device sessions
pub struct Controller {
    firewall: Arc<FirewallFilter>,
    flow: FlowConfig,
    metrics: Arc<MetricsRegistry>,
    sessions: HashMap<Dpid, SessionHandle>,
    next_id: u64,
    lost_tx: mpsc::UnboundedSender<(Dpid, u64)>,
    lost_rx: mpsc::UnboundedReceiver<(Dpid, u64)>,
}

impl Controller {
    pub fn new(firewall: FirewallFilter, flow: FlowConfig, metrics: Arc<MetricsRegistry>) -> Self {
        let (lost_tx, lost_rx) = mpsc::unbounded_channel();
        Self {
            firewall: Arc::new(firewall),
            flow,
            metrics,
            sessions: HashMap::new(),
            next_id: 0,
            lost_tx,
            lost_rx,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Number of devices with a live connection
    pub fn session_count(&self) -> usize {
        self.sessions.values().filter(|h| h.is_live()).count()
    }

    pub fn is_connected(&self, dpid: Dpid) -> bool {
        self.sessions.get(&dpid).is_some_and(SessionHandle::is_live)
    }

    /// Bind a new session to a device connection
    ///
    /// A device reconnecting replaces its previous session, which is drained
    /// and closed first.
    pub async fn connection_up<C>(&mut self, dpid: Dpid, connection: C)
    where
        C: Connection + 'static,
    {
        if self.sessions.contains_key(&dpid) {
            warn!("Device {:016x} reconnected, closing previous session", dpid);
            self.close_session(dpid).await;
        }

        let session = DeviceSession::new(
            dpid,
            connection,
            self.firewall.clone(),
            self.flow,
            self.metrics.clone(),
        );
        let id = self.next_id;
        self.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(session, id, rx, self.lost_tx.clone()));

        self.sessions.insert(dpid, SessionHandle { id, tx, task });
    }

    /// Queue a packet-in for the device's session
    ///
    /// Fails with `ConnectionLost` once the session has ended on a failed
    /// send; the device is forgotten at that point.
    pub fn packet_in(&mut self, dpid: Dpid, event: PacketIn) -> Result<()> {
        let handle = self
            .sessions
            .get(&dpid)
            .ok_or(Error::DeviceNotFound { dpid })?;

        if handle.tx.send(Command::PacketIn(event)).is_err() {
            self.sessions.remove(&dpid);
            return Err(Error::ConnectionLost {
                dpid,
                reason: "session ended".to_string(),
            });
        }
        Ok(())
    }

    /// Close the device's session after its queued packet-ins are handled
    pub async fn connection_down(&mut self, dpid: Dpid) -> Result<()> {
        if !self.sessions.contains_key(&dpid) {
            return Err(Error::DeviceNotFound { dpid });
        }
        self.close_session(dpid).await;
        Ok(())
    }

    /// Wait for a device connection to be lost, forget its session, and
    /// return its dpid
    pub async fn connection_lost(&mut self) -> Option<Dpid> {
        while let Some((dpid, id)) = self.lost_rx.recv().await {
            // Skip reports from sessions already replaced or closed
            if self.sessions.get(&dpid).is_some_and(|h| h.id == id) {
                self.close_session(dpid).await;
                return Some(dpid);
            }
        }
        None
    }

    /// Wait until every packet-in queued so far has been handled
    pub async fn sync(&self) {
        let mut pending = Vec::with_capacity(self.sessions.len());
        for handle in self.sessions.values() {
            let (done_tx, done_rx) = oneshot::channel();
            if handle.tx.send(Command::Sync(done_tx)).is_ok() {
                pending.push(done_rx);
            }
        }
        for done in pending {
            // An ended session drops the sender, which also means drained
            let _ = done.await;
        }
    }

    /// Close every session
    pub async fn shutdown(&mut self) {
        let dpids: Vec<Dpid> = self.sessions.keys().copied().collect();
        for dpid in dpids {
            self.close_session(dpid).await;
        }
    }

    async fn close_session(&mut self, dpid: Dpid) {
        let Some(handle) = self.sessions.remove(&dpid) else {
            return;
        };
        drop(handle.tx);
        if let Err(e) = handle.task.await {
            warn!("Session task for device {:016x} failed: {}", dpid, e);
        }
    }
}

async fn run_session<C: Connection>(
    mut session: DeviceSession<C>,
    id: u64,
    mut rx: mpsc::UnboundedReceiver<Command>,
    lost: mpsc::UnboundedSender<(Dpid, u64)>,
) {
    let dpid = session.dpid();

    while let Some(command) = rx.recv().await {
        let event = match command {
            Command::PacketIn(event) => event,
            Command::Sync(done) => {
                let _ = done.send(());
                continue;
            }
        };

        match session.on_packet_in(event) {
            Ok(handled) => debug!("device {:016x}: {:?}", dpid, handled),
            Err(Error::ConnectionLost { reason, .. }) => {
                warn!("Lost connection to device {:016x}: {}", dpid, reason);
                let _ = lost.send((dpid, id));
                break;
            }
            Err(e) => debug!("device {:016x}: packet-in skipped: {}", dpid, e),
        }
    }

    session.on_connection_closed();
    info!("Session for device {:016x} finished", dpid);
}
