//! Client side of the relay.
//!
//! [`RelayClient`] is what a host (or a viewer written in Rust) holds to
//! talk to its room. It is the engine's [`Channel`] and, through
//! `catalogAppend`, its [`AbilityCatalog`].
//!
//! One supervisor task owns the socket. When the relay goes away it keeps
//! re-dialing on a fixed delay and swaps the new socket in behind every
//! clone of the client. The inbound event stream survives the swap.
//! Watch [`connections`](RelayClient::connections) to learn when a fresh
//! connection is up and membership has to be announced again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faceoff_match::{AbilityCatalog, CatalogError, Channel, SendOutcome};
use faceoff_protocol::{
    CatalogAppend, CatalogResult, ChannelEvent, Codec, JoinRoom, JsonCodec, MatchId, Role,
};
use faceoff_transport::{ClientConnection, Connection};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::FaceoffError;

/// How long a catalog append waits for the relay's answer by default.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between re-dial attempts by default.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Tuning for a [`RelayClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub catalog_timeout: Duration,
    /// Wait before each re-dial after the connection drops.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

type Pending = Mutex<HashMap<u64, oneshot::Sender<CatalogResult>>>;

/// State shared by every clone of the client and its supervisor.
struct Link {
    codec: JsonCodec,
    connected: AtomicBool,
    /// Bumped each time a re-dial succeeds.
    generation: watch::Sender<u64>,
    next_request: AtomicU64,
    pending: Pending,
}

impl Link {
    fn fail_pending(&self) {
        // Waiters see a closed channel and report the relay as unavailable.
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }
}

/// A connection to a relay room that survives relay restarts. Cheap to
/// clone.
#[derive(Clone)]
pub struct RelayClient {
    match_id: MatchId,
    link: Arc<Link>,
    // Held only by clients, so the supervisor stops once they are all gone.
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    catalog_timeout: Duration,
}

impl RelayClient {
    /// Dials `url` with the default [`ClientConfig`].
    pub async fn connect(
        url: &str,
        match_id: MatchId,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), FaceoffError> {
        Self::connect_with(url, match_id, ClientConfig::default()).await
    }

    /// Dials `url` and starts the supervisor task.
    ///
    /// The first dial must succeed. Later drops are retried forever, every
    /// `config.reconnect_delay`, until every clone of the client is gone.
    ///
    /// Returns the client and a receiver of every event the room sends,
    /// except catalog answers, which are routed to the pending
    /// [`AbilityCatalog::append`] call.
    ///
    /// Room membership is not established here. Hosts announce through
    /// the engine's rejoin schedule; other clients call [`join`](Self::join).
    pub async fn connect_with(
        url: &str,
        match_id: MatchId,
        config: ClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), FaceoffError> {
        let conn = faceoff_transport::connect(url).await?;
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (generation, _) = watch::channel(0);

        let link = Arc::new(Link {
            codec: JsonCodec,
            connected: AtomicBool::new(true),
            generation,
            next_request: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        });

        let supervisor = Supervisor {
            url: url.to_string(),
            match_id: match_id.clone(),
            link: Arc::clone(&link),
            outbound: out_rx,
            inbound: in_tx,
            reconnect_delay: config.reconnect_delay,
        };
        tokio::spawn(supervisor.run(conn));
        tracing::info!(%match_id, url, "connected to relay");

        let client = Self {
            match_id,
            link,
            outbound: out_tx,
            catalog_timeout: config.catalog_timeout,
        };
        Ok((client, in_rx))
    }

    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Whether a socket to the relay is currently up.
    pub fn is_connected(&self) -> bool {
        self.link.connected.load(Ordering::Acquire)
    }

    /// Changes each time the client comes back after a drop. The first
    /// connection is already in place when this is called.
    pub fn connections(&self) -> watch::Receiver<u64> {
        self.link.generation.subscribe()
    }

    /// Joins the match room as `role`.
    pub fn join(&self, role: Role) -> SendOutcome {
        self.publish(ChannelEvent::Join(JoinRoom {
            match_id: self.match_id.clone(),
            role,
        }))
    }

    fn forget(&self, request_id: u64) {
        if let Ok(mut pending) = self.link.pending.lock() {
            pending.remove(&request_id);
        }
    }
}

impl Channel for RelayClient {
    fn publish(&self, event: ChannelEvent) -> SendOutcome {
        if !self.is_connected() {
            return SendOutcome::Failed("relay disconnected".into());
        }
        let bytes = match self.link.codec.encode_event(&event) {
            Ok(bytes) => bytes,
            Err(e) => return SendOutcome::Failed(e.to_string()),
        };
        match self.outbound.send(bytes) {
            Ok(()) => SendOutcome::Sent,
            Err(_) => SendOutcome::Failed("relay connection closed".into()),
        }
    }
}

impl AbilityCatalog for RelayClient {
    async fn append(&self, text: String) -> Result<(), CatalogError> {
        let request_id = self.link.next_request.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        match self.link.pending.lock() {
            Ok(mut pending) => {
                pending.insert(request_id, tx);
            }
            Err(_) => return Err(CatalogError::Unavailable("client state poisoned".into())),
        }

        let request = ChannelEvent::CatalogAppend(CatalogAppend { request_id, text });
        if let SendOutcome::Failed(reason) = self.publish(request) {
            self.forget(request_id);
            return Err(CatalogError::Unavailable(reason));
        }

        match tokio::time::timeout(self.catalog_timeout, rx).await {
            Ok(Ok(result)) if result.ok => Ok(()),
            Ok(Ok(result)) => Err(CatalogError::Rejected(
                result.error.unwrap_or_else(|| "refused".into()),
            )),
            Ok(Err(_)) => Err(CatalogError::Unavailable("relay connection closed".into())),
            Err(_) => {
                self.forget(request_id);
                Err(CatalogError::TimedOut)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct Supervisor {
    url: String,
    match_id: MatchId,
    link: Arc<Link>,
    outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    inbound: mpsc::UnboundedSender<ChannelEvent>,
    reconnect_delay: Duration,
}

impl Supervisor {
    async fn run(mut self, first: ClientConnection) {
        let mut conn = Arc::new(first);
        loop {
            let clients_alive = self.session(&conn).await;
            self.link.connected.store(false, Ordering::Release);
            self.link.fail_pending();
            let _ = conn.close().await;
            if !clients_alive {
                break;
            }

            tracing::warn!(match_id = %self.match_id, "relay connection lost");
            match self.redial().await {
                Some(next) => conn = Arc::new(next),
                None => break,
            }
            self.link.connected.store(true, Ordering::Release);
            self.link.generation.send_modify(|g| *g += 1);
        }
        tracing::debug!(match_id = %self.match_id, "relay supervisor stopped");
    }

    /// Pumps one socket until it drops. Returns `false` once every client
    /// clone is gone.
    async fn session(&mut self, conn: &Arc<ClientConnection>) -> bool {
        let mut reader = tokio::spawn(read_frames(
            Arc::clone(conn),
            Arc::clone(&self.link),
            self.inbound.clone(),
        ));

        let alive = loop {
            tokio::select! {
                _ = &mut reader => break true,
                frame = self.outbound.recv() => match frame {
                    Some(bytes) => {
                        if let Err(e) = conn.send(&bytes).await {
                            tracing::warn!(error = %e, "relay send failed");
                            break true;
                        }
                    }
                    None => break false,
                },
            }
        };
        reader.abort();
        alive
    }

    /// Dials until it works. Gives up only when every client is gone.
    async fn redial(&mut self) -> Option<ClientConnection> {
        let mut attempt: u32 = 0;
        loop {
            let deadline = Instant::now() + self.reconnect_delay;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => break,
                    // Anything queued while offline is stale.
                    frame = self.outbound.recv() => {
                        if frame.is_none() {
                            return None;
                        }
                    }
                }
            }

            attempt += 1;
            match faceoff_transport::connect(&self.url).await {
                Ok(conn) => {
                    tracing::info!(match_id = %self.match_id, attempt, "reconnected to relay");
                    return Some(conn);
                }
                Err(e) => {
                    tracing::debug!(match_id = %self.match_id, attempt, error = %e, "re-dial failed");
                }
            }
        }
    }
}

async fn read_frames(
    conn: Arc<ClientConnection>,
    link: Arc<Link>,
    inbound: mpsc::UnboundedSender<ChannelEvent>,
) {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!("relay closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "relay recv failed");
                break;
            }
        };

        let event = match link.codec.decode_event(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable frame from relay");
                continue;
            }
        };

        match event {
            ChannelEvent::CatalogResult(result) => {
                let waiter = link
                    .pending
                    .lock()
                    .ok()
                    .and_then(|mut pending| pending.remove(&result.request_id));
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(result);
                    }
                    None => {
                        tracing::debug!(request_id = result.request_id, "late catalog result")
                    }
                }
            }
            ChannelEvent::Error(notice) => {
                tracing::warn!(code = notice.code, message = %notice.message, "relay refused a frame");
            }
            event => {
                if inbound.send(event).is_err() {
                    tracing::debug!("inbound receiver dropped");
                }
            }
        }
    }
}
