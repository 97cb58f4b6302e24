//! Room actor: one Tokio task per match room.
//!
//! A room only knows who is in it. Frames from one member are copied to
//! every other member untouched; the relay never looks inside them.

use std::collections::HashMap;
use std::sync::Arc;

use faceoff_protocol::{MatchId, Role};
use faceoff_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::RelayError;

/// An encoded frame on its way to one member's connection.
pub type Frame = Arc<[u8]>;

/// Channel feeding a member's connection writer.
pub type MemberSender = mpsc::UnboundedSender<Frame>;

pub(crate) enum RoomCommand {
    Join {
        conn_id: ConnectionId,
        role: Role,
        sender: MemberSender,
        reply: oneshot::Sender<usize>,
    },
    /// Replies with the number of members left.
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<usize>,
    },
    Forward {
        from: ConnectionId,
        frame: Frame,
    },
    WatchCatalog {
        conn_id: ConnectionId,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Membership summary of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub match_id: MatchId,
    pub members: usize,
    pub hosts: usize,
    pub catalog_watcher: Option<ConnectionId>,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    match_id: MatchId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Adds or refreshes a member. Returns the member count.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        role: Role,
        sender: MemberSender,
    ) -> Result<usize, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            conn_id,
            role,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a member. Returns how many are left.
    pub async fn leave(&self, conn_id: ConnectionId) -> Result<usize, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            conn_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Copies `frame` to every member except `from` (fire-and-forget).
    pub async fn forward(&self, from: ConnectionId, frame: Frame) -> Result<(), RelayError> {
        self.send(RoomCommand::Forward { from, frame }).await
    }

    pub async fn watch_catalog(&self, conn_id: ConnectionId) -> Result<(), RelayError> {
        self.send(RoomCommand::WatchCatalog { conn_id }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn shutdown(&self) -> Result<(), RelayError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RelayError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RelayError {
        RelayError::RoomUnavailable(self.match_id.clone())
    }
}

struct Member {
    role: Role,
    sender: MemberSender,
}

struct RoomActor {
    match_id: MatchId,
    members: HashMap<ConnectionId, Member>,
    catalog_watcher: Option<ConnectionId>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(match_id = %self.match_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn_id,
                    role,
                    sender,
                    reply,
                } => {
                    let rejoin = self
                        .members
                        .insert(conn_id, Member { role, sender })
                        .is_some();
                    tracing::debug!(
                        match_id = %self.match_id,
                        %conn_id,
                        ?role,
                        rejoin,
                        members = self.members.len(),
                        "member joined"
                    );
                    let _ = reply.send(self.members.len());
                }
                RoomCommand::Leave { conn_id, reply } => {
                    if self.members.remove(&conn_id).is_some() {
                        tracing::debug!(
                            match_id = %self.match_id,
                            %conn_id,
                            members = self.members.len(),
                            "member left"
                        );
                    }
                    if self.catalog_watcher == Some(conn_id) {
                        self.catalog_watcher = None;
                    }
                    let _ = reply.send(self.members.len());
                }
                RoomCommand::Forward { from, frame } => self.forward(from, frame),
                RoomCommand::WatchCatalog { conn_id } => {
                    if self.members.contains_key(&conn_id) {
                        tracing::info!(match_id = %self.match_id, %conn_id, "catalog watcher registered");
                        self.catalog_watcher = Some(conn_id);
                    }
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => break,
            }
        }

        tracing::info!(match_id = %self.match_id, "room actor stopped");
    }

    fn forward(&self, from: ConnectionId, frame: Frame) {
        if !self.members.contains_key(&from) {
            tracing::warn!(match_id = %self.match_id, %from, "frame from non-member, dropping");
            return;
        }
        for (conn_id, member) in &self.members {
            if *conn_id != from {
                // A closed sender means the member is disconnecting.
                let _ = member.sender.send(Arc::clone(&frame));
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            match_id: self.match_id.clone(),
            members: self.members.len(),
            hosts: self
                .members
                .values()
                .filter(|m| m.role == Role::Host)
                .count(),
            catalog_watcher: self.catalog_watcher,
        }
    }
}

pub(crate) fn spawn_room(match_id: MatchId, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        match_id: match_id.clone(),
        members: HashMap::new(),
        catalog_watcher: None,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        match_id,
        sender: tx,
    }
}
