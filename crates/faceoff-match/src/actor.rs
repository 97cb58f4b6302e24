//! Host actor: a Tokio task that owns a [`MatchHost`].
//!
//! Everything that touches the match goes through one mpsc queue and is
//! handled to completion before the next command is read, so two mutations
//! never interleave. The only work that leaves the task is the catalog
//! write, whose outcome comes back through the same queue.

use std::sync::Arc;

use faceoff_protocol::{AbilityEntry, ChannelEvent, MatchId, MatchSnapshot};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::progression::RoundTransition;
use crate::{
    AbilityCatalog, CatalogError, Channel, DurableStore, HostConfig, MatchError, MatchHost,
    MatchState, Presenter, RejoinSchedule,
};

type Reply<T> = oneshot::Sender<Result<T, MatchError>>;

/// Commands sent to a host actor.
pub(crate) enum HostCommand {
    AdjustScore {
        player: String,
        delta: i32,
        reply: Reply<i32>,
    },
    EditNote {
        player: String,
        text: String,
        reply: Reply<()>,
    },
    AddAbility {
        player: String,
        text: String,
        reply: Reply<AbilityEntry>,
    },
    TransferAbility {
        from: String,
        index: usize,
        to: String,
        reply: Reply<AbilityEntry>,
    },
    ToggleAbilityUsed {
        player: String,
        index: usize,
        reply: Reply<bool>,
    },
    ConfirmRound {
        reply: Reply<RoundTransition>,
    },
    GoToRound {
        target: i64,
        reply: Reply<u32>,
    },
    /// An event that arrived from the room.
    Deliver(ChannelEvent),
    /// The channel (re)connected; start a new rejoin cycle.
    Connected,
    /// One attempt of the rejoin cycle is due.
    Announce { attempt: usize },
    /// A spawned catalog write finished.
    CatalogWritten {
        text: String,
        result: Result<(), CatalogError>,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
    Shutdown,
}

/// Handle to a running host actor.
///
/// Cheap to clone. Every method fails with [`MatchError::HostUnavailable`]
/// once the actor has stopped.
#[derive(Clone)]
pub struct HostHandle {
    match_id: MatchId,
    sender: mpsc::Sender<HostCommand>,
}

impl HostHandle {
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn adjust_score(&self, player: impl Into<String>, delta: i32) -> Result<i32, MatchError> {
        let player = player.into();
        self.request(|reply| HostCommand::AdjustScore { player, delta, reply })
            .await
    }

    pub async fn edit_note(
        &self,
        player: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), MatchError> {
        let (player, text) = (player.into(), text.into());
        self.request(|reply| HostCommand::EditNote { player, text, reply })
            .await
    }

    /// Adds an ability and starts its catalog write in the background.
    pub async fn add_ability(
        &self,
        player: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<AbilityEntry, MatchError> {
        let (player, text) = (player.into(), text.into());
        self.request(|reply| HostCommand::AddAbility { player, text, reply })
            .await
    }

    pub async fn transfer_ability(
        &self,
        from: impl Into<String>,
        index: usize,
        to: impl Into<String>,
    ) -> Result<AbilityEntry, MatchError> {
        let (from, to) = (from.into(), to.into());
        self.request(|reply| HostCommand::TransferAbility {
            from,
            index,
            to,
            reply,
        })
        .await
    }

    pub async fn toggle_ability_used(
        &self,
        player: impl Into<String>,
        index: usize,
    ) -> Result<bool, MatchError> {
        let player = player.into();
        self.request(|reply| HostCommand::ToggleAbilityUsed { player, index, reply })
            .await
    }

    pub async fn confirm_round(&self) -> Result<RoundTransition, MatchError> {
        self.request(|reply| HostCommand::ConfirmRound { reply }).await
    }

    pub async fn go_to_round(&self, target: i64) -> Result<u32, MatchError> {
        self.request(|reply| HostCommand::GoToRound { target, reply })
            .await
    }

    /// Hands an inbound room event to the host (fire-and-forget).
    pub async fn deliver(&self, event: ChannelEvent) -> Result<(), MatchError> {
        self.send(HostCommand::Deliver(event)).await
    }

    /// Signals that the channel connected, restarting the rejoin cycle.
    pub async fn connected(&self) -> Result<(), MatchError> {
        self.send(HostCommand::Connected).await
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HostCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| MatchError::HostUnavailable)
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), MatchError> {
        self.send(HostCommand::Shutdown).await
    }

    async fn send(&self, cmd: HostCommand) -> Result<(), MatchError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| MatchError::HostUnavailable)
    }

    async fn request<T>(
        &self,
        cmd: impl FnOnce(Reply<T>) -> HostCommand,
    ) -> Result<T, MatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(cmd(reply_tx)).await?;
        reply_rx.await.map_err(|_| MatchError::HostUnavailable)?
    }
}

/// The actor state. Runs inside a Tokio task.
struct HostActor<C, S, P, A> {
    host: MatchHost<C, S, P>,
    catalog: Arc<A>,
    rejoin: RejoinSchedule,
    rejoin_task: Option<JoinHandle<()>>,
    receiver: mpsc::Receiver<HostCommand>,
    /// Lets spawned tasks reach the queue without keeping it open.
    feedback: mpsc::WeakSender<HostCommand>,
}

impl<C, S, P, A> HostActor<C, S, P, A>
where
    C: Channel,
    S: DurableStore,
    P: Presenter,
    A: AbilityCatalog,
{
    async fn run(mut self) {
        tracing::info!(match_id = %self.host.match_id(), "host actor started");
        self.host.broadcast();

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                HostCommand::AdjustScore { player, delta, reply } => {
                    let _ = reply.send(self.host.adjust_score(&player, delta));
                }
                HostCommand::EditNote { player, text, reply } => {
                    let _ = reply.send(self.host.edit_note(&player, &text));
                }
                HostCommand::AddAbility { player, text, reply } => {
                    let result = self.host.add_ability(&player, &text);
                    if result.is_ok() {
                        self.spawn_catalog_write(text);
                    }
                    let _ = reply.send(result);
                }
                HostCommand::TransferAbility { from, index, to, reply } => {
                    let _ = reply.send(self.host.transfer_ability(&from, index, &to));
                }
                HostCommand::ToggleAbilityUsed { player, index, reply } => {
                    let _ = reply.send(self.host.toggle_ability_used(&player, index));
                }
                HostCommand::ConfirmRound { reply } => {
                    let _ = reply.send(self.host.confirm_round());
                }
                HostCommand::GoToRound { target, reply } => {
                    let _ = reply.send(self.host.go_to_round(target));
                }
                HostCommand::Deliver(event) => self.host.handle_event(event),
                HostCommand::Connected => self.restart_rejoin(),
                HostCommand::Announce { attempt } => {
                    tracing::debug!(match_id = %self.host.match_id(), attempt, "announcing membership");
                    self.host.announce();
                }
                HostCommand::CatalogWritten { text, result } => match result {
                    Ok(()) => {
                        tracing::debug!(match_id = %self.host.match_id(), %text, "catalog write stored");
                    }
                    Err(error) => self.host.catalog_failed(text, error),
                },
                HostCommand::Snapshot { reply } => {
                    let _ = reply.send(self.host.snapshot());
                }
                HostCommand::Shutdown => {
                    tracing::info!(match_id = %self.host.match_id(), "host shutting down");
                    break;
                }
            }
        }

        if let Some(task) = self.rejoin_task.take() {
            task.abort();
        }
        tracing::info!(match_id = %self.host.match_id(), "host actor stopped");
    }

    /// Cancels any running rejoin cycle and starts a new one from now.
    fn restart_rejoin(&mut self) {
        if let Some(task) = self.rejoin_task.take() {
            task.abort();
        }

        let schedule = self.rejoin.clone();
        let feedback = self.feedback.clone();
        let start = Instant::now();
        self.rejoin_task = Some(tokio::spawn(async move {
            schedule
                .run(start, |attempt| {
                    let Some(tx) = feedback.upgrade() else {
                        return false;
                    };
                    match tx.try_send(HostCommand::Announce { attempt }) {
                        Ok(()) => true,
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!(attempt, "host queue full, skipping announcement");
                            true
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => false,
                    }
                })
                .await;
        }));
    }

    fn spawn_catalog_write(&self, text: String) {
        let catalog = Arc::clone(&self.catalog);
        let feedback = self.feedback.clone();
        tokio::spawn(async move {
            let result = catalog.append(text.clone()).await;
            if let Some(tx) = feedback.upgrade() {
                let _ = tx.send(HostCommand::CatalogWritten { text, result }).await;
            }
        });
    }
}

/// Spawns a host actor for `state` and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_host<C, S, P, A>(
    config: HostConfig,
    state: MatchState,
    store: S,
    channel: C,
    presenter: P,
    catalog: A,
) -> HostHandle
where
    C: Channel,
    S: DurableStore,
    P: Presenter,
    A: AbilityCatalog,
{
    let match_id = config.resolve_match_id(&store);
    let host = MatchHost::new(match_id, state, store, channel, presenter);
    start(config, host, catalog)
}

/// Like [`spawn_host`], but restores the match from `store` first.
///
/// Without an explicit id in `config` the host takes the stored `gameID`.
pub fn load_host<C, S, P, A>(
    config: HostConfig,
    store: S,
    channel: C,
    presenter: P,
    catalog: A,
) -> Result<HostHandle, MatchError>
where
    C: Channel,
    S: DurableStore,
    P: Presenter,
    A: AbilityCatalog,
{
    let match_id = config.resolve_match_id(&store);
    let host = MatchHost::load(match_id, store, channel, presenter)?;
    Ok(start(config, host, catalog))
}

fn start<C, S, P, A>(config: HostConfig, host: MatchHost<C, S, P>, catalog: A) -> HostHandle
where
    C: Channel,
    S: DurableStore,
    P: Presenter,
    A: AbilityCatalog,
{
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let host_id = host.match_id().clone();

    let actor = HostActor {
        host,
        catalog: Arc::new(catalog),
        rejoin: config.rejoin,
        rejoin_task: None,
        receiver: rx,
        feedback: tx.downgrade(),
    };
    tokio::spawn(actor.run());

    HostHandle {
        match_id: host_id,
        sender: tx,
    }
}
