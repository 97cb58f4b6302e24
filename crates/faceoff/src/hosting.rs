//! Running a match host against a relay.

use faceoff_match::{DurableStore, HostConfig, HostHandle, Presenter, load_host};
use faceoff_protocol::ChannelEvent;
use tokio::sync::{mpsc, watch};

use crate::{ClientConfig, FaceoffError, RelayClient};

/// Restores the match from `store`, connects it to the relay at `url`
/// and starts announcing membership.
///
/// Uses the default [`ClientConfig`]. See [`connect_host_with`].
pub async fn connect_host<S, P>(
    url: &str,
    config: HostConfig,
    store: S,
    presenter: P,
) -> Result<HostHandle, FaceoffError>
where
    S: DurableStore,
    P: Presenter,
{
    connect_host_with(url, config, ClientConfig::default(), store, presenter).await
}

/// Like [`connect_host`], with explicit client tuning.
///
/// The room is the config's match id, else the `gameID` in `store`. The
/// same [`RelayClient`] serves as the host's channel and catalog. When the
/// relay drops, the client re-dials in the background and the host runs
/// its rejoin schedule again on every fresh connection.
pub async fn connect_host_with<S, P>(
    url: &str,
    config: HostConfig,
    client_config: ClientConfig,
    store: S,
    presenter: P,
) -> Result<HostHandle, FaceoffError>
where
    S: DurableStore,
    P: Presenter,
{
    let match_id = config.resolve_match_id(&store);
    let (client, inbound) = RelayClient::connect_with(url, match_id.clone(), client_config).await?;
    let reconnects = client.connections();

    let config = HostConfig {
        match_id: Some(match_id),
        ..config
    };
    let handle = load_host(config, store, client.clone(), presenter, client)?;

    tokio::spawn(pump(handle.clone(), inbound));
    tokio::spawn(announce_reconnects(handle.clone(), reconnects));
    handle.connected().await?;
    Ok(handle)
}

async fn pump(handle: HostHandle, mut inbound: mpsc::UnboundedReceiver<ChannelEvent>) {
    while let Some(event) = inbound.recv().await {
        if handle.deliver(event).await.is_err() {
            break;
        }
    }
    tracing::debug!(match_id = %handle.match_id(), "room event pump stopped");
}

async fn announce_reconnects(handle: HostHandle, mut connections: watch::Receiver<u64>) {
    while connections.changed().await.is_ok() {
        let generation = *connections.borrow_and_update();
        tracing::info!(match_id = %handle.match_id(), generation, "relay is back, rejoining");
        if handle.connected().await.is_err() {
            break;
        }
    }
}
