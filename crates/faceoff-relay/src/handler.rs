//! Per-connection handler: room membership, catalog requests, forwarding.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Outbound frames (forwarded by the room or answered by the relay) go
//! through one writer task so they reach the socket in order.

use std::sync::Arc;

use faceoff_protocol::{
    CatalogAppend, CatalogResult, ChannelEvent, Codec, ProtocolError, RelayNotice,
    WatchAbilityRequests,
};
use faceoff_transport::{Connection, ConnectionId, ServerConnection};
use tokio::sync::mpsc;

use crate::room::{Frame, MemberSender};
use crate::server::RelayState;
use crate::RelayError;

/// Drop guard that takes the connection out of its room when the handler
/// exits, however it exits.
struct MembershipGuard {
    conn_id: ConnectionId,
    state: Arc<RelayState>,
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            if let Err(e) = registry.leave(conn_id).await {
                tracing::debug!(%conn_id, error = %e, "leave on disconnect failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: ServerConnection,
    state: Arc<RelayState>,
) -> Result<(), RelayError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_frames(Arc::clone(&conn), rx));
    let _guard = MembershipGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event = match state.codec.decode_event(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                reply_error(&state, &tx, 400, &format!("invalid event: {e}"))?;
                continue;
            }
        };
        tracing::debug!(%conn_id, event = event.name(), "inbound event");

        match event {
            ChannelEvent::Join(join) => {
                let result = state
                    .registry
                    .lock()
                    .await
                    .join(conn_id, join.match_id, join.role, tx.clone())
                    .await;
                if let Err(e) = result {
                    reply_error(&state, &tx, 503, &e.to_string())?;
                }
            }
            ChannelEvent::WatchAbilityRequests(watch) => {
                watch_catalog(&state, &tx, conn_id, watch).await?;
            }
            ChannelEvent::CatalogAppend(request) => {
                append_catalog(&state, &tx, conn_id, request).await?;
            }
            event @ (ChannelEvent::CatalogResult(_) | ChannelEvent::Error(_)) => {
                let err = ProtocolError::InvalidMessage(format!(
                    "{} is only sent by the relay",
                    event.name()
                ));
                reply_error(&state, &tx, 400, &err.to_string())?;
            }
            _ => {
                // Clone the handle and release the registry before routing.
                let room = state.registry.lock().await.room_of(conn_id);
                match room {
                    Some(room) => {
                        if let Err(e) = room.forward(conn_id, Frame::from(data)).await {
                            reply_error(&state, &tx, 503, &e.to_string())?;
                        }
                    }
                    None => {
                        reply_error(&state, &tx, 409, &RelayError::NotInRoom.to_string())?;
                    }
                }
            }
        }
    }

    drop(tx);
    writer.abort();
    // _guard drops here → room leave fires.
    Ok(())
}

async fn write_frames(conn: Arc<ServerConnection>, mut rx: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

async fn watch_catalog(
    state: &RelayState,
    tx: &MemberSender,
    conn_id: ConnectionId,
    watch: WatchAbilityRequests,
) -> Result<(), RelayError> {
    let room = state.registry.lock().await.room_of(conn_id);
    match room {
        Some(room) if *room.match_id() == watch.match_id => room.watch_catalog(conn_id).await,
        _ => reply_error(
            state,
            tx,
            409,
            &format!("not a member of room {}", watch.match_id),
        ),
    }
}

async fn append_catalog(
    state: &RelayState,
    tx: &MemberSender,
    conn_id: ConnectionId,
    request: CatalogAppend,
) -> Result<(), RelayError> {
    let match_id = state
        .registry
        .lock()
        .await
        .room_of(conn_id)
        .map(|room| room.match_id().clone());

    let outcome = match &state.catalog {
        Some(log) => log
            .append(match_id.as_ref(), &request.text)
            .await
            .map_err(|e| e.to_string()),
        None => Err("catalog log is not configured".to_string()),
    };
    if let Err(error) = &outcome {
        tracing::warn!(%conn_id, request_id = request.request_id, %error, "catalog append refused");
    }

    let result = ChannelEvent::CatalogResult(CatalogResult {
        request_id: request.request_id,
        ok: outcome.is_ok(),
        error: outcome.err(),
    });
    reply(state, tx, &result)
}

/// Queues an event for this connection only.
fn reply(state: &RelayState, tx: &MemberSender, event: &ChannelEvent) -> Result<(), RelayError> {
    let bytes = state.codec.encode_event(event)?;
    // A closed writer means the connection is already going away.
    let _ = tx.send(Frame::from(bytes));
    Ok(())
}

fn reply_error(
    state: &RelayState,
    tx: &MemberSender,
    code: u16,
    message: &str,
) -> Result<(), RelayError> {
    reply(
        state,
        tx,
        &ChannelEvent::Error(RelayNotice {
            code,
            message: message.to_string(),
        }),
    )
}
