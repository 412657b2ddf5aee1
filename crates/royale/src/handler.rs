//! Per-connection handler: decode inbound frames, forward them to the
//! coordinator, and write the coordinator's events back out.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The task `select!`s between the socket and the
//! connection's outbound channel until either side closes.

use std::sync::Arc;

use royale_protocol::{ClientMessage, Codec, ServerEvent};
use royale_session::ConnectionHandle;
use royale_transport::{Connection, ConnectionId, WebSocketConnection};
use tracing::{debug, info};

use crate::{CoordinatorHandle, RoyaleError};

/// Tells the coordinator the connection is gone when the handler exits,
/// whether it returned normally, with an error, or by panicking.
///
/// `Drop` is synchronous, so the notification is sent from a spawned task.
struct ConnectionGuard {
    conn_id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let _ = coordinator.closed(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    coordinator: CoordinatorHandle,
    codec: Arc<C>,
) -> Result<(), RoyaleError> {
    let conn_id = conn.id();
    debug!(%conn_id, "handling new connection");

    let (handle, mut outbound) = ConnectionHandle::channel(conn_id);
    let _guard = ConnectionGuard {
        conn_id,
        coordinator: coordinator.clone(),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Ok(Some(text)) => match codec.decode::<ClientMessage>(&text) {
                    Ok(msg) => coordinator.message(handle.clone(), msg).await?,
                    Err(e) => {
                        debug!(%conn_id, error = %e, "failed to decode client message");
                        handle.send(ServerEvent::error(e.client_message()));
                    }
                },
                Ok(None) => {
                    info!(%conn_id, "connection closed");
                    break;
                }
                Err(e) => {
                    debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            Some(event) = outbound.recv() => {
                let text = codec.encode(&event)?;
                conn.send(&text).await?;
            }
        }
    }

    // Already closed by the peer in the common case.
    let _ = conn.close().await;

    // _guard drops here → coordinator forgets the connection.
    Ok(())
}
