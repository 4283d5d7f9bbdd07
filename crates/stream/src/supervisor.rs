//! Connection task: connect -> run session -> schedule retry.
//!
//! Exactly one of these runs per client at a time, so it is the only
//! place a transport is ever opened. It exits when cancelled or when
//! the reconnect policy refuses another attempt.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::client::Shared;
use crate::events::ClientEvent;
use crate::session;
use crate::state::ConnectionState;
use crate::transport;

pub(crate) async fn run(shared: Arc<Shared>, cancel: CancellationToken, wake: Arc<Notify>) {
    let url = shared.config.url.clone();
    tracing::info!(url = %url, "Starting connection task");

    loop {
        shared.set_state(ConnectionState::Connecting);

        let opened = tokio::select! {
            _ = cancel.cancelled() => break,
            result = transport::open(&url) => result,
        };

        let outcome = match opened {
            Ok(ws_stream) => session::run(&shared, ws_stream, &cancel).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            tracing::warn!(url = %url, error = %e, "Transport error");
            shared.set_state(ConnectionState::Error);
        }

        if cancel.is_cancelled() {
            break;
        }

        // Must exist before observers hear about the closure.
        let woken = wake.notified();
        shared.handle_unexpected_close();

        let attempts = shared.reconnect_attempts();
        if !shared.policy.allows(attempts) {
            tracing::warn!(
                url = %url,
                attempts,
                "Reconnect attempts exhausted, staying disconnected",
            );
            break;
        }

        let attempt = attempts + 1;
        shared.set_reconnect_attempts(attempt);
        let delay = shared.policy.delay_for(attempt);

        tracing::info!(
            url = %url,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Connection lost, scheduling reconnect",
        );
        shared.publish(ClientEvent::ReconnectScheduled { attempt, delay });

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
            _ = woken => {
                tracing::debug!(url = %url, attempt, "Reconnect requested early");
            }
        }
    }

    if cancel.is_cancelled() {
        shared.clear_transport();
        shared.set_state(ConnectionState::Disconnected);
        tracing::info!(url = %url, "Connection task cancelled");
    } else {
        tracing::info!(url = %url, "Connection task exited");
    }
}
