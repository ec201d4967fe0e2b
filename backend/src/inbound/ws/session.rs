//! Per-connection profile stream.
//!
//! Pings every 5s and closes after 10s without client traffic (shorter in
//! tests). The connection's synchronizer is torn down whichever way the loop
//! ends.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::{Error, IdentitySession, PaidTier, ProfileState, SubscriptionSynchronizer};
use crate::inbound::http::validation::{FieldName, invalid_field_error};
use crate::inbound::ws::messages::{ClientFrame, ErrorFrame, StateFrame};
use crate::inbound::ws::state::WsState;

#[cfg(not(test))]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(not(test))]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_millis(400);

const PLAN: FieldName = FieldName::new("plan");

pub(super) async fn handle_ws_session(
    state: WsState,
    identity: IdentitySession,
    session: Session,
    stream: MessageStream,
) {
    let synchronizer = SubscriptionSynchronizer::new(state.store, state.identity);
    ProfileStream { synchronizer }
        .run(identity, session, stream)
        .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

struct ProfileStream {
    synchronizer: SubscriptionSynchronizer,
}

impl ProfileStream {
    async fn run(&self, identity: IdentitySession, mut session: Session, mut stream: MessageStream) {
        let user_id = identity.user_id().clone();
        let mut states = self.synchronizer.watch();
        if let Err(err) = self.synchronizer.establish_identity(identity) {
            warn!(user_id = %user_id, error = %err, "profile subscription refused");
        }

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let initial = StateFrame::from(&*states.borrow_and_update());
        let mut result = self.send_json(&mut session, &initial).await.map_err(SessionError::Network);

        while result.is_ok() {
            result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                changed = states.changed() => {
                    match changed {
                        Ok(()) => self.forward_state(&mut session, &mut states).await,
                        Err(_) => Err(SessionError::StreamClosed),
                    }
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
            };
        }

        self.synchronizer.clear_identity();
        if let Err(error) = result {
            Self::log_shutdown_reason(&user_id, &error);
            if let Some(reason) = Self::close_reason_for(error) {
                if let Err(error) = session.close(reason).await {
                    debug!(error = %error, "WebSocket already closed");
                }
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn forward_state(
        &self,
        session: &mut Session,
        states: &mut watch::Receiver<ProfileState>,
    ) -> Result<(), SessionError> {
        let frame = StateFrame::from(&*states.borrow_and_update());
        self.send_json(session, &frame).await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            None => return Err(SessionError::StreamClosed),
            Some(Err(error)) => return Err(SessionError::Protocol(error)),
            Some(Ok(message)) => message,
        };
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => self.handle_command(session, text.as_ref()).await,
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                Ok(())
            }
        }
    }

    async fn handle_command(&self, session: &mut Session, text: &str) -> Result<(), SessionError> {
        let command = serde_json::from_str::<ClientFrame>(text).map_err(|error| {
            warn!(error = %error, "rejected malformed WebSocket payload");
            SessionError::InvalidPayload
        })?;
        let ClientFrame::SetTier { plan } = command;
        let outcome = match plan.parse::<PaidTier>() {
            Ok(tier) => self.synchronizer.set_tier(tier).await.map_err(Error::from),
            Err(err) => Err(invalid_field_error(PLAN, err.to_string())),
        };
        match outcome {
            // The new tier arrives through the state watch.
            Ok(()) => Ok(()),
            Err(error) => self
                .send_json(session, &ErrorFrame { error })
                .await
                .map_err(SessionError::Network),
        }
    }

    async fn send_json<T: serde::Serialize>(
        &self,
        session: &mut Session,
        payload: &T,
    ) -> Result<(), Closed> {
        match serde_json::to_string(payload) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                warn!(error = %error, "failed to serialise WebSocket frame");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(user_id: &crate::domain::UserId, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                info!(user_id = %user_id, "profile stream idle; closing");
            }
            SessionError::Protocol(error) => {
                warn!(user_id = %user_id, error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(user_id = %user_id, error = %error, "WebSocket send failed");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {
                debug!(user_id = %user_id, "profile stream closed");
            }
        }
    }

    fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
        let reason = |code, description: &str| {
            Some(Some(CloseReason {
                code,
                description: Some(description.to_owned()),
            }))
        };
        match error {
            SessionError::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
            SessionError::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
            SessionError::InvalidPayload => reason(CloseCode::Policy, "invalid payload"),
            SessionError::ClientClosed(reason) => Some(reason),
            SessionError::StreamClosed | SessionError::Network(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
