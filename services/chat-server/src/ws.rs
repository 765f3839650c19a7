//! Live channel transport
//!
//! One actor per WebSocket connection. Inbound text frames become engine
//! submissions, processed one at a time in arrival order; outbound frames
//! arrive through the connection registry and are written to the socket.

use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, StreamHandler, WrapFuture};
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use actix_web_actors::ws;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use cipherchat_core::storage::UserStore;
use cipherchat_core::{InboundFrame, OutboundFrame};
use cipherchat_relay::{ChannelHandle, ConnectionRegistry, RelayEngine, Submission};

use crate::error::ApiError;
use crate::AppState;

/// How often the server pings the client
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long without a pong before the connection is dropped
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a live channel for a user
pub async fn channel(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();

    let exists = state
        .engine
        .users()
        .user_exists(user_id)
        .await
        .map_err(ApiError::from)?;
    if !exists {
        return Err(ApiError::NotFound("User not found".to_string()).into());
    }

    let session = WsSession::new(user_id, state.engine.clone());
    ws::start(session, &req, stream)
}

/// One user's WebSocket session
pub struct WsSession {
    user_id: i64,
    engine: std::sync::Arc<RelayEngine>,
    handle: ChannelHandle,
    rx: Option<UnboundedReceiver<OutboundFrame>>,
    hb: Instant,
}

impl WsSession {
    fn new(user_id: i64, engine: std::sync::Arc<RelayEngine>) -> Self {
        let (handle, rx) = ChannelHandle::new();
        Self {
            user_id,
            engine,
            handle,
            rx: Some(rx),
            hb: Instant::now(),
        }
    }

    fn registry(&self) -> &ConnectionRegistry {
        self.engine.registry()
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                warn!(user_id = act.user_id, "client heartbeat timed out");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    /// Run one submission through the engine and acknowledge on this socket.
    ///
    /// `ctx.wait` pauses the mailbox until the submission completes, so
    /// frames from one channel are processed strictly in arrival order.
    fn submit(&self, submission: Submission, ctx: &mut ws::WebsocketContext<Self>) {
        let engine = self.engine.clone();
        let fut = async move { engine.submit(submission).await }
            .into_actor(self)
            .map(|result, act, ctx| {
                let frame = match result {
                    Ok(persisted) => OutboundFrame::message(persisted),
                    Err(e) => {
                        debug!(user_id = act.user_id, error = %e, "submission rejected");
                        OutboundFrame::error(e.to_string())
                    }
                };
                act.push_frame(frame, ctx);
            });
        ctx.wait(fut);
    }

    fn push_frame(&self, frame: OutboundFrame, ctx: &mut ws::WebsocketContext<Self>) {
        match frame.to_json() {
            Ok(text) => ctx.text(text),
            Err(e) => warn!(user_id = self.user_id, error = %e, "dropped unserializable frame"),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(user_id = self.user_id, "live channel opened");
        self.heartbeat(ctx);

        // Frames forwarded by the engine drain into this socket.
        if let Some(rx) = self.rx.take() {
            ctx.add_stream(UnboundedReceiverStream::new(rx));
        }

        // Last-connect-wins: registering evicts any earlier channel.
        self.registry().register(self.user_id, self.handle.clone());
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Only removes the mapping if it still belongs to this connection.
        if self.registry().unregister(self.user_id, &self.handle) {
            info!(user_id = self.user_id, "live channel closed");
        } else {
            debug!(user_id = self.user_id, "superseded channel closed");
        }
    }
}

/// Frames pushed through the registry for this user
impl StreamHandler<OutboundFrame> for WsSession {
    fn handle(&mut self, frame: OutboundFrame, ctx: &mut Self::Context) {
        self.push_frame(frame, ctx);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(user_id = self.user_id, error = %e, "websocket protocol error");
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(bytes) => {
                self.hb = Instant::now();
                ctx.pong(&bytes);
            }
            ws::Message::Pong(_) => {
                self.hb = Instant::now();
            }
            ws::Message::Text(text) => match serde_json::from_str::<InboundFrame>(&text) {
                Ok(frame) => {
                    let submission = Submission::from_frame(self.user_id, frame);
                    self.submit(submission, ctx);
                }
                Err(_) => {
                    self.push_frame(OutboundFrame::error("Invalid JSON format"), ctx);
                }
            },
            ws::Message::Binary(_) => {
                self.push_frame(OutboundFrame::error("Binary frames are not supported"), ctx);
            }
            ws::Message::Close(reason) => {
                debug!(user_id = self.user_id, "close frame received");
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}
