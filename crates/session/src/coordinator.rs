use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{
    error::{ExchangeError, SessionError, SessionResult},
    exchange::TokenExchange,
    model::{ApiRequest, ApiResponse, SessionEvent, TokenPair},
    store::TokenStore,
    transport::Transport,
};

type Reply = oneshot::Sender<SessionResult<ApiResponse>>;

enum Command {
    Unauthorized {
        request: ApiRequest,
        sent_with: Option<String>,
        session: u64,
        reply: Reply,
    },
    ExchangeSettled {
        epoch: u64,
        outcome: Result<TokenPair, ExchangeError>,
    },
    Establish {
        pair: TokenPair,
        done: oneshot::Sender<()>,
    },
    SignOut {
        done: oneshot::Sender<Option<TokenPair>>,
    },
}

struct PendingRequest {
    request: ApiRequest,
    reply: Reply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing { epoch: u64 },
}

/// Cloneable entry point to the refresh actor.
///
/// The actor is the only writer of the token store. It owns the
/// `idle/refreshing` flag and the queue of callers waiting for a refresh,
/// so at most one exchange is ever in flight.
///
/// Every `establish` and `sign_out` starts a new session generation. A 401
/// is only retried under the generation its request was sent in.
#[derive(Clone)]
pub struct RefreshCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    session: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
        exchange: Arc<dyn TokenExchange>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(AtomicU64::new(0));
        let actor = RefreshActor {
            store,
            transport,
            exchange,
            events,
            commands: tx.downgrade(),
            state: RefreshState::Idle,
            queue: VecDeque::new(),
            epoch: 0,
            session: session.clone(),
        };
        tokio::spawn(actor.run(rx));
        Self {
            commands: tx,
            session,
        }
    }

    /// Current session generation. Read it before the access token.
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    /// Hands over a request that came back with 401 after being sent with
    /// `sent_with` during `session`. Resolves with the replayed response or
    /// a session error.
    pub async fn request_with_auth(
        &self,
        request: ApiRequest,
        sent_with: Option<String>,
        session: u64,
    ) -> SessionResult<ApiResponse> {
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::Unauthorized {
                request,
                sent_with,
                session,
                reply,
            })
            .map_err(|_| SessionError::SessionExpired)?;

        receiver.await.unwrap_or(Err(SessionError::SessionExpired))
    }

    /// Starts a new session with the pair returned by login or register.
    pub async fn establish(&self, pair: TokenPair) {
        let (done, receiver) = oneshot::channel();
        if self.commands.send(Command::Establish { pair, done }).is_ok() {
            let _ = receiver.await;
        }
    }

    /// Ends the session, returning the pair that was active.
    pub async fn sign_out(&self) -> Option<TokenPair> {
        let (done, receiver) = oneshot::channel();
        self.commands.send(Command::SignOut { done }).ok()?;
        receiver.await.ok().flatten()
    }
}

struct RefreshActor {
    store: Arc<dyn TokenStore>,
    transport: Arc<dyn Transport>,
    exchange: Arc<dyn TokenExchange>,
    events: broadcast::Sender<SessionEvent>,
    commands: mpsc::WeakUnboundedSender<Command>,
    state: RefreshState,
    queue: VecDeque<PendingRequest>,
    epoch: u64,
    session: Arc<AtomicU64>,
}

impl RefreshActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        debug!("Refresh coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Unauthorized {
                request,
                sent_with,
                session,
                reply,
            } => self.request_with_auth(PendingRequest { request, reply }, sent_with, session),
            Command::ExchangeSettled { epoch, outcome } => self.on_exchange_settled(epoch, outcome),
            Command::Establish { pair, done } => {
                self.end_epoch(|| SessionError::SessionExpired);
                self.next_session();
                self.store.set(pair);
                self.emit(SessionEvent::Established);
                let _ = done.send(());
            }
            Command::SignOut { done } => {
                self.end_epoch(|| SessionError::SignedOut);
                self.next_session();
                let previous = self.store.get();
                self.store.clear();
                self.emit(SessionEvent::SignedOut);
                let _ = done.send(previous);
            }
        }
    }

    fn request_with_auth(
        &mut self,
        pending: PendingRequest,
        sent_with: Option<String>,
        session: u64,
    ) {
        if session != self.session.load(Ordering::SeqCst) {
            debug!(
                "{} {} belongs to an ended session, rejecting",
                pending.request.method, pending.request.path
            );
            let _ = pending.reply.send(Err(SessionError::SignedOut));
            return;
        }

        if let RefreshState::Refreshing { .. } = self.state {
            debug!(
                "Refresh in flight, queueing {} {}",
                pending.request.method, pending.request.path
            );
            self.queue.push_back(pending);
            return;
        }

        match self.store.get() {
            Some(current) if sent_with.as_deref() != Some(current.access_token.as_str()) => {
                debug!("Access token rotated since the request was sent, replaying");
                self.replay(VecDeque::from([pending]), current.access_token);
            }
            Some(current) if !current.refresh_token.is_empty() => {
                self.begin_exchange(current.refresh_token, pending);
            }
            _ => {
                info!("No refresh token available, expiring session");
                self.expire(VecDeque::from([pending]));
            }
        }
    }

    fn begin_exchange(&mut self, refresh_token: String, original: PendingRequest) {
        self.epoch += 1;
        let epoch = self.epoch;
        self.state = RefreshState::Refreshing { epoch };
        self.queue.push_back(original);

        debug!("Starting token exchange #{}", epoch);

        let exchange = self.exchange.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let outcome = exchange.exchange(refresh_token).await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::ExchangeSettled { epoch, outcome });
            }
        });
    }

    fn on_exchange_settled(&mut self, epoch: u64, outcome: Result<TokenPair, ExchangeError>) {
        if self.state != (RefreshState::Refreshing { epoch }) {
            debug!("Discarding result of abandoned token exchange #{}", epoch);
            return;
        }

        self.state = RefreshState::Idle;
        let pending = std::mem::take(&mut self.queue);

        match outcome {
            Ok(pair) => {
                debug!(
                    "Token exchange #{} succeeded, replaying {} request(s)",
                    epoch,
                    pending.len()
                );
                let access_token = pair.access_token.clone();
                self.store.set(pair);
                self.emit(SessionEvent::Refreshed);
                self.replay(pending, access_token);
            }
            Err(err) => {
                warn!("Token exchange #{} failed: {}", epoch, err);
                self.expire(pending);
            }
        }
    }

    /// Abandons any in-flight exchange and rejects whoever was waiting on it.
    fn end_epoch(&mut self, reason: impl Fn() -> SessionError) {
        self.epoch += 1;
        self.state = RefreshState::Idle;
        for pending in self.queue.drain(..) {
            let _ = pending.reply.send(Err(reason()));
        }
    }

    fn next_session(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
    }

    fn expire(&mut self, pending: VecDeque<PendingRequest>) {
        self.store.clear();
        for waiter in pending {
            let _ = waiter.reply.send(Err(SessionError::SessionExpired));
        }
        self.emit(SessionEvent::Expired);
    }

    /// Replays in FIFO order, one at a time. Replayed 401s are returned as-is.
    fn replay(&self, pending: VecDeque<PendingRequest>, access_token: String) {
        let transport = self.transport.clone();
        tokio::spawn(async move {
            for waiter in pending {
                if waiter.reply.is_closed() {
                    debug!(
                        "Caller gone, skipping replay of {} {}",
                        waiter.request.method, waiter.request.path
                    );
                    continue;
                }
                let outcome = transport
                    .send(&waiter.request, Some(&access_token))
                    .await
                    .map_err(SessionError::from);
                let _ = waiter.reply.send(outcome);
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
