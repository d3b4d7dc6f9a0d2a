//! The sync client: connection, routing, stores, and fetch lifecycle.

use crate::generation::Generation;
use crate::handler::RouterHandler;
use chat::ChatChannel;
use common::{ConnectionConfig, ConnectionManager, ConnectionState};
use notifications::{NotificationRecord, ReconciliationStore, StoreConfig};
use protocol::{EventKind, EventRouter, InboundEvent};
use session::{Session, SubscriptionRegistry};
use task_api::{ApiError, TaskApiClient};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the sync client.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:5000/ws`. The user id is
    /// appended as the `userId` query parameter.
    pub ws_endpoint: String,
    /// REST base URL, e.g. `http://localhost:5000`.
    pub api_base_url: String,
    /// Suppress polled duplicates of tasks already seen via push.
    pub dedupe_by_task_id: bool,
    /// Connection tuning.
    pub connection: ConnectionConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ws_endpoint: "ws://localhost:5000/ws".to_string(),
            api_base_url: "http://localhost:5000".to_string(),
            dedupe_by_task_id: false,
            connection: ConnectionConfig::default(),
        }
    }
}

/// Client-side synchronization layer for task notifications and team
/// chat.
///
/// Owns the wiring between the connection, the router, and the stores.
/// Background fetches report failures on the channel returned by
/// [`SyncClient::fetch_errors`]; auth rejections arrive there distinctly
/// so the session layer can force re-authentication.
pub struct SyncClient {
    config: SyncConfig,
    session: Session,
    registry: SubscriptionRegistry,
    conn: ConnectionManager,
    router: Arc<EventRouter>,
    notifications: ReconciliationStore,
    chat: ChatChannel,
    api: TaskApiClient,
    generation: Generation,
    history_fetch: Mutex<Option<JoinHandle<()>>>,
    snapshot_fetch: Mutex<Option<JoinHandle<()>>>,
    fetch_errors_tx: mpsc::UnboundedSender<ApiError>,
    fetch_errors_rx: Mutex<Option<mpsc::UnboundedReceiver<ApiError>>>,
}

impl SyncClient {
    pub fn new(config: SyncConfig, session: Session) -> Self {
        let conn = ConnectionManager::new(config.connection.clone());
        let notifications = ReconciliationStore::new(StoreConfig {
            dedupe_by_task_id: config.dedupe_by_task_id,
        });
        let chat = ChatChannel::new(conn.clone());
        let api = TaskApiClient::new(config.api_base_url.clone());
        let router = Arc::new(EventRouter::new());
        let registry = SubscriptionRegistry::new();
        let (fetch_errors_tx, fetch_errors_rx) = mpsc::unbounded_channel();

        // Seed interest from the persisted session.
        if let Some(user_id) = session.user_id() {
            registry.set_user(user_id);
        }
        if let Some(team_id) = session.selected_team() {
            registry.set_active_team(team_id.as_str());
            chat.set_active_team(team_id);
        }

        let client = Self {
            config,
            session,
            registry,
            conn,
            router,
            notifications,
            chat,
            api,
            generation: Generation::new(),
            history_fetch: Mutex::new(None),
            snapshot_fetch: Mutex::new(None),
            fetch_errors_tx,
            fetch_errors_rx: Mutex::new(Some(fetch_errors_rx)),
        };
        client.register_handlers();
        client
    }

    fn register_handlers(&self) {
        let notifications = self.notifications.clone();
        self.router.on(EventKind::TaskAssigned, move |event| {
            if let InboundEvent::TaskAssigned(task) = event {
                notifications.apply_push(NotificationRecord::from_push(task));
            }
        });

        let chat = self.chat.clone();
        self.router.on(EventKind::NewMessage, move |event| {
            if let InboundEvent::NewMessage(message) = event {
                chat.apply_incoming(message.clone());
            }
        });
    }

    /// Open the connection.
    ///
    /// Returns false without attempting to connect when the user
    /// identity is not yet known; call again once the session has one.
    pub fn start(&self) -> common::Result<bool> {
        let user_id = match self.registry.user_id() {
            Some(id) => id,
            None => {
                info!("User identity not yet known; deferring connect");
                return Ok(false);
            }
        };
        let mut url = Url::parse(&self.config.ws_endpoint)?;
        url.query_pairs_mut().append_pair("userId", &user_id);
        self.conn
            .connect(url.as_str(), RouterHandler::new(self.router.clone()))?;
        Ok(true)
    }

    /// Fetch the assigned-task snapshot for the active team and commit
    /// it, unless a team switch or logout supersedes the fetch first.
    ///
    /// Returns true when the snapshot was committed. Prior store
    /// contents are retained unchanged on any error.
    pub async fn load_notifications(&self) -> Result<bool, ApiError> {
        let team_id = match self.registry.active_team() {
            Some(team_id) => team_id,
            None => {
                debug!("No team selected; skipping snapshot fetch");
                return Ok(false);
            }
        };
        let token = self.session.bearer_token().unwrap_or_default();
        let guard = self.generation.token();

        let tasks = self.api.fetch_assigned_tasks(&token, &team_id).await?;
        if !guard.is_current() {
            debug!("Discarding snapshot fetched for a superseded context");
            return Ok(false);
        }
        let records = tasks.iter().map(NotificationRecord::from_task).collect();
        self.notifications.load_snapshot(records);
        Ok(true)
    }

    /// Fetch chat history for the active team and set the baseline,
    /// unless superseded.
    pub async fn load_chat_history(&self) -> Result<bool, ApiError> {
        let team_id = match self.registry.active_team() {
            Some(team_id) => team_id,
            None => {
                debug!("No team selected; skipping history fetch");
                return Ok(false);
            }
        };
        let token = self.session.bearer_token().unwrap_or_default();
        let guard = self.generation.token();

        let messages = self.api.fetch_chat_history(&token, &team_id).await?;
        if !guard.is_current() {
            debug!("Discarding history fetched for a superseded context");
            return Ok(false);
        }
        Ok(self.chat.load_history(&team_id, messages))
    }

    /// Switch the active team.
    ///
    /// Replaces the chat subscription (never the notification one),
    /// clears the chat view, invalidates and aborts in-flight fetches,
    /// and fetches fresh history and a fresh snapshot for the new team
    /// in the background.
    pub fn set_active_team(&self, team_id: impl Into<String>) {
        let team_id = team_id.into();
        info!("Switching active team to {}", team_id);

        self.generation.bump();
        self.abort_fetches();

        self.registry.set_active_team(team_id.as_str());
        self.session.set_selected_team(&team_id);
        self.chat.set_active_team(team_id.as_str());

        let token = self.session.bearer_token().unwrap_or_default();

        let api = self.api.clone();
        let chat = self.chat.clone();
        let fetch_errors = self.fetch_errors_tx.clone();
        let guard = self.generation.token();
        let team = team_id.clone();
        let auth = token.clone();
        let history = tokio::spawn(async move {
            match api.fetch_chat_history(&auth, &team).await {
                Ok(messages) if guard.is_current() => {
                    chat.load_history(&team, messages);
                }
                Ok(_) => debug!("Discarding history fetched for a superseded team"),
                Err(e) => {
                    warn!("Chat history fetch for team {} failed: {}", team, e);
                    let _ = fetch_errors.send(e);
                }
            }
        });
        *self.history_fetch.lock().unwrap() = Some(history);

        let api = self.api.clone();
        let notifications = self.notifications.clone();
        let fetch_errors = self.fetch_errors_tx.clone();
        let guard = self.generation.token();
        let team = team_id;
        let snapshot = tokio::spawn(async move {
            match api.fetch_assigned_tasks(&token, &team).await {
                Ok(tasks) if guard.is_current() => {
                    let records = tasks.iter().map(NotificationRecord::from_task).collect();
                    notifications.load_snapshot(records);
                }
                Ok(_) => debug!("Discarding snapshot fetched for a superseded team"),
                Err(e) => {
                    warn!("Snapshot fetch for team {} failed: {}", team, e);
                    let _ = fetch_errors.send(e);
                }
            }
        });
        *self.snapshot_fetch.lock().unwrap() = Some(snapshot);
    }

    /// Tear down the session: invalidate and abort fetches, close the
    /// connection, clear the stores and the persisted session state.
    pub fn logout(&self) {
        info!("Logging out; tearing down sync state");
        self.generation.bump();
        self.abort_fetches();
        self.conn.close();
        self.notifications.clear();
        self.chat.clear();
        self.registry.reset();
        self.session.clear();
    }

    /// Cancel in-flight fetches so the network resource is freed, not
    /// merely ignored. Aborted fetches report nothing.
    fn abort_fetches(&self) {
        for slot in [&self.history_fetch, &self.snapshot_fetch] {
            if let Some(handle) = slot.lock().unwrap().take() {
                handle.abort();
            }
        }
    }

    /// Take the receiver for background fetch failures. Yields `None`
    /// after the first call.
    pub fn fetch_errors(&self) -> Option<mpsc::UnboundedReceiver<ApiError>> {
        self.fetch_errors_rx.lock().unwrap().take()
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.conn
    }

    pub fn notifications(&self) -> &ReconciliationStore {
        &self.notifications
    }

    pub fn chat(&self) -> &ChatChannel {
        &self.chat
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
