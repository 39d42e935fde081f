//! Session state machine.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tv_session_core::{
    CapabilitySource, ConfigError, Notice, Notifier, SessionConfig, StorageMode, Store,
    traits::{KeyValueStore, LoginClient, LoginResponse, StorageError},
};

use crate::credentials::{CredentialStore, CredentialToken};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No status check has completed yet.
    #[default]
    Unknown,
    LoggedOut,
    /// Implicit login in flight.
    Authenticating,
    LoggedIn,
}

/// Reactive session state observed by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Presentation flag; set by logout and by the UI, not derived from `phase`.
    pub login_modal_visible: bool,
}

impl SessionState {
    /// Gate for login-only UI.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self.phase, SessionPhase::LoggedIn)
    }
}

/// Terminal result of one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No backend base URL configured.
    NoBackend,
    /// Backend reported no usable storage mode. State is left unchanged.
    CapabilityUnavailable,
    /// A session token is held.
    Authenticated,
    /// No session, including declined or failed implicit logins.
    Unauthenticated,
    /// The stored session was refused and has been invalidated.
    Unauthorized,
    /// Unexpected failure. The stored token is kept for a later retry.
    TransientFailure(String),
    /// A newer check or a logout started while the implicit login was in
    /// flight. Its result was discarded, and a token it wrote after a
    /// logout was removed again.
    Superseded,
}

impl From<StorageError> for CheckOutcome {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unauthorized => Self::Unauthorized,
            other => Self::TransientFailure(other.to_string()),
        }
    }
}

/// Decides whether the user holds a session against the configured backend
/// and publishes the result as reactive state.
///
/// Nothing here returns an error: every failure resolves into a state,
/// plus at most one transient notice.
pub struct SessionManager<S, L>
where
    S: KeyValueStore,
    L: LoginClient,
{
    credentials: CredentialStore<S>,
    login: L,
    capabilities: Arc<dyn CapabilitySource>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    state: Store<SessionState>,
    latest_check: AtomicU64,
    last_logout: AtomicU64,
}

impl<S, L> SessionManager<S, L>
where
    S: KeyValueStore,
    L: LoginClient,
{
    /// Create a session manager with the default configuration.
    #[must_use]
    pub fn new(
        store: S,
        login: L,
        capabilities: Arc<dyn CapabilitySource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::build(store, login, capabilities, notifier, SessionConfig::default())
    }

    /// Create a session manager with an explicit configuration.
    ///
    /// # Errors
    /// Returns error if the configuration fails [`SessionConfig::validate`].
    pub fn with_config(
        store: S,
        login: L,
        capabilities: Arc<dyn CapabilitySource>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, login, capabilities, notifier, config))
    }

    fn build(
        store: S,
        login: L,
        capabilities: Arc<dyn CapabilitySource>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        Self {
            credentials: CredentialStore::with_key(store, config.token_key.clone()),
            login,
            capabilities,
            notifier,
            config,
            state: Store::default(),
            latest_check: AtomicU64::new(0),
            last_logout: AtomicU64::new(0),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.snapshot()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.read(SessionState::is_logged_in)
    }

    #[must_use]
    pub fn is_login_modal_visible(&self) -> bool {
        self.state.read(|s| s.login_modal_visible)
    }

    /// Receiver for state changes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The underlying reactive store, for stream consumers.
    #[must_use]
    pub const fn store(&self) -> &Store<SessionState> {
        &self.state
    }

    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn show_login_modal(&self) {
        self.state.update(|s| s.login_modal_visible = true);
    }

    pub fn hide_login_modal(&self) {
        self.state.update(|s| s.login_modal_visible = false);
    }

    /// Re-evaluate the session against the backend at `api_base_url`.
    ///
    /// Call on app foreground and whenever the backend settings change.
    /// Overlapping calls are not serialized. With `drop_stale_results`
    /// enabled only the most recently started call may publish its state;
    /// otherwise whichever call finishes last wins. A superseded implicit
    /// login does not persist its token.
    ///
    /// A backend without a usable storage mode only raises a notice. Such a
    /// check publishes nothing, so it does not supersede one in flight.
    pub async fn check_login_status(&self, api_base_url: Option<&str>) -> CheckOutcome {
        let mode = match api_base_url.filter(|url| !url.trim().is_empty()) {
            Some(base_url) => {
                let Some(mode) = self.storage_mode(base_url) else {
                    self.notifier
                        .notify(Notice::error(self.config.capability_notice.clone()));
                    return CheckOutcome::CapabilityUnavailable;
                };
                Some(mode)
            }
            None => None,
        };

        let ticket = self.latest_check.fetch_add(1, Ordering::SeqCst) + 1;
        let outcome = match mode {
            Some(mode) => self.evaluate(mode, ticket).await,
            None => CheckOutcome::NoBackend,
        };
        self.apply(ticket, &outcome).await;
        outcome
    }

    /// Forget the session and ask the UI to show the login prompt.
    ///
    /// Always takes effect, even if the token cannot be removed; the
    /// failure is only logged. Any status check still in flight is
    /// superseded.
    pub async fn logout(&self) {
        let ticket = self.latest_check.fetch_add(1, Ordering::SeqCst) + 1;
        self.last_logout.fetch_max(ticket, Ordering::SeqCst);
        self.invalidate_token().await;
        self.state.update(|s| {
            s.phase = SessionPhase::LoggedOut;
            s.login_modal_visible = true;
        });
    }

    fn storage_mode(&self, base_url: &str) -> Option<StorageMode> {
        let mode = self
            .capabilities
            .descriptor(base_url)
            .and_then(|desc| desc.storage_mode());
        if mode.is_none() {
            warn!(base_url, "Backend capability descriptor has no storage mode");
        }
        mode
    }

    async fn evaluate(&self, mode: StorageMode, ticket: u64) -> CheckOutcome {
        let token = match self.credentials.load().await {
            Ok(token) => token,
            Err(e) => return e.into(),
        };

        match (mode, token) {
            (StorageMode::LocalStorage, None) => self.implicit_login(ticket).await,
            (_, Some(_)) => CheckOutcome::Authenticated,
            (StorageMode::Other(_), None) => CheckOutcome::Unauthenticated,
        }
    }

    async fn implicit_login(&self, ticket: u64) -> CheckOutcome {
        self.settle(ticket, SessionPhase::Authenticating);

        match self.login.login().await {
            Ok(LoginResponse { ok: true, .. }) if self.is_stale(ticket) => {
                debug!(ticket, "Discarding login result of superseded check");
                CheckOutcome::Superseded
            }
            Ok(LoginResponse { ok: true, token }) => {
                let token = token
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| self.config.session_marker.clone());
                if let Err(e) = self.credentials.save(&CredentialToken::new(token)).await {
                    return e.into();
                }
                // A logout may have landed while the token was being written.
                if self.logged_out_since(ticket) {
                    debug!(ticket, "Logout raced the token write, clearing it");
                    self.invalidate_token().await;
                    return CheckOutcome::Superseded;
                }
                if self.is_stale(ticket) {
                    return CheckOutcome::Superseded;
                }
                CheckOutcome::Authenticated
            }
            Ok(_) => {
                debug!("Backend declined implicit login");
                CheckOutcome::Unauthenticated
            }
            Err(e) => {
                debug!(error = %e, "Implicit login failed");
                CheckOutcome::Unauthenticated
            }
        }
    }

    async fn apply(&self, ticket: u64, outcome: &CheckOutcome) {
        match outcome {
            CheckOutcome::NoBackend | CheckOutcome::Unauthenticated => {
                self.settle(ticket, SessionPhase::LoggedOut);
            }
            CheckOutcome::Authenticated => {
                self.settle(ticket, SessionPhase::LoggedIn);
            }
            CheckOutcome::Unauthorized => {
                info!("Session refused as unauthorized, clearing token");
                self.invalidate_token().await;
                self.settle(ticket, SessionPhase::LoggedOut);
            }
            CheckOutcome::TransientFailure(reason) => {
                info!(%reason, "Failed to check login status");
                self.settle(ticket, SessionPhase::LoggedOut);
            }
            CheckOutcome::CapabilityUnavailable | CheckOutcome::Superseded => {}
        }
    }

    /// Publish `phase` unless a newer check or a logout has started since
    /// `ticket` was taken.
    fn settle(&self, ticket: u64, phase: SessionPhase) -> bool {
        if self.is_stale(ticket) {
            debug!(ticket, ?phase, "Dropping stale status check result");
            return false;
        }
        self.state.update(|s| s.phase = phase)
    }

    fn is_stale(&self, ticket: u64) -> bool {
        self.config.drop_stale_results && self.latest_check.load(Ordering::SeqCst) != ticket
    }

    fn logged_out_since(&self, ticket: u64) -> bool {
        self.config.drop_stale_results && self.last_logout.load(Ordering::SeqCst) > ticket
    }

    async fn invalidate_token(&self) {
        let Err(e) = self.credentials.clear().await else {
            return;
        };
        info!(error = %e, "Failed to remove session token, blanking it instead");
        if let Err(e) = self.credentials.blank().await {
            info!(error = %e, "Failed to blank session token");
        }
    }
}
