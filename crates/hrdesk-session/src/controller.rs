//! Session lifecycle controller — login, logout, dispatch, refresh, and
//! revocation flows.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use hrdesk_api::{ApiClient, LoginRequest, LoginResponse, VALIDATE_PATH};
use hrdesk_core::config::SessionConfig;
use hrdesk_core::events::{EventBus, RevocationReason, SessionEvent};
use hrdesk_core::{AppError, AppResult, ErrorKind};
use hrdesk_entity::{AuthState, Credential, Identity, TokenClaims};
use hrdesk_store::{CredentialStore, StoredCredential, TabId};

use crate::authenticator::RequestAuthenticator;
use crate::context::SessionContext;
use crate::heartbeat::HeartbeatMonitor;
use crate::rbac::{AccessRequest, RbacGate};
use crate::refresh::{RefreshCoordinator, RefreshRole};
use crate::watcher::{PeerOverwriteWatcher, RevocationGuard};

/// Result of a login attempt that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A session was established for this identity.
    LoggedIn(Identity),
    /// The account already holds a session elsewhere. No state changed;
    /// the caller may retry with `force_login` to take the session over.
    AlreadyActiveElsewhere,
}

/// Body shape of one dispatched request.
enum Payload<'a> {
    Get,
    Post(&'a serde_json::Value),
}

struct ControllerInner {
    /// This tab's identity and auth state.
    context: Arc<SessionContext>,
    /// Shared credential store (shared between tabs of one profile).
    store: Arc<dyn CredentialStore>,
    /// Backend HTTP client.
    api: ApiClient,
    /// Credential resolution for outgoing calls.
    authenticator: RequestAuthenticator,
    /// Single-flight refresh coordination.
    refresh: RefreshCoordinator,
    /// One-shot teardown guard per session.
    guard: RevocationGuard,
    /// Lifecycle event fan-out.
    events: EventBus,
    /// Route and permission gating.
    gate: RbacGate,
    /// Session tuning.
    config: SessionConfig,
    /// Cancel handle for the background tasks of the current session.
    tasks: Mutex<Option<watch::Sender<bool>>>,
}

/// Manages the complete client-side session lifecycle for one tab.
///
/// The controller is the only writer of session state and of this tab's
/// entries in the credential store. Everything else observes: the UI via
/// the event bus, peer tabs via store change notifications.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<ControllerInner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("tab_id", &self.inner.context.tab_id())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl SessionController {
    /// Creates a controller over the given API client and credential store.
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>, config: SessionConfig) -> Self {
        let context = Arc::new(SessionContext::new());
        let authenticator = RequestAuthenticator::new(context.clone(), store.clone());
        Self {
            inner: Arc::new(ControllerInner {
                context,
                store,
                api,
                authenticator,
                refresh: RefreshCoordinator::new(),
                guard: RevocationGuard::new(),
                events: EventBus::new(),
                gate: RbacGate::new(),
                config,
                tasks: Mutex::new(None),
            }),
        }
    }

    /// Performs the complete login flow:
    ///
    /// 1. Validate input
    /// 2. POST /login; a conflict means the account is active elsewhere
    ///    and is reported as an outcome, not an error
    /// 3. Decode the access token and cross-check its claims against the
    ///    announced identity and session id
    /// 4. Persist the credential so peer tabs observe the takeover
    /// 5. Activate the session, re-arm revocation, start background tasks
    ///
    /// Any failure after step 1 leaves the tab signed out.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        force_login: bool,
    ) -> AppResult<LoginOutcome> {
        // Step 1: Validate input
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        self.inner.context.set_state(AuthState::Authenticating).await;

        // Step 2: Authenticate against the backend
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            force_login,
        };
        let response = match self.inner.api.login(&request).await {
            Ok(response) => response,
            Err(e) if e.kind == ErrorKind::Conflict => {
                self.inner.context.set_state(AuthState::SignedOut).await;
                info!(username, "Account already holds a session elsewhere");
                return Ok(LoginOutcome::AlreadyActiveElsewhere);
            }
            Err(e) => {
                self.inner.context.set_state(AuthState::SignedOut).await;
                return Err(e);
            }
        };

        // Steps 3-5
        match self.activate(response).await {
            Ok(identity) => Ok(LoginOutcome::LoggedIn(identity)),
            Err(e) => {
                self.inner.context.set_state(AuthState::SignedOut).await;
                Err(e)
            }
        }
    }

    /// Validate a login response, persist it, and bring the session up.
    async fn activate(&self, response: LoginResponse) -> AppResult<Identity> {
        // Step 3: Cross-check the token against the announced identity
        let claims = TokenClaims::decode_unverified(&response.access_token)?;
        claims.verify_matches(&response.identity, response.session_id)?;

        let credential = Credential {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: claims.expires_at(),
            session_id: response.session_id,
        };
        let identity = response.identity;
        let session_id = credential.session_id;

        // Step 4: Persist before activating. A peer tab signed in to the
        // same account sees this foreign write and revokes itself.
        let record = StoredCredential::new(identity.clone(), credential.clone());
        self.inner
            .store
            .put(&identity.username, &record, self.inner.context.tab_id())
            .await?;

        // Step 5: Activate and start background tasks
        self.inner
            .context
            .set_state(AuthState::Active {
                identity: identity.clone(),
                credential,
            })
            .await;
        self.inner.guard.rearm();
        self.spawn_background_tasks(&identity).await;

        self.inner.events.publish(SessionEvent::LoggedIn {
            username: identity.username.clone(),
            role: identity.role.to_string(),
            session_id,
        });
        info!(
            username = %identity.username,
            role = %identity.role,
            session_id = %session_id,
            "Login successful"
        );
        Ok(identity)
    }

    /// Performs the complete logout flow:
    ///
    /// 1. Stop background tasks
    /// 2. Fail any in-flight refresh
    /// 3. Best-effort server-side invalidation
    /// 4. Remove the stored credential if it still belongs to this session
    /// 5. Return to the signed-out state
    ///
    /// Idempotent: logging out without a session just normalizes the state.
    pub async fn logout(&self) -> AppResult<()> {
        let state = self.inner.context.state().await;
        let Some(identity) = state.identity().cloned() else {
            self.inner.context.set_state(AuthState::SignedOut).await;
            return Ok(());
        };
        let credential = state.credential().cloned();

        info!(username = %identity.username, "Processing logout");

        // Step 1: Stop background tasks
        self.stop_background_tasks().await;

        // Step 2: Fail any in-flight refresh
        self.inner
            .refresh
            .abort_all(AppError::session("Session closed"))
            .await;

        // Step 3: Best-effort server-side invalidation
        if let Some(credential) = &credential {
            if let Err(e) = self.inner.api.logout(&credential.access_token).await {
                warn!(
                    username = %identity.username,
                    error = %e,
                    "Server-side logout failed; clearing locally anyway"
                );
            }
        }

        // Step 4: Remove the stored credential when it is still ours
        if let Some(credential) = &credential {
            self.remove_if_same_session(&identity.username, credential.session_id)
                .await;
        }

        // Step 5: Back to signed out
        self.inner.context.set_state(AuthState::SignedOut).await;
        self.inner.events.publish(SessionEvent::LoggedOut {
            username: identity.username.clone(),
        });
        info!(username = %identity.username, "Logout completed");
        Ok(())
    }

    /// Authenticated GET through the session dispatch pipeline.
    pub async fn get(&self, path: &str) -> AppResult<serde_json::Value> {
        self.dispatch(path, Payload::Get).await
    }

    /// Authenticated POST through the session dispatch pipeline.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> AppResult<serde_json::Value> {
        self.dispatch(path, Payload::Post(body)).await
    }

    /// One heartbeat probe. Runs through the full dispatch path so expiry
    /// refresh and revocation handling apply to probes like any other call.
    pub async fn validate_session(&self) -> AppResult<()> {
        self.get(VALIDATE_PATH).await.map(|_| ())
    }

    /// Sends one authenticated request, handling expiry around it:
    ///
    /// 1. Refuse outright when this tab has been revoked
    /// 2. Resolve a credential (live session first, then the shared store)
    /// 3. Refresh up front when a live credential is at the expiry margin
    /// 4. Send; when a live credential is rejected as expired, recover
    ///    once and replay
    /// 5. Escalate a revocation signal from any response
    ///
    /// Cold credentials (adopted from the store without a live session)
    /// are presented as-is; only a live session refreshes.
    async fn dispatch(&self, path: &str, payload: Payload<'_>) -> AppResult<serde_json::Value> {
        // Step 1: A revoked tab stays quiet until a new login
        if self.inner.context.state().await.is_revoked() {
            return Err(AppError::revoked("Session has been revoked"));
        }

        // Step 2: Resolve the credential for this call
        let resolved = self.inner.authenticator.resolve().await;

        // Step 3: Proactive refresh for live credentials near expiry
        let resolved = match resolved {
            Some(mut resolved)
                if !resolved.cold
                    && resolved
                        .credential
                        .is_expired(self.inner.config.expiry_margin_seconds) =>
            {
                debug!(path, "Access token at expiry margin; refreshing before send");
                resolved.credential = self.refresh_and_wait().await?;
                Some(resolved)
            }
            other => other,
        };

        // Step 4: Send
        let bearer = resolved
            .as_ref()
            .map(|resolved| resolved.credential.access_token.clone());
        let err = match self.send(path, &payload, bearer.as_deref()).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        match err.kind {
            ErrorKind::Expired => {
                // Replay once after recovering, live sessions only.
                let Some(resolved) = resolved.filter(|resolved| !resolved.cold) else {
                    return Err(err);
                };
                let recovered = self
                    .recover_expired(&resolved.credential.access_token)
                    .await?;
                match self
                    .send(path, &payload, Some(&recovered.access_token))
                    .await
                {
                    Ok(value) => Ok(value),
                    Err(e) if e.kind == ErrorKind::Revoked => {
                        self.revoke(RevocationReason::ServerSignal).await;
                        Err(e)
                    }
                    Err(e) => Err(e),
                }
            }
            ErrorKind::Revoked => {
                // Step 5: The server killed this session
                self.revoke(RevocationReason::ServerSignal).await;
                Err(err)
            }
            _ => Err(err),
        }
    }

    async fn send(
        &self,
        path: &str,
        payload: &Payload<'_>,
        bearer: Option<&str>,
    ) -> AppResult<serde_json::Value> {
        match payload {
            Payload::Get => self.inner.api.get(path, bearer).await,
            Payload::Post(body) => self.inner.api.post(path, body, bearer).await,
        }
    }

    /// Recover from an expired-token rejection on the live session. When
    /// the token in state already differs from the one that failed, a
    /// concurrent caller refreshed in the meantime and its result is used
    /// directly; otherwise join or lead a refresh round.
    async fn recover_expired(&self, failed_token: &str) -> AppResult<Credential> {
        if let Some(current) = self.inner.context.credential().await {
            if current.access_token != failed_token {
                debug!("Token already renewed by a concurrent caller");
                return Ok(current);
            }
        }
        self.refresh_and_wait().await
    }

    /// Obtain a renewed credential, collapsing concurrent callers into one
    /// network refresh.
    async fn refresh_and_wait(&self) -> AppResult<Credential> {
        match self.inner.refresh.begin().await {
            RefreshRole::Leader { generation } => self.lead_refresh(generation).await,
            RefreshRole::Follower(rx) => rx
                .await
                .map_err(|_| AppError::session("Refresh abandoned"))?,
        }
    }

    /// Leader side of a refresh round:
    ///
    /// 1. Move the session to Refreshing and snapshot the credential
    /// 2. POST /token/refresh with the refresh token
    /// 3. Cross-check the renewed token's claims
    /// 4. Deliver the outcome to followers; a fenced round means logout or
    ///    revocation won mid-flight and the result is discarded
    /// 5. Install the new credential, then persist it
    ///
    /// A refresh rejected for revocation revokes the session; any other
    /// refresh failure that still owns the round expires it.
    async fn lead_refresh(&self, generation: u64) -> AppResult<Credential> {
        // Step 1: Snapshot under the Refreshing state
        let Some((identity, current)) = self.inner.context.begin_refreshing().await else {
            let err = AppError::session("No active session to refresh");
            self.inner
                .refresh
                .complete(generation, Err(err.clone()))
                .await;
            return Err(err);
        };

        // Steps 2-3: Renew and validate
        match self.renew_credential(&identity, &current).await {
            Ok(credential) => {
                // Step 4: Followers first. The generation fence decides
                // whether this leader still owns the session.
                if !self
                    .inner
                    .refresh
                    .complete(generation, Ok(credential.clone()))
                    .await
                {
                    return Err(AppError::session("Session closed during refresh"));
                }
                // Step 5: Install; refused when logout or revocation
                // landed between the fence and here.
                if !self.inner.context.install_refreshed(credential.clone()).await {
                    return Err(AppError::session("Session closed during refresh"));
                }
                let record = StoredCredential::new(identity.clone(), credential.clone());
                if let Err(e) = self
                    .inner
                    .store
                    .put(&identity.username, &record, self.inner.context.tab_id())
                    .await
                {
                    warn!(
                        username = %identity.username,
                        error = %e,
                        "Failed to persist refreshed credential"
                    );
                }
                self.inner.events.publish(SessionEvent::TokenRefreshed {
                    username: identity.username.clone(),
                    expires_at: credential.expires_at,
                });
                info!(
                    username = %identity.username,
                    expires_at = %credential.expires_at,
                    "Access token refreshed"
                );
                Ok(credential)
            }
            Err(e) => {
                if !self.inner.refresh.complete(generation, Err(e.clone())).await {
                    // Logout or revocation already tore the session down.
                    return Err(e);
                }
                if e.kind == ErrorKind::Revoked {
                    self.revoke(RevocationReason::ServerSignal).await;
                } else {
                    self.expire_session(&identity, current.session_id).await;
                }
                Err(e)
            }
        }
    }

    /// Call the refresh endpoint and build the renewed credential. The
    /// refresh token and session id carry over; only the access token and
    /// its expiry change.
    async fn renew_credential(
        &self,
        identity: &Identity,
        current: &Credential,
    ) -> AppResult<Credential> {
        let response = self.inner.api.refresh(&current.refresh_token).await?;
        let claims = TokenClaims::decode_unverified(&response.access_token)?;
        claims.verify_matches(identity, current.session_id)?;
        Ok(Credential {
            access_token: response.access_token,
            refresh_token: current.refresh_token.clone(),
            expires_at: claims.expires_at(),
            session_id: current.session_id,
        })
    }

    /// Ends the session after an unrecoverable refresh failure. Unlike
    /// revocation this is not server-initiated; the tab simply could not
    /// renew its credential.
    async fn expire_session(&self, identity: &Identity, session_id: Uuid) {
        warn!(
            username = %identity.username,
            "Session expired: credential could not be renewed"
        );
        self.stop_background_tasks().await;
        self.inner.context.set_state(AuthState::Expired).await;
        self.remove_if_same_session(&identity.username, session_id).await;
        self.inner.events.publish(SessionEvent::SessionExpired {
            username: identity.username.clone(),
        });
        self.inner.events.publish(SessionEvent::RedirectScheduled {
            route: self.inner.config.login_route.clone(),
        });
    }

    /// Tears down the session after a revocation signal:
    ///
    /// 1. Claim the guard so concurrent signals tear down once
    /// 2. Stop background tasks and fail any in-flight refresh
    /// 3. Mark the tab revoked
    /// 4. For a server signal, clear the stored credential if it is still
    ///    this session's; a peer overwrite left the peer's record there
    ///    and it must not be touched
    /// 5. Announce the revocation and schedule the redirect
    pub async fn revoke(&self, reason: RevocationReason) {
        // Step 1: First signal wins
        if !self.inner.guard.try_claim() {
            return;
        }

        let state = self.inner.context.state().await;
        let identity = state.identity().cloned();
        let credential = state.credential().cloned();

        warn!(
            username = identity
                .as_ref()
                .map(|identity| identity.username.as_str())
                .unwrap_or("<none>"),
            reason = %reason,
            "Session revoked"
        );

        // Step 2: Stop tasks, fail any in-flight refresh
        self.stop_background_tasks().await;
        self.inner
            .refresh
            .abort_all(AppError::revoked("Session has been revoked"))
            .await;

        // Step 3: Terminal until the next login
        self.inner.context.set_state(AuthState::Revoked).await;

        // Step 4: Server signals clear our record
        if reason == RevocationReason::ServerSignal {
            if let (Some(identity), Some(credential)) = (&identity, &credential) {
                self.remove_if_same_session(&identity.username, credential.session_id)
                    .await;
            }
        }

        // Step 5: Announce
        if let Some(identity) = &identity {
            self.inner.events.publish(SessionEvent::SessionRevoked {
                username: identity.username.clone(),
                reason,
            });
        }
        self.inner.events.publish(SessionEvent::RedirectScheduled {
            route: self.inner.config.login_route.clone(),
        });
    }

    /// Delete the stored record only while it still carries this session's
    /// id. A peer tab that took the account over owns the record now.
    async fn remove_if_same_session(&self, username: &str, session_id: Uuid) {
        match self.inner.store.get(username).await {
            Ok(Some(record)) if record.session_id == session_id => {
                if let Err(e) = self
                    .inner
                    .store
                    .remove(username, self.inner.context.tab_id())
                    .await
                {
                    warn!(username, error = %e, "Failed to remove stored credential");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(username, error = %e, "Failed to read stored credential for cleanup");
            }
        }
    }

    /// Start the per-session background tasks: the peer-overwrite watcher
    /// for every role, and the heartbeat for roles limited to a single
    /// session. Replaces (and cancels) the previous session's tasks.
    async fn spawn_background_tasks(&self, identity: &Identity) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut tasks = self.inner.tasks.lock().await;
            if let Some(previous) = tasks.replace(cancel_tx) {
                let _ = previous.send(true);
            }
        }

        let watcher =
            PeerOverwriteWatcher::new(identity.username.clone(), self.inner.context.tab_id());
        let changes = self.inner.store.watch();
        let controller = self.clone();
        let watcher_cancel = cancel_rx.clone();
        tokio::spawn(async move {
            if watcher.wait(changes, watcher_cancel).await.is_some() {
                controller.revoke(RevocationReason::PeerTabOverwrite).await;
            }
        });

        if identity.role.requires_single_session() {
            let monitor = HeartbeatMonitor::from_millis(self.inner.config.heartbeat_interval_ms);
            let controller = self.clone();
            tokio::spawn(async move {
                monitor
                    .run(cancel_rx, move || {
                        let controller = controller.clone();
                        async move { controller.validate_session().await }
                    })
                    .await;
            });
            debug!(username = %identity.username, "Heartbeat monitor started");
        }
    }

    async fn stop_background_tasks(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        if let Some(cancel) = tasks.take() {
            let _ = cancel.send(true);
        }
    }

    /// Evaluate a route or feature gate against the current identity.
    pub async fn can_access(&self, request: &AccessRequest) -> bool {
        let role = self
            .inner
            .context
            .identity()
            .await
            .map(|identity| identity.role);
        self.inner.gate.can_access(role, request)
    }

    /// The identity of the current session, if any.
    pub async fn current_identity(&self) -> Option<Identity> {
        self.inner.context.identity().await
    }

    /// Snapshot of the current auth state.
    pub async fn state(&self) -> AuthState {
        self.inner.context.state().await
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// This tab's identifier.
    pub fn tab_id(&self) -> TabId {
        self.inner.context.tab_id()
    }

    /// The gate evaluating access requests, for permission queries.
    pub fn gate(&self) -> &RbacGate {
        &self.inner.gate
    }
}
