//! Shared test helpers: a loopback HR server stub and app wiring.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Value, json};
use uuid::Uuid;

use hrdesk_core::config::{ApiConfig, AppConfig, SessionConfig};
use hrdesk_entity::{Role, TokenClaims};
use hrdesk_session::SessionController;
use hrdesk_store::{CredentialStore, MemoryCredentialStore};

const SECRET: &[u8] = b"stub-signing-secret";
const REFRESH_TTL_SECONDS: i64 = 7 * 24 * 3600;

/// A registered account on the stub server.
#[derive(Debug, Clone)]
struct StubUser {
    password: String,
    role: Role,
    employee_id: String,
}

/// Mutable stub state shared by all handlers.
#[derive(Default)]
pub struct StubState {
    users: Mutex<HashMap<String, StubUser>>,
    /// username -> the one session the server considers active.
    active: Mutex<HashMap<String, Uuid>>,
    /// Sessions explicitly killed server-side.
    revoked: Mutex<HashSet<Uuid>>,
    /// Access tokens handed out since the last `expire_issued_tokens`.
    issued: Mutex<Vec<String>>,
    /// Access tokens the server now rejects as expired.
    retired: Mutex<HashSet<String>>,
    /// Lifetime of newly minted access tokens.
    token_ttl_seconds: AtomicI64,
    /// When set, the refresh endpoint answers 500.
    fail_refresh: AtomicBool,
    /// When set, login reports an identity that does not match the token.
    corrupt_identity: AtomicBool,
    /// Artificial latency on the refresh endpoint.
    refresh_delay_ms: AtomicU64,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub data_calls: AtomicUsize,
}

/// An HR server stub listening on a real loopback socket.
pub struct StubServer {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl StubServer {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(StubState {
            token_ttl_seconds: AtomicI64::new(900),
            ..StubState::default()
        });

        let router = Router::new()
            .route("/api/login", post(login))
            .route("/api/logout", post(logout))
            .route("/api/token/refresh", post(refresh))
            .route("/api/session/validate", get(validate))
            .route("/api/echo", get(echo))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve stub");
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn add_user(&self, username: &str, password: &str, role: Role) {
        let employee_id = format!("VES{:03}", self.state.users.lock().unwrap().len() + 1);
        self.state.users.lock().unwrap().insert(
            username.to_string(),
            StubUser {
                password: password.to_string(),
                role,
                employee_id,
            },
        );
    }

    /// The session the server currently considers active for a username.
    pub fn active_session(&self, username: &str) -> Option<Uuid> {
        self.state.active.lock().unwrap().get(username).copied()
    }

    /// Kill a session server-side; its tokens are rejected with the
    /// revoked flag from now on.
    pub fn revoke_session(&self, session_id: Uuid) {
        self.state.revoked.lock().unwrap().insert(session_id);
    }

    /// Reject every access token issued so far as expired. Tokens minted
    /// afterwards (e.g. by a refresh) are unaffected.
    pub fn expire_issued_tokens(&self) {
        let mut issued = self.state.issued.lock().unwrap();
        let mut retired = self.state.retired.lock().unwrap();
        retired.extend(issued.drain(..));
    }

    pub fn set_token_ttl(&self, seconds: i64) {
        self.state.token_ttl_seconds.store(seconds, Ordering::SeqCst);
    }

    pub fn set_fail_refresh(&self, fail: bool) {
        self.state.fail_refresh.store(fail, Ordering::SeqCst);
    }

    /// Make login announce an identity other than the token's subject.
    pub fn set_corrupt_identity(&self, corrupt: bool) {
        self.state.corrupt_identity.store(corrupt, Ordering::SeqCst);
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        self.state
            .refresh_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.state.validate_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.state.data_calls.load(Ordering::SeqCst)
    }
}

fn mint_access(state: &StubState, sub: &str, role: Role, session_id: Uuid) -> String {
    let ttl = state.token_ttl_seconds.load(Ordering::SeqCst);
    let token = mint(sub, role, session_id, ttl);
    state.issued.lock().unwrap().push(token.clone());
    token
}

fn mint(sub: &str, role: Role, session_id: Uuid, ttl_seconds: i64) -> String {
    // A serial in the header keeps every minted token distinct even when
    // two are minted for one session within the same second; the retired
    // set is keyed by token string and must not conflate them.
    static SERIAL: AtomicU64 = AtomicU64::new(0);
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: sub.to_string(),
        role,
        session_id,
        iat: now,
        exp: now + ttl_seconds,
    };
    let mut header = Header::default();
    header.kid = Some(SERIAL.fetch_add(1, Ordering::SeqCst).to_string());
    encode(&header, &claims, &EncodingKey::from_secret(SECRET)).expect("mint token")
}

type Reply = (StatusCode, Json<Value>);

fn unauthorized(message: &str) -> Reply {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

fn revoked_reply() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Token has been revoked. Please login again.", "revoked": true })),
    )
}

/// Validate a bearer token the way the real server does: revocation and
/// takeover are reported before expiry.
fn authorize(state: &StubState, headers: &HeaderMap) -> Result<TokenClaims, Reply> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing authorization"))?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(SECRET), &validation)
        .map_err(|_| unauthorized("Invalid token"))?
        .claims;

    if state.revoked.lock().unwrap().contains(&claims.session_id) {
        return Err(revoked_reply());
    }
    if state.active.lock().unwrap().get(&claims.sub) != Some(&claims.session_id) {
        return Err(revoked_reply());
    }
    if state.retired.lock().unwrap().contains(token) || claims.exp < Utc::now().timestamp() {
        return Err(unauthorized("Token expired"));
    }
    Ok(claims)
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Reply {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let username = body
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let force_login = body
        .get("force_login")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let Some(user) = state.users.lock().unwrap().get(&username).cloned() else {
        return unauthorized("Invalid username or password");
    };
    if user.password != password {
        return unauthorized("Invalid username or password");
    }

    let session_id = {
        let mut active = state.active.lock().unwrap();
        if let Some(previous) = active.get(&username).copied() {
            if !force_login {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "Already logged in",
                        "already_logged_in": true,
                        "message": "This account is already logged in on another device",
                    })),
                );
            }
            state.revoked.lock().unwrap().insert(previous);
        }
        let session_id = Uuid::new_v4();
        active.insert(username.clone(), session_id);
        session_id
    };

    let access_token = mint_access(&state, &username, user.role, session_id);
    let refresh_token = mint(&username, user.role, session_id, REFRESH_TTL_SECONDS);
    let ttl = state.token_ttl_seconds.load(Ordering::SeqCst);
    let announced = if state.corrupt_identity.load(Ordering::SeqCst) {
        format!("{username}-imposter")
    } else {
        username.clone()
    };

    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": ttl.max(0),
            "session_id": session_id,
            "identity": {
                "username": announced,
                "role": user.role,
                "employee_id": user.employee_id,
                "name": announced,
            },
        })),
    )
}

async fn logout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Reply {
    match authorize(&state, &headers) {
        Ok(claims) => {
            let mut active = state.active.lock().unwrap();
            if active.get(&claims.sub) == Some(&claims.session_id) {
                active.remove(&claims.sub);
            }
            (StatusCode::OK, Json(json!({ "message": "Logged out" })))
        }
        Err(rejection) => rejection,
    }
}

async fn refresh(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Reply {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if state.fail_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Refresh unavailable" })),
        );
    }

    match authorize(&state, &headers) {
        Ok(claims) => {
            let token = mint_access(&state, &claims.sub, claims.role, claims.session_id);
            (StatusCode::OK, Json(json!({ "access_token": token })))
        }
        Err(rejection) => rejection,
    }
}

async fn validate(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Reply {
    state.validate_calls.fetch_add(1, Ordering::SeqCst);
    match authorize(&state, &headers) {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(rejection) => rejection,
    }
}

async fn echo(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Reply {
    state.data_calls.fetch_add(1, Ordering::SeqCst);
    match authorize(&state, &headers) {
        Ok(claims) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "username": claims.sub })),
        ),
        Err(rejection) => rejection,
    }
}

/// Test application context: one stub server plus a credential store that
/// every controller built from this context shares, like browser tabs
/// sharing one profile.
pub struct TestApp {
    pub server: StubServer,
    pub store: Arc<MemoryCredentialStore>,
    config: AppConfig,
}

impl TestApp {
    /// Start a stub server with a short heartbeat interval suitable for
    /// real-time tests.
    pub async fn new() -> Self {
        let server = StubServer::start().await;
        let config = AppConfig {
            api: ApiConfig {
                base_url: server.base_url(),
                timeout_seconds: 5,
            },
            session: SessionConfig {
                heartbeat_interval_ms: 100,
                expiry_margin_seconds: 30,
                login_route: "/login".to_string(),
            },
            ..AppConfig::default()
        };
        Self {
            server,
            store: Arc::new(MemoryCredentialStore::new()),
            config,
        }
    }

    /// A controller sharing this app's credential store (a "tab").
    pub fn controller(&self) -> SessionController {
        self.controller_with_store(self.store.clone())
    }

    /// A controller over its own empty store (a separate device).
    pub fn detached_controller(&self) -> SessionController {
        self.controller_with_store(Arc::new(MemoryCredentialStore::new()))
    }

    fn controller_with_store(&self, store: Arc<MemoryCredentialStore>) -> SessionController {
        let api = hrdesk_api::ApiClient::new(&self.config.api).expect("build api client");
        let store: Arc<dyn CredentialStore> = store;
        SessionController::new(api, store, self.config.session.clone())
    }
}
