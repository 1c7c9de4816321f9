//! Shared harness for flow tests: every service wired over the in-memory
//! store, a manual clock, and a recording mailer.

// Each integration-test binary compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use gatehouse_auth::lockout::LockoutPolicy;
use gatehouse_auth::password::{PasswordHasher, PasswordPolicy};
use gatehouse_auth::session::SessionRegistry;
use gatehouse_auth::token::{TokenDecoder, TokenEncoder};
use gatehouse_core::config::audit::AuditConfig;
use gatehouse_core::config::auth::AuthConfig;
use gatehouse_core::result::AppResult;
use gatehouse_core::traits::{Clock, Mailer, ManualClock};
use gatehouse_core::types::RequestMeta;
use gatehouse_database::MemoryStore;
use gatehouse_entity::user::{Role, User};
use gatehouse_service::auth::LoginOutcome;
use gatehouse_service::user::admin::CreateUserRequest;
use gatehouse_service::{
    AdminUserService, AuditService, AuthService, RequestContext, UserService,
};

/// A mailer that records issued tokens and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub reset_tokens: Mutex<Vec<(String, String)>>,
    pub verification_tokens: Mutex<Vec<(String, String)>>,
    pub failing: AtomicBool,
}

impl RecordingMailer {
    pub fn last_reset_token(&self) -> Option<String> {
        self.reset_tokens
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }

    pub fn last_verification_token(&self) -> Option<String> {
        self.verification_tokens
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, recipient: &str, token: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(gatehouse_core::AppError::internal("smtp unreachable"));
        }
        self.reset_tokens
            .lock()
            .unwrap()
            .push((recipient.to_string(), token.to_string()));
        Ok(())
    }

    async fn send_email_verification(&self, recipient: &str, token: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(gatehouse_core::AppError::internal("smtp unreachable"));
        }
        self.verification_tokens
            .lock()
            .unwrap()
            .push((recipient.to_string(), token.to_string()));
        Ok(())
    }
}

/// Every service wired over shared fakes.
pub struct TestApp {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub mailer: Arc<RecordingMailer>,
    pub hasher: Arc<PasswordHasher>,
    pub auth: AuthService,
    pub users: UserService,
    pub admin: AdminUserService,
    pub audit: Arc<AuditService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_audit_config(AuditConfig::default())
    }

    pub fn with_audit_config(audit_config: AuditConfig) -> Self {
        let config = test_auth_config();
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let mailer = Arc::new(RecordingMailer::default());

        let hasher = Arc::new(PasswordHasher::new(&config).unwrap());
        let password_policy = PasswordPolicy::new(&config);
        let lockout = LockoutPolicy::new(&config);
        let encoder = Arc::new(TokenEncoder::new(&config, clock_dyn.clone()));
        let decoder = Arc::new(TokenDecoder::new(&config, clock_dyn.clone()));

        let registry = Arc::new(SessionRegistry::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            encoder.clone(),
            decoder.clone(),
            clock_dyn.clone(),
        ));

        let audit = Arc::new(AuditService::new(
            Arc::new(store.clone()),
            clock_dyn.clone(),
            audit_config,
        ));

        let auth = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            registry.clone(),
            hasher.clone(),
            password_policy.clone(),
            lockout,
            encoder,
            decoder,
            audit.clone(),
            mailer.clone(),
            clock_dyn.clone(),
        );
        let users = UserService::new(
            Arc::new(store.clone()),
            registry.clone(),
            hasher.clone(),
            password_policy.clone(),
            audit.clone(),
            clock_dyn.clone(),
        );
        let admin = AdminUserService::new(
            Arc::new(store.clone()),
            hasher.clone(),
            password_policy,
            audit.clone(),
            clock_dyn.clone(),
        );

        Self {
            store,
            clock,
            mailer,
            hasher,
            auth,
            users,
            admin,
            audit,
        }
    }

    /// Inserts a user directly into the store.
    pub async fn create_user(&self, email: &str, password: &str, role: Role) -> User {
        use gatehouse_database::stores::UserStore;

        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            password_hash: self.hasher.hash(password).unwrap(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar_url: None,
            role,
            is_active: true,
            is_verified: false,
            is_locked: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            password_changed_at: now,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.create(&user).await.unwrap();
        user
    }

    /// Fetches the current row for a user.
    pub async fn reload(&self, user_id: Uuid) -> User {
        use gatehouse_database::stores::UserStore;
        self.store.find_by_id(user_id).await.unwrap().unwrap()
    }

    /// Logs in and panics on failure.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.auth
            .login(email, password, false, &RequestMeta::default())
            .await
            .expect("login should succeed")
    }

    /// Builds a request context for an already-authenticated user.
    pub fn ctx_for(&self, user: &User) -> RequestContext {
        RequestContext {
            user_id: user.id,
            session_id: Uuid::new_v4(),
            role: user.role,
            email: user.email.clone(),
            meta: RequestMeta::default(),
            request_time: self.clock.now(),
        }
    }

    /// Builds a request context from a real login's access token.
    pub async fn ctx_from_login(&self, outcome: &LoginOutcome) -> RequestContext {
        let (claims, _user) = self
            .auth
            .verify_access_token(&outcome.tokens.access_token)
            .await
            .expect("access token should verify");
        RequestContext::from_claims(&claims, RequestMeta::default(), self.clock.now()).unwrap()
    }
}

/// Standard create-user request for admin tests.
pub fn create_request(email: &str, role: Role) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: "Str0ng!Pw".to_string(),
        first_name: "New".to_string(),
        last_name: "Account".to_string(),
        role,
    }
}

/// Auth configuration with fast hashing for tests.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    }
}
