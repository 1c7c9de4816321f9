//! Gatehouse daemon — role-based authentication and user-management
//! backend.
//!
//! Wires the stores, the authentication core, and the service layer
//! together and runs the maintenance scheduler. The HTTP transport is an
//! external adapter around the services constructed here.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use gatehouse_auth::lockout::LockoutPolicy;
use gatehouse_auth::password::{PasswordHasher, PasswordPolicy};
use gatehouse_auth::session::{SessionCleanup, SessionRegistry};
use gatehouse_auth::token::{TokenDecoder, TokenEncoder};
use gatehouse_core::config::AppConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::traits::{Clock, SystemClock};
use gatehouse_database::repositories::{
    AuditLogRepository, PasswordResetRepository, SessionRepository, UserRepository,
};
use gatehouse_service::{
    AdminUserService, AuditService, AuthService, TracingMailer, UserService,
};
use gatehouse_worker::{MaintenanceJobs, MaintenanceScheduler};

#[tokio::main]
async fn main() {
    let env = std::env::var("GATEHOUSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    // ── Database connection + migrations ─────────────────────────
    let db = gatehouse_database::DatabasePool::connect(&config.database).await?;
    gatehouse_database::migration::run_migrations(db.pool()).await?;

    // ── Repositories ─────────────────────────────────────────────
    let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
    let session_repo = Arc::new(SessionRepository::new(db.pool().clone()));
    let reset_repo = Arc::new(PasswordResetRepository::new(db.pool().clone()));
    let audit_repo = Arc::new(AuditLogRepository::new(db.pool().clone()));

    // ── Authentication core ──────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let hasher = Arc::new(PasswordHasher::new(&config.auth)?);
    let password_policy = PasswordPolicy::new(&config.auth);
    let lockout = LockoutPolicy::new(&config.auth);
    let encoder = Arc::new(TokenEncoder::new(&config.auth, Arc::clone(&clock)));
    let decoder = Arc::new(TokenDecoder::new(&config.auth, Arc::clone(&clock)));

    let registry = Arc::new(SessionRegistry::new(
        user_repo.clone(),
        session_repo.clone(),
        Arc::clone(&encoder),
        Arc::clone(&decoder),
        Arc::clone(&clock),
    ));

    // ── Services ─────────────────────────────────────────────────
    let audit = Arc::new(AuditService::new(
        audit_repo.clone(),
        Arc::clone(&clock),
        config.audit.clone(),
    ));
    let mailer = Arc::new(TracingMailer);

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        reset_repo.clone(),
        Arc::clone(&registry),
        Arc::clone(&hasher),
        password_policy.clone(),
        lockout.clone(),
        Arc::clone(&encoder),
        Arc::clone(&decoder),
        Arc::clone(&audit),
        mailer,
        Arc::clone(&clock),
    ));
    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        Arc::clone(&registry),
        Arc::clone(&hasher),
        password_policy.clone(),
        Arc::clone(&audit),
        Arc::clone(&clock),
    ));
    let admin_service = Arc::new(AdminUserService::new(
        user_repo.clone(),
        Arc::clone(&hasher),
        password_policy,
        Arc::clone(&audit),
        Arc::clone(&clock),
    ));

    // The transport adapter plugs in here.
    let _ = (auth_service, user_service, admin_service);

    tracing::info!("Services initialized");

    // ── Maintenance scheduler ────────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        let cleanup =
            SessionCleanup::new(session_repo.clone(), Arc::clone(&clock), &config.session);
        let jobs = Arc::new(MaintenanceJobs::new(
            cleanup,
            reset_repo.clone(),
            Arc::clone(&clock),
        ));

        jobs.run_all().await?;

        let scheduler = MaintenanceScheduler::new(jobs, config.worker.clone()).await?;
        scheduler.register_default_tasks().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Maintenance scheduler disabled");
        None
    };

    tracing::info!("Gatehouse is running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;

    tracing::info!("Shutting down");
    if let Some(ref mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    db.close().await;

    Ok(())
}
