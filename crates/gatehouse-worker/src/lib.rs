//! # gatehouse-worker
//!
//! Periodic maintenance for Gatehouse: the expired-session sweep and the
//! stale password-reset purge, driven by a cron scheduler decoupled from
//! request handling.

pub mod jobs;
pub mod scheduler;

pub use jobs::MaintenanceJobs;
pub use scheduler::MaintenanceScheduler;
