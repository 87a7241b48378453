//! Scheduled background tasks for AssetHub.
//!
//! This crate provides:
//! - A cron scheduler for periodic maintenance tasks
//! - The job that expires stale upload intents

pub mod jobs;
pub mod scheduler;

pub use jobs::IntentSweepJob;
pub use scheduler::CronScheduler;
