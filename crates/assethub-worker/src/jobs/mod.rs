//! Built-in job implementations.

pub mod intent_sweep;

pub use intent_sweep::IntentSweepJob;
