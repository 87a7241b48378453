//! Asset event history.

pub mod service;

pub use service::EventLog;
