//! Public read path decisions.

pub mod service;

pub use service::{
    IMMUTABLE_CACHE_CONTROL, REDIRECT_CACHE_CONTROL, ServeOutcome, ServingService,
};
