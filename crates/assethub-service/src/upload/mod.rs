//! Upload intent protocol.

pub mod service;

pub use service::{
    FinishUploadRequest, FinishedUpload, StartUploadRequest, UploadService, UploadTicket,
};
