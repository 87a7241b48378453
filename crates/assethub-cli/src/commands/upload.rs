//! Upload command: drives an upload intent end to end in-process.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;

use assethub_api::AppState;
use assethub_core::error::AppError;
use assethub_entity::upload::UploadBackend;
use assethub_service::RequestContext;
use assethub_service::upload::{FinishUploadRequest, StartUploadRequest};
use assethub_storage::mime::mime_from_path;

use crate::output::{self, OutputFormat};

/// Arguments for the upload command
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Local file to upload
    pub file: PathBuf,
    /// Destination folder path
    #[arg(short = 'd', long, default_value = "")]
    pub folder: String,
    /// Destination basename (defaults to the file name)
    #[arg(short, long)]
    pub basename: Option<String>,
    /// Publish the new version immediately
    #[arg(short, long)]
    pub publish: bool,
    /// Version label
    #[arg(short, long)]
    pub label: Option<String>,
    /// MIME type (guessed from the file name when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Execute the upload command
pub async fn execute(
    args: &UploadArgs,
    state: &AppState,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("Upload path has no file name"))?;
    let content_type = args
        .content_type
        .clone()
        .or_else(|| mime_from_path(&filename));
    let data = tokio::fs::read(&args.file).await.map_err(|e| {
        AppError::validation(format!("Failed to read '{}': {e}", args.file.display()))
    })?;

    let uploads = &state.upload_service;
    let ticket = uploads
        .start_upload(
            ctx,
            StartUploadRequest {
                folder_path: args.folder.clone(),
                basename: args.basename.clone().unwrap_or_else(|| filename.clone()),
                filename: Some(filename),
                content_type: content_type.clone(),
                publish: args.publish,
                label: args.label.clone(),
                extra: None,
            },
        )
        .await?;
    if ticket.backend != UploadBackend::Inline {
        return Err(AppError::validation(format!(
            "The CLI uploads inline only; send the bytes to {} and finish intent {}",
            ticket.upload_url, ticket.intent_id
        )));
    }

    let blob = uploads
        .accept_inline_blob(ticket.intent_id, Bytes::from(data), content_type)
        .await?;
    let upload_response = serde_json::to_value(&blob)
        .map_err(|e| AppError::internal(format!("Failed to encode upload response: {e}")))?;
    let finished = uploads
        .finish_upload(
            ctx,
            ticket.intent_id,
            FinishUploadRequest {
                upload_response: Some(upload_response),
                ..FinishUploadRequest::default()
            },
        )
        .await?;

    match format {
        OutputFormat::Json => output::print_item(&finished, format),
        OutputFormat::Table => output::print_success(&format!(
            "Uploaded version {} ({}), {} bytes",
            finished.version, finished.version_id, blob.size
        )),
    }
    Ok(())
}
