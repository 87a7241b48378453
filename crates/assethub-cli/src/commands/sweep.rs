//! Intent sweep command.

use assethub_api::AppState;
use assethub_core::error::AppError;

use crate::output;

/// Expire every open upload intent past its deadline.
pub async fn execute(state: &AppState) -> Result<(), AppError> {
    let expired = state.upload_service.sweep_expired().await?;
    output::print_success(&format!("Expired {expired} upload intent(s)"));
    Ok(())
}
