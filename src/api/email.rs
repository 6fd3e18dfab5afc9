use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::models::{SendEmailRequest, SendEmailResponse};
use crate::state::AppState;

/// Email routes
pub fn email_routes() -> Router<AppState> {
    Router::new().route("/send-email", post(send_email))
}

/// POST /api/send-email - Render a notification and submit it once.
async fn send_email(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    let Json(payload) = payload.inspect_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected malformed email request");
    })?;

    let request = payload.validate().inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected email request");
    })?;

    tracing::info!(
        to = %request.recipient,
        audience = %request.audience,
        kind = %request.kind,
        "Email request received"
    );

    let email = state
        .renderer
        .render(request.audience, request.kind, &request.fields)
        .inspect_err(|e| {
            tracing::warn!(
                audience = %request.audience,
                kind = %request.kind,
                error = %e,
                "Failed to render email"
            );
        })?;

    let receipt = state
        .mailer
        .deliver(&request.recipient, email)
        .await
        .inspect_err(|e| {
            tracing::error!(to = %request.recipient, error = %e, "Email delivery failed");
        })?;

    tracing::info!(
        to = %request.recipient,
        message_id = %receipt.message_id,
        "Email sent"
    );

    Ok(Json(SendEmailResponse {
        success: true,
        message: "郵件發送成功".to_string(),
        message_id: receipt.message_id,
    }))
}
