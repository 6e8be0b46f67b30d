use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{error, info};

use contact_relay_core::{validate, ContactFormInput, Submission};
use contact_relay_mailer::NotificationOutcome;

use crate::problem::ApiProblem;
use crate::router::AppState;

const THANK_YOU: &str = "Thank you for your message! I'll get back to you soon.";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    success: bool,
    message: &'static str,
    data: SubmissionSummary,
    notification: NotificationOutcome,
}

#[derive(Debug, Serialize)]
struct SubmissionSummary {
    id: String,
    name: String,
    email: String,
    created_at: String,
}

impl From<Submission> for SubmissionSummary {
    fn from(value: Submission) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            created_at: format_timestamp(value.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    total_submissions: u64,
    timestamp: String,
}

/// `POST /api/contact`: validate, persist, then notify.
///
/// Only validation and persistence can fail the request. The notification
/// outcome is attached to the 201 response as metadata.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactFormInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiProblem> {
    let Json(input) = payload.map_err(|rejection| {
        counter!("contact_submissions_total", "result" => "rejected").increment(1);
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::BAD_REQUEST
            }
            other => other.status(),
        };
        let reason = rejection.body_text();
        info!(stage = "contact", %status, reason = %reason, "unreadable submission body");
        ApiProblem::InvalidBody { status, reason }
    })?;

    let draft = validate(&input).map_err(|errors| {
        counter!("contact_submissions_total", "result" => "rejected").increment(1);
        let fields: Vec<&str> = errors.violations().iter().map(|v| v.field()).collect();
        info!(stage = "contact", fields = ?fields, "submission failed validation");
        ApiProblem::Validation(errors)
    })?;

    let stored = state
        .storage()
        .submissions()
        .insert(&draft, state.now())
        .await
        .map_err(|err| {
            counter!("contact_submissions_total", "result" => "failed").increment(1);
            error!(stage = "contact", error = %err, "failed to store submission");
            ApiProblem::storage(&err, state.environment())
        })?;

    let notification = state.notifier().notify(&draft, stored.created_at).await;
    counter!("contact_notifications_total", "result" => notification.label()).increment(1);
    counter!("contact_submissions_total", "result" => "accepted").increment(1);
    info!(
        stage = "contact",
        id = %stored.id,
        email_sent = notification.email_sent,
        "submission accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: THANK_YOU,
            data: stored.into(),
            notification,
        }),
    ))
}

/// `GET /api/contact/stats`: total stored submissions.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiProblem> {
    let total = state
        .storage()
        .submissions()
        .count()
        .await
        .map_err(|err| {
            counter!("contact_stats_requests_total", "result" => "error").increment(1);
            error!(stage = "contact", error = %err, "failed to count submissions");
            ApiProblem::Stats
        })?;

    counter!("contact_stats_requests_total", "result" => "ok").increment(1);
    Ok(Json(StatsResponse {
        total_submissions: total,
        timestamp: format_timestamp(state.now()),
    }))
}

/// RFC 3339 in UTC with only as many fractional digits as the value needs.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
