//! Inbound admission routes: enter and leave.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::admission::{EnterOutcome, Member, Resource};

use super::server::AppState;

/// Request body identifying one member.
#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub request_id: String,
    pub session_id: String,
}

/// Response for `try_enter`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum EnterResponse {
    Admitted,
    Waiting { rank: u64, total_waiting: u64 },
}

/// Response for `leave`.
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub status: &'static str,
}

/// Error body for failed admission calls.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// Build the admission router.
pub fn admission_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:resource_type/:resource_id/enter", post(enter_handler))
        .route("/:resource_type/:resource_id/leave", post(leave_handler))
        .with_state(state)
}

async fn enter_handler(
    State(state): State<Arc<AppState>>,
    Path((resource_type, resource_id)): Path<(String, String)>,
    Json(body): Json<MemberRequest>,
) -> impl IntoResponse {
    let resource = Resource::new(resource_type, resource_id);
    let member = Member::new(body.request_id, body.session_id);
    match state.gate.try_enter(&resource, &member).await {
        Ok(EnterOutcome::Admitted) => (StatusCode::OK, Json(EnterResponse::Admitted)).into_response(),
        Ok(EnterOutcome::Queued {
            rank,
            total_waiting,
        }) => (
            StatusCode::OK,
            Json(EnterResponse::Waiting {
                rank,
                total_waiting,
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                status: "ERROR",
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn leave_handler(
    State(state): State<Arc<AppState>>,
    Path((resource_type, resource_id)): Path<(String, String)>,
    Json(body): Json<MemberRequest>,
) -> impl IntoResponse {
    let resource = Resource::new(resource_type, resource_id);
    let member = Member::new(body.request_id, body.session_id);
    match state.gate.leave(&resource, &member).await {
        Ok(()) => (StatusCode::OK, Json(LeaveResponse { status: "LEFT" })).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                status: "ERROR",
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_response_serializes_status_tag() {
        let admitted = serde_json::to_value(EnterResponse::Admitted).unwrap();
        assert_eq!(admitted["status"], "ADMITTED");

        let waiting = serde_json::to_value(EnterResponse::Waiting {
            rank: 0,
            total_waiting: 1,
        })
        .unwrap();
        assert_eq!(waiting["status"], "WAITING");
        assert_eq!(waiting["rank"], 0);
    }
}
