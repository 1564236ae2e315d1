use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stockyard_offer::{Decision, DecisionOutcome, OfferController, RequestView};
use stockyard_shared::{OfferId, RequestId, Session};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, PageView, RedirectSlot};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenViewRequest {
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenViewResponse {
    pub view_id: Uuid,
    pub view: RequestView,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub view: RequestView,
    /// Set after an accepted offer; the client should follow it.
    pub redirect: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/views", post(open_view))
        .route("/v1/views/{view_id}", get(get_view).delete(close_view))
        .route("/v1/views/{view_id}/notice", delete(dismiss_notice))
        .route("/v1/views/{view_id}/offers/{offer_id}/{decision}", post(decide_offer))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/views
/// Open a request page: load the request and, for employees, start the distance fetch
async fn open_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<OpenViewRequest>,
) -> Result<Json<OpenViewResponse>, AppError> {
    let request_id = req.request_id.trim();
    if request_id.is_empty() {
        return Err(AppError::ValidationError("requestId is required".to_string()));
    }

    let owner = session.user.as_ref().map(|u| u.id.clone()).unwrap_or_default();
    let redirect = Arc::new(RedirectSlot::default());
    let controller = OfferController::with_transit_route(
        session.clone(),
        state.store.clone(),
        state.distances.clone(),
        redirect.clone(),
        state.transit_route.clone(),
    );

    controller.load(RequestId::from(request_id)).await;
    let view = RequestView::build(&controller.snapshot().await, &session);

    state.evict_idle_views().await;
    let view_id = Uuid::new_v4();
    let page = PageView { owner, controller, redirect, last_seen: Instant::now() };
    state.views.write().await.insert(view_id, page);
    tracing::info!("Opened view {} for request {}", view_id, request_id);

    Ok(Json(OpenViewResponse { view_id, view }))
}

/// GET /v1/views/:id
async fn get_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(view_id): Path<Uuid>,
) -> Result<Json<RequestView>, AppError> {
    let page = find_view(&state, &session, view_id).await?;
    Ok(Json(RequestView::build(&page.controller.snapshot().await, &session)))
}

/// POST /v1/views/:id/offers/:offer_id/{accept|reject}
async fn decide_offer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((view_id, offer_id, decision)): Path<(Uuid, String, String)>,
) -> Result<Json<DecisionResponse>, AppError> {
    let decision: Decision = decision.parse().map_err(AppError::NotFoundError)?;
    let page = find_view(&state, &session, view_id).await?;

    let outcome = page.controller.decide(&OfferId(offer_id), decision).await;
    if let Err(e) = &outcome {
        tracing::warn!("Decision on view {} failed: {}", view_id, e);
    }
    let outcome = outcome?;

    let redirect = match outcome {
        DecisionOutcome::Navigated(_) => {
            // The page is left for the transit flow
            state.views.write().await.remove(&view_id);
            page.redirect.take()
        }
        DecisionOutcome::Rejected => None,
    };

    let view = RequestView::build(&page.controller.snapshot().await, &session);
    Ok(Json(DecisionResponse { view, redirect }))
}

/// DELETE /v1/views/:id/notice
async fn dismiss_notice(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(view_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let page = find_view(&state, &session, view_id).await?;
    page.controller.dismiss_notice().await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/views/:id
/// Navigate away from the page; late results are dropped
async fn close_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(view_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let page = find_view(&state, &session, view_id).await?;
    page.controller.leave().await;
    state.views.write().await.remove(&view_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn find_view(state: &AppState, session: &Session, view_id: Uuid) -> Result<PageView, AppError> {
    let mut views = state.views.write().await;
    let page = views
        .get_mut(&view_id)
        .ok_or_else(|| AppError::NotFoundError(format!("View not found: {}", view_id)))?;

    let caller = session.user.as_ref().map(|u| u.id.as_str()).unwrap_or_default();
    if page.owner != caller {
        return Err(AppError::AuthorizationError("View belongs to another user".to_string()));
    }
    page.last_seen = Instant::now();
    Ok(page.clone())
}
