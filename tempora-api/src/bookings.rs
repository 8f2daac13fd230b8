use axum::{
    extract::{Extension, State, Json},
    routing::post,
    Router,
};
use tempora_bookings::{BookingListPage, ListBookingsRequest, ListingError};
use tempora_core::principal::Requester;
use tracing::info;
use crate::middleware::session_auth_middleware;
use crate::state::AppState;
use crate::error::AppError;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/list", post(list_bookings))
        .layer(axum::middleware::from_fn_with_state(state, session_auth_middleware))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Json(request): Json<ListBookingsRequest>,
) -> Result<Json<BookingListPage>, AppError> {
    let page = state.lister.list(&requester, &request).await.map_err(|e| match e {
        ListingError::InvalidRequest(msg) => AppError::ValidationError(msg),
        other => AppError::InternalServerError(other.to_string()),
    })?;

    info!("Listed {} bookings for user {}", page.bookings.len(), requester.id);

    Ok(Json(page))
}
