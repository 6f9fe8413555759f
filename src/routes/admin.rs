use axum::{Json, extract::State};

use crate::{
    AppState,
    error::Result,
    models::{AdminStats, ApiResponse, LatestOrder},
    queries::admin_queries,
};

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<ApiResponse<AdminStats>>> {
    let stats = admin_queries::get_stats(&state.db).await?;

    Ok(Json(ApiResponse::new(stats)))
}

pub async fn latest_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LatestOrder>>>> {
    let orders = admin_queries::latest_orders(&state.db).await?;

    Ok(Json(ApiResponse::new(orders)))
}
