//! Habit tracker API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::habits::{HabitMonth, Month, SaveHabitsRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedHabits {
    pub hash: String,
}

/// GET /api/habits/{year}/{month} - A month's log, stats and hash.
pub async fn get_habits(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> ApiResult<HabitMonth> {
    let generation = state.search.generation();

    let month = match Month::new(year, month) {
        Ok(month) => month,
        Err(e) => return error(e, generation),
    };

    match state.habits.month_view(month).await {
        Ok(view) => success(view, generation),
        Err(e) => error(e, generation),
    }
}

/// PUT /api/habits/{year}/{month} - Save a month; omit the hash to create it.
pub async fn save_habits(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Json(request): Json<SaveHabitsRequest>,
) -> ApiResult<SavedHabits> {
    let generation = state.search.generation();

    let month = match Month::new(year, month) {
        Ok(month) => month,
        Err(e) => return error(e, generation),
    };

    match state
        .habits
        .save_month(month, &request.log, request.hash.as_deref())
        .await
    {
        Ok(hash) => success(SavedHabits { hash }, generation),
        Err(e) => error(e, generation),
    }
}
