use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::{json, Value};

use elearn_auth::authorize_course_access;
use elearn_core::CourseId;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AccountContext;

/// GET /get-course-content/:id
///
/// Ownership is checked before the catalog lookup, so an account learns
/// nothing about courses it does not own.
pub async fn content(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AccountContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let course_id: CourseId = id
        .parse()
        .map_err(|_| ApiError::validation("course id is not valid"))?;

    authorize_course_access(ctx.account(), &course_id).inspect_err(|_| {
        tracing::warn!(account_id = %ctx.account_id(), %course_id, "course access denied");
    })?;

    let content = services
        .courses
        .content(course_id)
        .await
        .ok_or_else(|| ApiError::not_found("course not found"))?;

    Ok(Json(json!({
        "success": true,
        "content": content,
    })))
}
