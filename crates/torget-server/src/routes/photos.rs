//! Photo serving route handler.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::AppError;

/// Photos are immutable once stored, so clients may cache them for a day.
/// `private` keeps shared proxies from holding user-uploaded content.
const CACHE_CONTROL: &str = "private, max-age=86400";

/// Query parameters for photo serving.
#[derive(Debug, Deserialize)]
pub struct PhotoParams {
    /// Bounding-box width; 0 (the default) serves the original bytes.
    #[serde(default)]
    pub width: u32,
}

/// GET /photos/{key}?width=N
#[utoipa::path(
    get,
    path = "/photos/{key}",
    params(
        ("key" = String, Path, description = "Photo blob key"),
        ("width" = u32, Query, description = "Bounding-box width; 0 serves the original")
    ),
    responses(
        (status = 200, description = "Photo bytes"),
        (status = 404, description = "No photo under that key")
    )
)]
pub async fn get_photo(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    Query(params): Query<PhotoParams>,
) -> Result<impl IntoResponse, AppError> {
    let served = ctx.market.serve_photo(&key, params.width)?;

    Ok((
        [
            (header::CONTENT_TYPE, served.content_type),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        served.bytes,
    ))
}
