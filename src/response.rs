use serde_json::json;
use warp::{
    http::StatusCode,
    reply::{self, Reply, Response},
};

use crate::{constants::SHOPPING_LIST_FILENAME, error::ServiceError};

/// Plain-text shopping list served as a file download.
pub fn shopping_list_reply(text: String) -> Response {
    let reply = reply::with_header(text, "Content-Type", "text/plain; charset=utf-8");
    let reply = reply::with_header(
        reply,
        "Content-Disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    );

    reply.into_response()
}

/// `{"errors": "..."}` with the status of the error kind.
pub fn error_reply(error: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = reply::json(&json!({ "errors": error.to_string() }));

    reply::with_status(body, status).into_response()
}
