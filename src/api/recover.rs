use std::convert::Infallible;

use log::error;
use serde_json::{json, Value};
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidHeader, InvalidQuery, LengthRequired, MethodNotAllowed, MissingHeader,
        PayloadTooLarge, Rejection, UnsupportedMediaType,
    },
    reply::{self, Reply},
};

use crate::error::{ApiError, NON_FIELD_ERRORS};

fn detail(message: impl Into<String>) -> Value {
    json!({ "detail": message.into() })
}

fn status_and_body(err: &Rejection) -> (StatusCode, Value) {
    if let Some(e) = err.find::<ApiError>() {
        if e.is_internal() {
            error!("{e}");
        }
        return (e.status(), e.body());
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        return (
            StatusCode::BAD_REQUEST,
            json!({ NON_FIELD_ERRORS: [format!("Invalid data. {e}")] }),
        );
    }
    if err.find::<InvalidQuery>().is_some() {
        return (StatusCode::BAD_REQUEST, detail("Invalid query string."));
    }
    if let Some(e) = err.find::<MissingHeader>() {
        return (StatusCode::BAD_REQUEST, detail(e.to_string()));
    }
    if let Some(e) = err.find::<InvalidHeader>() {
        return (StatusCode::BAD_REQUEST, detail(e.to_string()));
    }
    if err.find::<PayloadTooLarge>().is_some() {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            detail("Request body is too large."),
        );
    }
    if err.find::<LengthRequired>().is_some() {
        return (
            StatusCode::LENGTH_REQUIRED,
            detail("A Content-Length header is required."),
        );
    }
    if err.find::<UnsupportedMediaType>().is_some() {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            detail("Unsupported media type in request."),
        );
    }
    if err.find::<MethodNotAllowed>().is_some() {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            detail("Method not allowed."),
        );
    }
    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, detail("Not found."));
    }

    error!("Unhandled rejection: {err:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        detail("Internal server error"),
    )
}

/// Turns any rejection into a JSON error response.
pub async fn recover(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = status_and_body(&err);

    Ok(reply::with_status(reply::json(&body), status))
}
