use axum::{
    Json,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use hypertext::Rendered;

use crate::flash::Flash;

/// Redirects and carries a banner to be shown on the next page.
pub fn see_other_flash(r: Redirect, flash: Flash) -> StandardResponse {
    Ok(SuccessResponse::SeeOtherFlash(Box::new(r), flash))
}

pub fn err_not_found() -> StandardResponse {
    Err(FailureResponse::NotFound(()))
}

pub fn bad_request(html: Rendered<String>) -> StandardResponse {
    Err(FailureResponse::BadRequest(html))
}

pub fn success(html: Rendered<String>) -> StandardResponse {
    Ok(SuccessResponse::Success(html))
}

pub fn json(value: serde_json::Value) -> StandardResponse {
    Ok(SuccessResponse::Json(value))
}

pub type StandardResponse = Result<SuccessResponse, FailureResponse>;

pub enum SuccessResponse {
    Success(Rendered<String>),
    SeeOtherFlash(Box<Redirect>, Flash),
    Json(serde_json::Value),
}

impl IntoResponse for SuccessResponse {
    fn into_response(self) -> Response {
        match self {
            SuccessResponse::Success(html) => {
                Html(html.into_inner()).into_response()
            }
            SuccessResponse::SeeOtherFlash(redirect, flash) => (
                AppendHeaders([(SET_COOKIE, flash.to_cookie().to_string())]),
                *redirect,
            )
                .into_response(),
            SuccessResponse::Json(value) => Json(value).into_response(),
        }
    }
}

#[derive(Debug)]
pub enum FailureResponse {
    BadRequest(Rendered<String>),
    NotFound(()),
    ServerError(()),
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        match self {
            FailureResponse::BadRequest(html) => (
                StatusCode::BAD_REQUEST,
                Html(html.into_inner()),
            )
                .into_response(),
            FailureResponse::NotFound(()) => {
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
            FailureResponse::ServerError(()) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    .into_response()
            }
        }
    }
}

impl From<diesel::result::Error> for FailureResponse {
    fn from(e: diesel::result::Error) -> Self {
        tracing::error!("database error: {e}");
        FailureResponse::ServerError(())
    }
}
