use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub enum CustomResponse<T> {
    Api(ApiResponse<T>),
    Empty(EmptyResponse),
}

impl<T> CustomResponse<T>
where
    T: Serialize,
{
    pub fn empty(status: StatusCode, message: &str) -> Self {
        CustomResponse::Empty(EmptyResponse {
            status: status.as_u16(),
            message: message.to_string(),
        })
    }
    pub fn api(status: StatusCode, message: &str, data: T) -> Self {
        CustomResponse::Api(ApiResponse::new(status, message, data))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn new(status: StatusCode, message: &str, data: T) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

/// `{status, message}` with no payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmptyResponse {
    pub status: u16,
    pub message: String,
}

fn status_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (status_of(self.status), Json(self)).into_response()
    }
}

impl IntoResponse for EmptyResponse {
    fn into_response(self) -> Response {
        (status_of(self.status), Json(self)).into_response()
    }
}

impl<T> IntoResponse for CustomResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match self {
            CustomResponse::Api(api_response) => api_response.into_response(),
            CustomResponse::Empty(empty_response) => empty_response.into_response(),
        }
    }
}
