//! Standard success envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub status: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub status: &'static str,
    pub count: usize,
    pub data: Vec<T>,
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            status: "success",
            data,
            message: None,
        }),
    )
}

pub fn success_with_message<T: Serialize>(
    status: StatusCode,
    data: T,
    message: &str,
) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        status,
        Json(SuccessOne {
            status: "success",
            data,
            message: Some(message.to_string()),
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    (
        StatusCode::OK,
        Json(SuccessMany {
            status: "success",
            count: data.len(),
            data,
        }),
    )
}
