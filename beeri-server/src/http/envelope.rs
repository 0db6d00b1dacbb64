//! Success envelope: `{"success": true, "data": ...}`

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;
pub type Created<T> = Result<(StatusCode, Json<Envelope<T>>), ApiError>;

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_data() {
        let Json(envelope) = ok(json!({"id": 1}));
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({"success": true, "data": {"id": 1}})
        );
    }

    #[test]
    fn created_is_201() {
        let (status, _) = created(());
        assert_eq!(status, StatusCode::CREATED);
    }
}
