use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::PageRequest;
use crate::services::parse::parse_id;

/// Path id as a positive integer
pub fn path_id(raw: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::bad_request("ID inválido"))
}

/// Malformed or non-JSON bodies become a JSON 400 instead of axum's plain-text rejection
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::invalid_json("JSON inválido no corpo da requisição"))
        }
    }
}

/// Typed body, with shape errors reported as 400
pub fn typed_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError> {
    let value = json_body(payload)?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::invalid_json(format!("Corpo da requisição inválido: {}", e)))
}

pub fn page_request(page: Option<&str>, limit: Option<&str>) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::parse(page, limit)?)
}

pub fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_id_rejects_non_positive_and_garbage() {
        assert_eq!(path_id("15").unwrap(), 15);
        assert_eq!(path_id("0").unwrap_err().message(), "ID inválido");
        assert_eq!(path_id("abc").unwrap_err().status_code(), 400);
    }

    #[test]
    fn typed_body_reports_shape_errors_as_bad_request() {
        #[derive(serde::Deserialize)]
        struct Body {
            #[allow(dead_code)]
            field: String,
        }
        let err = typed_body::<Body>(Ok(Json(serde_json::json!({ "field": 3 })))).err().unwrap();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_JSON");
    }
}
