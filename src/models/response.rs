use serde::{Deserialize, Serialize};

use crate::error::LauncherError;

/// Uniform envelope returned for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<LauncherError> for ApiResponse<T> {
    fn from(err: LauncherError) -> Self {
        Self::failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_omits_error_field() {
        let json = serde_json::to_string(&ApiResponse::ok(5)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":5}"#);
    }

    #[test]
    fn empty_success_has_only_flag() {
        let json = serde_json::to_string(&ApiResponse::<()>::ok_empty()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn error_conversion_keeps_message() {
        let resp: ApiResponse = LauncherError::PresetNotFound("ultra".into()).into();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Preset not found: ultra"));
    }
}
