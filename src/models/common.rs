use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
            error: None,
        }
    }
}

/// 把 `{key: record}` 形式的子树解析为 (key, record) 列表。
/// 无法解析的记录跳过并记录警告，不影响其它记录。
pub fn decode_children<T: DeserializeOwned>(snapshot: Option<Value>, kind: &str) -> Vec<(String, T)> {
    let Some(Value::Object(map)) = snapshot else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                log::warn!("Skipping malformed {kind} record {key}: {e}");
                None
            }
        })
        .collect()
}
