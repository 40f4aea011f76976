//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod entry_dto;
pub mod predict_dto;

pub use entry_dto::*;
pub use predict_dto::*;

use axum::body::Bytes;
use serde_json::{Map, Value};

/// 将请求体解析为 JSON 对象
///
/// 空请求体、非 JSON 或非对象的请求体都视为空对象，由字段校验报告缺失字段。
pub fn json_fields(body: &Bytes) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fields_is_lenient() {
        assert!(json_fields(&Bytes::new()).is_empty());
        assert!(json_fields(&Bytes::from_static(b"not json")).is_empty());
        assert!(json_fields(&Bytes::from_static(b"[1, 2]")).is_empty());

        let fields = json_fields(&Bytes::from_static(br#"{"score": 90}"#));
        assert_eq!(fields["score"], 90);
    }
}
