//! Serializable outcome of a workflow mutation: `{success, data?, error?}`.

use serde::Serialize;

use aidflow_core::{DomainError, Shortage};

use crate::error::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: String,
    pub message: String,
    /// Populated for `InsufficientInventoryError` only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shortages: Vec<Shortage>,
}

impl From<&WorkflowError> for OperationError {
    fn from(err: &WorkflowError) -> Self {
        let shortages = match err.as_domain() {
            Some(DomainError::InsufficientInventory(s)) => s.clone(),
            _ => Vec::new(),
        };
        Self {
            kind: err.kind().to_string(),
            message: err.public_message(),
            shortages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(err: &WorkflowError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.into()),
        }
    }
}

impl<T> From<Result<T, WorkflowError>> for OperationResult<T> {
    fn from(value: Result<T, WorkflowError>) -> Self {
        match value {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use aidflow_core::ItemId;
    use serde_json::json;

    use super::*;

    #[test]
    fn failure_body_carries_kind_and_shortages() {
        let item_id = ItemId::new();
        let err = WorkflowError::from(DomainError::InsufficientInventory(vec![Shortage {
            item_id,
            requested: 5,
            available: 2,
        }]));

        let body = serde_json::to_value(OperationResult::<()>::failed(&err)).unwrap();

        assert_eq!(body["success"], json!(false));
        assert!(body.get("data").is_none());
        assert_eq!(body["error"]["kind"], "InsufficientInventoryError");
        assert_eq!(body["error"]["shortages"][0]["requested"], 5);
    }

    #[test]
    fn success_body_omits_error() {
        let body = serde_json::to_value(OperationResult::from(Ok::<_, WorkflowError>(3))).unwrap();
        assert_eq!(body, json!({ "success": true, "data": 3 }));
    }
}
