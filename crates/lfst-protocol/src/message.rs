use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lfst_types::{Oid, Operation, Pointer};
use serde::{Deserialize, Serialize};

use crate::endpoint::headers;

/// Body of `POST {base}/objects/batch`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    pub objects: Vec<Pointer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
}

/// Response of the batch endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectResponse>,
}

/// Per-object entry of a batch response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectResponse {
    pub oid: Oid,
    pub size: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub actions: HashMap<String, Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ObjectError>,
}

impl ObjectResponse {
    pub fn pointer(&self) -> Pointer {
        Pointer::new(self.oid, self.size)
    }

    pub fn action(&self, name: &str) -> Option<&Link> {
        self.actions.get(name)
    }
}

/// A transfer action: where to send the request and how to authorize it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub header: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Link {
    /// The `Authorization` header value, matched case-insensitively.
    pub fn authorization(&self) -> Option<&str> {
        self.header
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(headers::AUTHORIZATION))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    pub code: i32,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_request_omits_empty_optionals() {
        let request = BatchRequest {
            operation: Operation::Upload,
            transfers: Vec::new(),
            reference: None,
            objects: vec![Pointer::for_content(b"")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "operation": "upload",
                "objects": [{
                    "oid": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                    "size": 0
                }]
            })
        );
    }

    #[test]
    fn batch_request_with_ref_and_transfer() {
        let request = BatchRequest {
            operation: Operation::Download,
            transfers: vec!["basic".into()],
            reference: Some(Reference { name: "refs/heads/main".into() }),
            objects: Vec::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["transfers"], json!(["basic"]));
        assert_eq!(value["ref"], json!({"name": "refs/heads/main"}));
    }

    #[test]
    fn parses_batch_response() {
        let oid = Oid::from_bytes(b"content");
        let body = json!({
            "transfer": "basic",
            "objects": [
                {
                    "oid": oid.to_hex(),
                    "size": 7,
                    "actions": {
                        "download": {
                            "href": "http://localhost:3000/alice/repo.git/info/lfs/objects/x",
                            "header": {"Authorization": "Bearer abc"},
                            "expires_at": "2026-10-19T12:00:00Z"
                        }
                    }
                },
                {
                    "oid": oid.to_hex(),
                    "size": 7,
                    "error": {"code": 404, "message": "Object does not exist"}
                }
            ]
        });
        let response: BatchResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.objects.len(), 2);
        let link = response.objects[0].action("download").unwrap();
        assert_eq!(link.authorization(), Some("Bearer abc"));
        assert_eq!(
            link.expires_at.unwrap().to_rfc3339(),
            "2026-10-19T12:00:00+00:00"
        );
        assert!(response.objects[1].actions.is_empty());
        assert_eq!(response.objects[1].error.as_ref().unwrap().code, 404);
    }

    #[test]
    fn authorization_is_case_insensitive() {
        let link = Link {
            href: "h".into(),
            header: HashMap::from([("authorization".to_string(), "Basic x".to_string())]),
            expires_at: None,
        };
        assert_eq!(link.authorization(), Some("Basic x"));
    }
}
