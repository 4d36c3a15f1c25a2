//! Response types returned to the Lambda runtime.
//!
//! The runtime serialises the handler output as JSON; [`ProxyResponse`] uses
//! the API Gateway proxy integration shape so the function can sit directly
//! behind an HTTP trigger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// API Gateway proxy response: `{"statusCode", "headers", "body", "isBase64Encoded"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status code presented to the caller.
    pub status_code: u16,
    /// Response headers; omitted when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ProxyResponse {
    /// `200 OK` greeting the caller by public IP: `"Hello, <ip>"`.
    pub fn greeting(ip: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), "text/plain; charset=utf-8".to_owned());
        Self {
            status_code: 200,
            headers,
            body: format!("Hello, {ip}"),
            is_base64_encoded: false,
        }
    }
}
