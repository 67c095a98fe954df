// This file is part of the terraform-provider-dbtcloud project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Maximum length of a response body kept in an error message
const MAX_BODY_LENGTH: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource-not-found: {url}")]
    NotFound { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("dbt Cloud API returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("failed to decode dbt Cloud API response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("the dbt Cloud token is not a valid HTTP header value")]
    InvalidToken,

    #[error("dbt Cloud API response for {kind} has no identifier")]
    MissingIdentifier { kind: &'static str },
}

impl ApiError {
    /// Whether the error means the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::NotFound { .. } => true,
            ApiError::Status { message, .. } => mentions_not_found(message),
            _ => false,
        }
    }

    pub(crate) fn not_found(url: impl Into<String>) -> Self {
        ApiError::NotFound { url: url.into() }
    }

    pub(crate) fn from_response(status: StatusCode, url: &str, body: &str) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::not_found(url);
        }
        ApiError::Status {
            status: status.as_u16(),
            url: url.to_owned(),
            message: error_message(body),
        }
    }
}

fn mentions_not_found(text: &str) -> bool {
    text.contains("resource-not-found") || text.to_ascii_lowercase().contains("not found")
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    status: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    user_message: Option<String>,
    developer_message: Option<String>,
}

/// Extract the most useful message of an error body
fn error_message(body: &str) -> String {
    if let Ok(ErrorEnvelope { status }) = serde_json::from_str(body) {
        let message = [status.user_message, status.developer_message]
            .into_iter()
            .flatten()
            .filter(|message| !message.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !message.is_empty() {
            return message;
        }
    }
    truncate(body)
}

pub(crate) fn truncate(body: &str) -> String {
    if body.len() > MAX_BODY_LENGTH {
        let mut end = MAX_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_404_is_not_found() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "http://x/projects/1/", "");
        assert!(err.is_not_found());
        assert!(err.to_string().starts_with("resource-not-found"));
    }

    #[test]
    fn not_found_text_is_not_found() {
        let body = r#"{"status": {"code": 400, "is_success": false, "user_message": "Credential Not Found"}}"#;
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, "http://x", body);
        assert!(err.is_not_found());

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, "http://x", "resource-not-found");
        assert!(err.is_not_found());
    }

    #[test]
    fn other_statuses_are_not_not_found() {
        let body = r#"{"status": {"code": 403, "user_message": "Forbidden", "developer_message": "missing permission"}}"#;
        let err = ApiError::from_response(StatusCode::FORBIDDEN, "http://x", body);
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "dbt Cloud API returned 403 for http://x: Forbidden missing permission"
        );
        assert!(!ApiError::InvalidToken.is_not_found());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let message = truncate(&body);
        assert!(message.starts_with(&"x".repeat(MAX_BODY_LENGTH)));
        assert!(message.ends_with("[truncated, 500 bytes total]"));
        assert_eq!(truncate("short"), "short");
    }
}
