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

use serde::{Deserialize, Serialize};

use super::{ApiError, ApiVersion, DbtCloudClient, Extra};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub client_url: String,
    #[serde(default)]
    pub event_types: Vec<String>,
    /// The API represents job ids as strings
    #[serde(default)]
    pub job_ids: Vec<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing)]
    pub hmac_secret: Option<String>,
    #[serde(default, skip_serializing)]
    pub http_status_code: Option<String>,
    #[serde(default, skip_serializing)]
    pub account_identifier: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl DbtCloudClient {
    fn webhook_url(&self, webhook_id: &str) -> String {
        self.url(
            ApiVersion::V3,
            &format!("webhooks/subscription/{webhook_id}"),
        )
    }

    pub async fn get_webhook(&self, webhook_id: &str) -> Result<Webhook, ApiError> {
        self.get(&self.webhook_url(webhook_id)).await
    }

    pub async fn create_webhook(&self, webhook: &Webhook) -> Result<Webhook, ApiError> {
        let body = Webhook {
            id: None,
            ..webhook.clone()
        };
        self.post(&self.url(ApiVersion::V3, "webhooks/subscriptions"), &body)
            .await
    }

    pub async fn update_webhook(
        &self,
        webhook_id: &str,
        webhook: &Webhook,
    ) -> Result<Webhook, ApiError> {
        self.put(&self.webhook_url(webhook_id), webhook).await
    }

    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<(), ApiError> {
        self.delete(&self.webhook_url(webhook_id), None::<&()>)
            .await
    }
}
