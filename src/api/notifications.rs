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

use super::{default_state, impl_lifecycle, ApiError, ApiVersion, DbtCloudClient, Extra};

pub const NOTIFICATION_EMAIL: i64 = 1;
pub const NOTIFICATION_SLACK: i64 = 2;
pub const NOTIFICATION_EXTERNAL_EMAIL: i64 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub on_cancel: Vec<i64>,
    #[serde(default)]
    pub on_failure: Vec<i64>,
    #[serde(default)]
    pub on_success: Vec<i64>,
    #[serde(rename = "type")]
    pub kind: i64,
    pub slack_channel_id: Option<String>,
    pub slack_channel_name: Option<String>,
    pub external_email: Option<String>,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Notification);

impl DbtCloudClient {
    fn notification_url(&self, notification_id: i64) -> String {
        self.url(
            ApiVersion::V2,
            &format!("notifications/{notification_id}/"),
        )
    }

    pub async fn get_notification(&self, notification_id: i64) -> Result<Notification, ApiError> {
        self.get_live(&self.notification_url(notification_id))
            .await
    }

    pub async fn create_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, ApiError> {
        let body = Notification {
            id: None,
            account_id: self.account_id(),
            ..notification.clone()
        };
        self.post(&self.url(ApiVersion::V2, "notifications/"), &body)
            .await
    }

    pub async fn update_notification(
        &self,
        notification_id: i64,
        notification: &Notification,
    ) -> Result<Notification, ApiError> {
        self.post(&self.notification_url(notification_id), notification)
            .await
    }

    pub async fn delete_notification(
        &self,
        notification_id: i64,
    ) -> Result<Notification, ApiError> {
        self.retire(&self.notification_url(notification_id)).await
    }
}
