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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeType, Schema};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{
    ApiError, DbtCloudClient, Notification, NOTIFICATION_EMAIL, NOTIFICATION_EXTERNAL_EMAIL,
    NOTIFICATION_SLACK, STATE_ACTIVE,
};
use crate::managed::convert::{
    read_number, read_numbers, read_opt_string, sync_numbers, sync_string,
};
use crate::managed::schema::{block, id, list_of, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{WithNormalize, WithSchema};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState<'a> {
    pub id: ValueString<'a>,
    pub user_id: ValueNumber,
    pub on_cancel: ValueList<ValueNumber>,
    pub on_failure: ValueList<ValueNumber>,
    pub on_success: ValueList<ValueNumber>,
    pub notification_type: ValueNumber,
    pub slack_channel_id: ValueString<'a>,
    pub slack_channel_name: ValueString<'a>,
    pub external_email: ValueString<'a>,
}

impl WithSchema for NotificationState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud job notification",
            [
                ("id", id("Notification id")),
                (
                    "user_id",
                    required(AttributeType::Number, "User the notification belongs to"),
                ),
                (
                    "on_cancel",
                    optional(list_of(AttributeType::Number), "Jobs notifying on cancel"),
                ),
                (
                    "on_failure",
                    optional(list_of(AttributeType::Number), "Jobs notifying on failure"),
                ),
                (
                    "on_success",
                    optional(list_of(AttributeType::Number), "Jobs notifying on success"),
                ),
                (
                    "notification_type",
                    optional_computed(
                        AttributeType::Number,
                        "1 for an internal email, 2 for slack, 4 for an external email",
                    ),
                ),
                (
                    "slack_channel_id",
                    optional(AttributeType::String, "Slack channel id"),
                ),
                (
                    "slack_channel_name",
                    optional(AttributeType::String, "Slack channel name"),
                ),
                (
                    "external_email",
                    optional(AttributeType::String, "Recipient of an external email"),
                ),
            ],
        )
    }
}

impl WithNormalize for NotificationState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.notification_type.is_null() {
            self.notification_type = Value::Value(NOTIFICATION_EMAIL);
        }
    }
}

pub struct NotificationResource;

#[async_trait]
impl ApiObject for NotificationResource {
    const NAME: &'static str = "notification";

    type Key = i64;
    type Remote = Notification;
    type State<'a> = NotificationState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn validate(diags: &mut Diagnostics, config: &NotificationState<'_>) {
        match read_number(&config.notification_type) {
            None | Some(NOTIFICATION_EMAIL) => (),
            Some(NOTIFICATION_SLACK) => {
                for (name, value) in [
                    ("slack_channel_id", &config.slack_channel_id),
                    ("slack_channel_name", &config.slack_channel_name),
                ] {
                    if value.is_null() {
                        diags.error_short(
                            format!("`{name}` is required for slack notifications"),
                            AttributePath::new(name),
                        );
                    }
                }
            }
            Some(NOTIFICATION_EXTERNAL_EMAIL) => {
                if config.external_email.is_null() {
                    diags.error_short(
                        "`external_email` is required for external email notifications",
                        AttributePath::new("external_email"),
                    );
                }
            }
            Some(other) => {
                diags.error(
                    "Invalid notification type",
                    format!("`{other}` is not one of: 1, 2, 4"),
                    AttributePath::new("notification_type"),
                );
            }
        }
    }

    fn key(remote: &Notification) -> Option<i64> {
        remote.id
    }

    fn draft(planned: &NotificationState<'_>) -> Notification {
        Notification {
            user_id: read_number(&planned.user_id).unwrap_or_default(),
            on_cancel: read_numbers(&planned.on_cancel),
            on_failure: read_numbers(&planned.on_failure),
            on_success: read_numbers(&planned.on_success),
            kind: read_number(&planned.notification_type).unwrap_or(NOTIFICATION_EMAIL),
            slack_channel_id: read_opt_string(&planned.slack_channel_id),
            slack_channel_name: read_opt_string(&planned.slack_channel_name),
            external_email: read_opt_string(&planned.external_email),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    fn merge(remote: &mut Notification, changes: &Changes<'_, NotificationState<'_>>) {
        changes.overlay(&mut remote.user_id, |s| &s.user_id, |v| {
            read_number(v).unwrap_or_default()
        });
        changes.overlay(&mut remote.on_cancel, |s| &s.on_cancel, read_numbers);
        changes.overlay(&mut remote.on_failure, |s| &s.on_failure, read_numbers);
        changes.overlay(&mut remote.on_success, |s| &s.on_success, read_numbers);
        changes.overlay(&mut remote.kind, |s| &s.notification_type, |v| {
            read_number(v).unwrap_or(NOTIFICATION_EMAIL)
        });
        changes.overlay(
            &mut remote.slack_channel_id,
            |s| &s.slack_channel_id,
            read_opt_string,
        );
        changes.overlay(
            &mut remote.slack_channel_name,
            |s| &s.slack_channel_name,
            read_opt_string,
        );
        changes.overlay(&mut remote.external_email, |s| &s.external_email, read_opt_string);
    }

    fn refresh(state: &mut NotificationState<'_>, remote: &Notification) {
        state.user_id = Value::Value(remote.user_id);
        sync_numbers(&mut state.on_cancel, &remote.on_cancel);
        sync_numbers(&mut state.on_failure, &remote.on_failure);
        sync_numbers(&mut state.on_success, &remote.on_success);
        state.notification_type = Value::Value(remote.kind);
        sync_string(&mut state.slack_channel_id, remote.slack_channel_id.as_deref());
        sync_string(&mut state.slack_channel_name, remote.slack_channel_name.as_deref());
        sync_string(&mut state.external_email, remote.external_email.as_deref());
    }

    async fn fetch(client: &DbtCloudClient, key: &i64) -> Result<Notification, ApiError> {
        client.get_notification(*key).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &Notification,
    ) -> Result<Notification, ApiError> {
        client.create_notification(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &i64,
        merged: &Notification,
    ) -> Result<Notification, ApiError> {
        client.update_notification(*key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &i64) -> Result<(), ApiError> {
        client.delete_notification(*key).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use crate::managed::convert::{number_list, string};

    use super::*;

    #[test]
    fn slack_notifications_need_a_channel() {
        let mut diags = Diagnostics::default();
        let config = NotificationState {
            user_id: Value::Value(100),
            notification_type: Value::Value(NOTIFICATION_SLACK),
            slack_channel_id: string("C123"),
            ..Default::default()
        };
        NotificationResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        let config = NotificationState {
            notification_type: Value::Value(3),
            ..config
        };
        NotificationResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn external_emails_need_a_recipient() {
        let mut diags = Diagnostics::default();
        let config = NotificationState {
            notification_type: Value::Value(NOTIFICATION_EXTERNAL_EMAIL),
            external_email: Value::Unknown,
            ..Default::default()
        };
        NotificationResource::validate(&mut diags, &config);
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn merge_keeps_other_job_lists() {
        let prior = NotificationState {
            id: string("7"),
            user_id: Value::Value(100),
            on_failure: number_list(&[11]),
            notification_type: Value::Value(NOTIFICATION_EMAIL),
            ..Default::default()
        };
        let planned = NotificationState {
            on_failure: number_list(&[11, 12]),
            ..prior.clone()
        };
        let mut fetched = Notification {
            id: Some(7),
            on_success: vec![13],
            ..NotificationResource::draft(&prior)
        };
        NotificationResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.on_failure, vec![11, 12]);
        assert_eq!(fetched.on_success, vec![13]);
        assert_eq!(fetched.state, STATE_ACTIVE);
    }
}
