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

use crate::api::{ApiError, DbtCloudClient, Webhook};
use crate::managed::convert::{
    opt_string, read_bool, read_numbers, read_opt_string, read_string, read_strings, string,
    string_list, sync_numbers, sync_string,
};
use crate::managed::schema::{
    block, computed, id, list_of, optional, optional_computed, required, sensitive,
};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

const EVENT_TYPES: &[&str] = &["job.run.started", "job.run.completed", "job.run.errored"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookState<'a> {
    pub id: ValueString<'a>,
    pub webhook_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub client_url: ValueString<'a>,
    pub event_types: ValueList<ValueString<'a>>,
    pub job_ids: ValueList<ValueNumber>,
    pub active: Value<bool>,
    pub hmac_secret: ValueString<'a>,
    pub http_status_code: ValueString<'a>,
    pub account_identifier: ValueString<'a>,
}

impl WithSchema for WebhookState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud webhook subscription",
            [
                ("id", id("Webhook id")),
                (
                    "webhook_id",
                    computed(AttributeType::String, "Webhook id generated by dbt Cloud"),
                ),
                ("name", required(AttributeType::String, "Webhook name")),
                (
                    "description",
                    optional(AttributeType::String, "Description of the webhook"),
                ),
                (
                    "client_url",
                    required(AttributeType::String, "URL receiving the events"),
                ),
                (
                    "event_types",
                    required(
                        list_of(AttributeType::String),
                        "`job.run.started`, `job.run.completed` or `job.run.errored`",
                    ),
                ),
                (
                    "job_ids",
                    optional(
                        list_of(AttributeType::Number),
                        "Jobs sending events, all jobs if empty",
                    ),
                ),
                (
                    "active",
                    optional_computed(AttributeType::Bool, "Whether the webhook is active"),
                ),
                (
                    "hmac_secret",
                    sensitive(computed(
                        AttributeType::String,
                        "Secret used to sign the events",
                    )),
                ),
                (
                    "http_status_code",
                    computed(AttributeType::String, "Last status code returned by the client"),
                ),
                (
                    "account_identifier",
                    computed(AttributeType::String, "Account identifier of the webhook"),
                ),
            ],
        )
    }
}

impl WithNormalize for WebhookState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.active.is_null() {
            self.active = Value::Value(true);
        }
    }
}

fn job_ids_of(state: &WebhookState<'_>) -> Vec<String> {
    read_numbers(&state.job_ids)
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

pub struct WebhookResource;

#[async_trait]
impl ApiObject for WebhookResource {
    const NAME: &'static str = "webhook";

    type Key = String;
    type Remote = Webhook;
    type State<'a> = WebhookState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![
            &mut state.webhook_id as &mut dyn Computed,
            &mut state.hmac_secret,
            &mut state.http_status_code,
            &mut state.account_identifier,
        ]
    }

    fn validate(diags: &mut Diagnostics, config: &WebhookState<'_>) {
        for (i, event_type) in config.event_types.iter().flatten().enumerate() {
            check_one_of(
                diags,
                AttributePath::new("event_types").index(i as i64),
                event_type,
                EVENT_TYPES,
            );
        }
        if let Some(url) = config.client_url.as_deref_option() {
            if !url.starts_with("https://") {
                diags.error_short(
                    "`client_url` must be an https URL",
                    AttributePath::new("client_url"),
                );
            }
        }
    }

    fn key(remote: &Webhook) -> Option<String> {
        remote.id.clone()
    }

    fn draft(planned: &WebhookState<'_>) -> Webhook {
        Webhook {
            name: read_string(&planned.name),
            description: read_opt_string(&planned.description),
            client_url: read_string(&planned.client_url),
            event_types: read_strings(&planned.event_types),
            job_ids: job_ids_of(planned),
            active: read_bool(&planned.active).unwrap_or(true),
            ..Default::default()
        }
    }

    fn merge(remote: &mut Webhook, changes: &Changes<'_, WebhookState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.description, |s| &s.description, read_opt_string);
        changes.overlay(&mut remote.client_url, |s| &s.client_url, read_string);
        changes.overlay(&mut remote.event_types, |s| &s.event_types, read_strings);
        if changes.has_change(|s| &s.job_ids) {
            remote.job_ids = job_ids_of(changes.planned());
        }
        changes.overlay(&mut remote.active, |s| &s.active, |v| {
            read_bool(v).unwrap_or(true)
        });
    }

    fn refresh(state: &mut WebhookState<'_>, remote: &Webhook) {
        if let Some(id) = &remote.id {
            state.webhook_id = string(id.as_str());
        }
        state.name = string(remote.name.as_str());
        sync_string(&mut state.description, remote.description.as_deref());
        state.client_url = string(remote.client_url.as_str());
        state.event_types = string_list(&remote.event_types);
        // job ids are strings in the API
        let job_ids: Vec<i64> = remote
            .job_ids
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect();
        sync_numbers(&mut state.job_ids, &job_ids);
        state.active = Value::Value(remote.active);
        if remote.hmac_secret.is_some() || state.hmac_secret.is_unknown() {
            state.hmac_secret = opt_string(remote.hmac_secret.as_deref());
        }
        state.http_status_code = opt_string(remote.http_status_code.as_deref());
        state.account_identifier = opt_string(remote.account_identifier.as_deref());
    }

    async fn fetch(client: &DbtCloudClient, key: &String) -> Result<Webhook, ApiError> {
        client.get_webhook(key).await
    }

    async fn create(client: &DbtCloudClient, draft: &Webhook) -> Result<Webhook, ApiError> {
        client.create_webhook(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &String,
        merged: &Webhook,
    ) -> Result<Webhook, ApiError> {
        client.update_webhook(key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &String) -> Result<(), ApiError> {
        client.delete_webhook(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WebhookState<'static> {
        let mut state = WebhookState {
            name: string("alerts"),
            client_url: string("https://hooks.example.com/dbt"),
            event_types: string_list(&["job.run.errored".to_owned()]),
            job_ids: Value::Value(vec![Value::Value(11), Value::Value(12)]),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        state
    }

    #[test]
    fn job_ids_are_sent_as_strings() {
        let webhook = WebhookResource::draft(&state());
        assert_eq!(webhook.job_ids, vec!["11".to_owned(), "12".to_owned()]);
        assert!(webhook.active);
    }

    #[test]
    fn refresh_reads_generated_fields() {
        let mut state = state();
        let remote = Webhook {
            id: Some("wsu_12ab".to_owned()),
            hmac_secret: Some("s3cr3t".to_owned()),
            http_status_code: None,
            account_identifier: Some("act_1".to_owned()),
            ..WebhookResource::draft(&state)
        };
        WebhookResource::refresh(&mut state, &remote);
        assert_eq!(state.webhook_id, string("wsu_12ab"));
        assert_eq!(state.hmac_secret, string("s3cr3t"));
        assert!(state.http_status_code.is_null());
        assert_eq!(
            read_numbers(&state.job_ids),
            vec![11, 12],
        );

        // the secret is not returned by updates
        let remote = Webhook {
            hmac_secret: None,
            ..remote
        };
        WebhookResource::refresh(&mut state, &remote);
        assert_eq!(state.hmac_secret, string("s3cr3t"));
    }

    #[test]
    fn event_types_are_checked() {
        let mut diags = Diagnostics::default();
        WebhookResource::validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let config = WebhookState {
            event_types: string_list(&["job.run.finished".to_owned()]),
            client_url: string("http://hooks.example.com"),
            ..state()
        };
        WebhookResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }
}
