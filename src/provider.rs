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

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::data_source::DynamicDataSource;
use tf_provider::resource::DynamicResource;
use tf_provider::schema::{AttributeType, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Provider};

use crate::api::DbtCloudClient;
use crate::config::{process_env, Settings};
use crate::data_sources::{
    EnvironmentLookup, GroupLookup, JobLookup, ProjectLookup, SnowflakeCredentialLookup,
};
use crate::managed::convert::read_number;
use crate::managed::schema::{block, optional, sensitive};
use crate::managed::{ClientSlot, ManagedDataSource, ManagedResource};
use crate::resources::{
    ConnectionResource, EnvironmentResource, EnvironmentVariableResource, GroupResource,
    JobOverrideResource, JobResource, NotificationResource, PostgresCredentialResource,
    ProjectConnectionResource, ProjectRepositoryResource, ProjectResource, RepositoryResource,
    ServiceTokenResource, SnowflakeCredentialResource, WebhookResource,
};
use crate::utils::WithSchema;

/// Name of the provider, prefixing every resource type
pub const PROVIDER_NAME: &str = "dbtcloud";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    pub account_id: ValueNumber,
    pub token: ValueString<'a>,
    pub host_url: ValueString<'a>,
}

impl WithSchema for ProviderConfig<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud",
            [
                (
                    "account_id",
                    optional(
                        AttributeType::Number,
                        "Account id, read from DBT_CLOUD_ACCOUNT_ID if unset",
                    ),
                ),
                (
                    "token",
                    sensitive(optional(
                        AttributeType::String,
                        "API token, read from DBT_CLOUD_TOKEN if unset",
                    )),
                ),
                (
                    "host_url",
                    optional(
                        AttributeType::String,
                        "API root, read from DBT_CLOUD_HOST_URL if unset, `https://cloud.getdbt.com/api` by default",
                    ),
                ),
            ],
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct DbtCloudProvider {
    client: ClientSlot,
}

impl DbtCloudProvider {
    /// Provider already bound to a client
    pub fn with_client(client: DbtCloudClient) -> Self {
        Self {
            client: ClientSlot::with_client(client),
        }
    }
}

#[async_trait]
impl Provider for DbtCloudProvider {
    type Config<'a> = Value<ProviderConfig<'a>>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            if let Some(account_id) = read_number(&config.account_id) {
                if account_id <= 0 {
                    diags.error_short(
                        "`account_id` must be a positive integer",
                        AttributePath::new("account_id"),
                    );
                }
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let config = match config {
            Value::Value(config) => config,
            _ => ProviderConfig::default(),
        };
        for (name, unknown) in [
            ("account_id", config.account_id.is_unknown()),
            ("token", config.token.is_unknown()),
            ("host_url", config.host_url.is_unknown()),
        ] {
            if unknown {
                diags.error(
                    "Unknown provider configuration",
                    format!("`{name}` must be known before resources can be managed"),
                    AttributePath::new(name),
                );
            }
        }
        if !diags.errors.is_empty() {
            return None;
        }

        let settings = match Settings::resolve(
            read_number(&config.account_id),
            config.token.as_deref_option(),
            config.host_url.as_deref_option(),
            process_env,
        ) {
            Ok(settings) => settings,
            Err(err) => {
                diags.root_error("Invalid provider configuration", err.to_string());
                return None;
            }
        };
        let client = match DbtCloudClient::new(&settings) {
            Ok(client) => client,
            Err(err) => {
                diags.root_error("Failed to create the dbt Cloud client", err.to_string());
                return None;
            }
        };

        tracing::info!(
            account_id = settings.account_id,
            host_url = %settings.host_url,
            terraform_version = %terraform_version,
            "configured dbt Cloud provider"
        );
        if !self.client.set(client) {
            tracing::debug!("provider configured twice, keeping the first client");
        }
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let client = &self.client;
        Some(map! {
            "project" => ManagedResource::<ProjectResource>::new(client.clone()),
            "project_connection" => ManagedResource::<ProjectConnectionResource>::new(client.clone()),
            "project_repository" => ManagedResource::<ProjectRepositoryResource>::new(client.clone()),
            "environment" => ManagedResource::<EnvironmentResource>::new(client.clone()),
            "job" => ManagedResource::<JobResource>::new(client.clone()),
            "group" => ManagedResource::<GroupResource>::new(client.clone()),
            "service_token" => ManagedResource::<ServiceTokenResource>::new(client.clone()),
            "webhook" => ManagedResource::<WebhookResource>::new(client.clone()),
            "notification" => ManagedResource::<NotificationResource>::new(client.clone()),
            "snowflake_credential" => ManagedResource::<SnowflakeCredentialResource>::new(client.clone()),
            "postgres_credential" => ManagedResource::<PostgresCredentialResource>::new(client.clone()),
            "connection" => ManagedResource::<ConnectionResource>::new(client.clone()),
            "repository" => ManagedResource::<RepositoryResource>::new(client.clone()),
            "environment_variable" => ManagedResource::<EnvironmentVariableResource>::new(client.clone()),
            "environment_variable_job_override" => ManagedResource::<JobOverrideResource>::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        let client = &self.client;
        Some(map! {
            "project" => ManagedDataSource::<ProjectLookup>::new(client.clone()),
            "environment" => ManagedDataSource::<EnvironmentLookup>::new(client.clone()),
            "job" => ManagedDataSource::<JobLookup>::new(client.clone()),
            "group" => ManagedDataSource::<GroupLookup>::new(client.clone()),
            "snowflake_credential" => ManagedDataSource::<SnowflakeCredentialLookup>::new(client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_resource() {
        let provider = DbtCloudProvider::default();
        let mut diags = Diagnostics::default();
        let resources = provider.get_resources(&mut diags).unwrap();
        assert_eq!(resources.len(), 15);
        assert!(resources.contains_key("environment_variable_job_override"));

        let data_sources = provider.get_data_sources(&mut diags).unwrap();
        assert_eq!(data_sources.len(), 5);
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn rejects_non_positive_account_id() {
        let provider = DbtCloudProvider::default();
        let mut diags = Diagnostics::default();
        let config = Value::Value(ProviderConfig {
            account_id: Value::Value(0),
            ..Default::default()
        });
        assert!(provider.validate(&mut diags, config).await.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn unknown_configuration_is_an_error() {
        let provider = DbtCloudProvider::default();
        let mut diags = Diagnostics::default();
        let config = Value::Value(ProviderConfig {
            account_id: Value::Value(1),
            token: Value::Unknown,
            ..Default::default()
        });
        let configured = provider
            .configure(&mut diags, "1.9.0".to_owned(), config)
            .await;
        assert!(configured.is_none());
        assert_eq!(diags.errors.len(), 1);
    }
}
