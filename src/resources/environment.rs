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
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{ApiError, DbtCloudClient, Environment, STATE_ACTIVE};
use crate::managed::convert::{
    read_bool, read_number, read_opt_string, read_string, string, sync_number, sync_string,
};
use crate::managed::schema::{block, computed, id, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

pub(crate) const ENVIRONMENT_TYPES: &[&str] = &["development", "deployment"];
pub(crate) const DEPLOYMENT_TYPES: &[&str] = &["production", "staging"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentState<'a> {
    pub id: ValueString<'a>,
    pub environment_id: ValueNumber,
    pub project_id: ValueNumber,
    pub name: ValueString<'a>,
    pub dbt_version: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub deployment_type: ValueString<'a>,
    pub use_custom_branch: Value<bool>,
    pub custom_branch: ValueString<'a>,
    pub credential_id: ValueNumber,
}

impl WithSchema for EnvironmentState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud environment",
            [
                ("id", id("`<project_id>:<environment_id>`")),
                (
                    "environment_id",
                    computed(AttributeType::Number, "Environment id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                ("name", required(AttributeType::String, "Environment name")),
                (
                    "dbt_version",
                    optional_computed(
                        AttributeType::String,
                        "dbt version, `latest` or `versionless` are accepted",
                    ),
                ),
                (
                    "type",
                    required(AttributeType::String, "`development` or `deployment`"),
                ),
                (
                    "deployment_type",
                    optional(
                        AttributeType::String,
                        "`production` or `staging`, only for deployment environments",
                    ),
                ),
                (
                    "use_custom_branch",
                    optional_computed(AttributeType::Bool, "Run on a custom git branch"),
                ),
                (
                    "custom_branch",
                    optional(AttributeType::String, "Branch to run on"),
                ),
                (
                    "credential_id",
                    optional(AttributeType::Number, "Credential used by the environment"),
                ),
            ],
        )
    }
}

impl WithNormalize for EnvironmentState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.use_custom_branch.is_null() {
            self.use_custom_branch = Value::Value(false);
        }
    }
}

pub struct EnvironmentResource;

#[async_trait]
impl ApiObject for EnvironmentResource {
    const NAME: &'static str = "environment";

    type Key = (i64, i64);
    type Remote = Environment;
    type State<'a> = EnvironmentState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.environment_id as &mut dyn Computed, &mut state.dbt_version]
    }

    fn validate(diags: &mut Diagnostics, config: &EnvironmentState<'_>) {
        check_one_of(diags, AttributePath::new("type"), &config.kind, ENVIRONMENT_TYPES);
        check_one_of(
            diags,
            AttributePath::new("deployment_type"),
            &config.deployment_type,
            DEPLOYMENT_TYPES,
        );
        if config.kind.as_deref_option() == Some("development")
            && config.deployment_type.as_deref_option().is_some()
        {
            diags.error(
                "Invalid deployment type",
                "`deployment_type` can only be set on `deployment` environments",
                AttributePath::new("deployment_type"),
            );
        }
    }

    fn replace_on(changes: &Changes<'_, EnvironmentState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "type", |s| &s.kind);
        paths
    }

    fn key(remote: &Environment) -> Option<(i64, i64)> {
        Some((remote.project_id, remote.id?))
    }

    fn draft(planned: &EnvironmentState<'_>) -> Environment {
        Environment {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            name: read_string(&planned.name),
            dbt_version: read_opt_string(&planned.dbt_version),
            kind: read_string(&planned.kind),
            deployment_type: read_opt_string(&planned.deployment_type),
            use_custom_branch: read_bool(&planned.use_custom_branch).unwrap_or_default(),
            custom_branch: read_opt_string(&planned.custom_branch),
            credentials_id: read_number(&planned.credential_id),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    fn merge(remote: &mut Environment, changes: &Changes<'_, EnvironmentState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.dbt_version, |s| &s.dbt_version, read_opt_string);
        changes.overlay(
            &mut remote.deployment_type,
            |s| &s.deployment_type,
            read_opt_string,
        );
        changes.overlay(&mut remote.use_custom_branch, |s| &s.use_custom_branch, |v| {
            read_bool(v).unwrap_or_default()
        });
        changes.overlay(&mut remote.custom_branch, |s| &s.custom_branch, read_opt_string);
        changes.overlay(&mut remote.credentials_id, |s| &s.credential_id, read_number);
    }

    fn refresh(state: &mut EnvironmentState<'_>, remote: &Environment) {
        sync_number(&mut state.environment_id, remote.id);
        state.project_id = Value::Value(remote.project_id);
        state.name = string(remote.name.as_str());
        sync_string(&mut state.dbt_version, remote.dbt_version.as_deref());
        state.kind = string(remote.kind.as_str());
        sync_string(&mut state.deployment_type, remote.deployment_type.as_deref());
        state.use_custom_branch = Value::Value(remote.use_custom_branch);
        sync_string(&mut state.custom_branch, remote.custom_branch.as_deref());
        sync_number(&mut state.credential_id, remote.credentials_id);
    }

    async fn fetch(client: &DbtCloudClient, key: &(i64, i64)) -> Result<Environment, ApiError> {
        client.get_environment(key.0, key.1).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &Environment,
    ) -> Result<Environment, ApiError> {
        client.create_environment(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &Environment,
    ) -> Result<Environment, ApiError> {
        client.update_environment(key.0, key.1, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        client.delete_environment(key.0, key.1).await
    }
}

#[cfg(test)]
mod tests {
    use crate::managed::plan_state;

    use super::*;

    fn state() -> EnvironmentState<'static> {
        EnvironmentState {
            id: string("3:9"),
            environment_id: Value::Value(9),
            project_id: Value::Value(3),
            name: string("Prod"),
            dbt_version: string("latest"),
            kind: string("deployment"),
            deployment_type: string("production"),
            use_custom_branch: Value::Value(false),
            custom_branch: Value::Null,
            credential_id: Value::Value(4),
        }
    }

    #[test]
    fn deployment_type_needs_deployment_environment() {
        let mut diags = Diagnostics::default();
        EnvironmentResource::validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let config = EnvironmentState {
            kind: string("development"),
            ..state()
        };
        EnvironmentResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        let config = EnvironmentState {
            kind: string("staging"),
            deployment_type: Value::Unknown,
            ..state()
        };
        EnvironmentResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn changing_type_forces_replacement() {
        let prior = state();
        let planned = EnvironmentState {
            kind: string("development"),
            name: string("Dev"),
            ..state()
        };
        let paths = EnvironmentResource::replace_on(&Changes::new(&prior, &planned));
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn merge_sends_changed_credential_only() {
        let prior = state();
        let planned = EnvironmentState {
            credential_id: Value::Value(7),
            ..state()
        };
        let mut fetched = EnvironmentResource::draft(&prior);
        fetched.id = Some(9);
        fetched.dbt_version = Some("1.7.0-latest".to_owned());

        EnvironmentResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.credentials_id, Some(7));
        assert_eq!(fetched.dbt_version.as_deref(), Some("1.7.0-latest"));
        assert_eq!(EnvironmentResource::key(&fetched), Some((3, 9)));
    }

    #[test]
    fn planning_marks_computed_values_unknown() {
        let mut planned = EnvironmentState {
            environment_id: Value::Null,
            dbt_version: Value::Null,
            use_custom_branch: Value::Null,
            ..state()
        };
        plan_state::<EnvironmentResource>(&mut Diagnostics::default(), &mut planned);
        assert!(planned.environment_id.is_unknown());
        assert!(planned.dbt_version.is_unknown());
        assert_eq!(planned.use_custom_branch, Value::Value(false));
    }
}
