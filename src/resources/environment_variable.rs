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

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeType, Schema};
use tf_provider::value::{Value, ValueMap, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{
    ApiError, DbtCloudClient, EnvironmentValue, EnvironmentVariable, JobOverride,
};
use crate::id::ID_DELIMITER;
use crate::managed::convert::{
    read_number, read_string, read_string_map, string, string_map, sync_number,
};
use crate::managed::schema::{block, computed, id, map_of, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{WithNormalize, WithSchema};

const NAME_PREFIX: &str = "DBT_";

fn validate_name(diags: &mut Diagnostics, name: &ValueString<'_>) {
    if let Some(name) = name.as_deref_option() {
        if !name.starts_with(NAME_PREFIX) {
            diags.error(
                "Invalid environment variable name",
                format!("`{name}` must start with `{NAME_PREFIX}`"),
                AttributePath::new("name"),
            );
        }
        if name.contains(ID_DELIMITER) {
            diags.error(
                "Invalid environment variable name",
                format!("`{name}` cannot contain `{ID_DELIMITER}`"),
                AttributePath::new("name"),
            );
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariableState<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub name: ValueString<'a>,
    pub environment_values: ValueMap<'a, ValueString<'a>>,
}

impl WithSchema for EnvironmentVariableState<'_> {
    fn schema() -> Schema {
        block(
            "Environment variable of a dbt Cloud project",
            [
                ("id", id("`<project_id>:<name>`")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "name",
                    required(AttributeType::String, "Variable name, starting with `DBT_`"),
                ),
                (
                    "environment_values",
                    required(
                        map_of(AttributeType::String),
                        "Value per environment name, `project` holding the project default",
                    ),
                ),
            ],
        )
    }
}

impl WithNormalize for EnvironmentVariableState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

/// Values to write, keeping the ids of the values that already exist.
///
/// Environments removed from the configuration are sent with an empty
/// value, which unsets them.
fn planned_values(
    existing: &BTreeMap<String, EnvironmentValue>,
    planned: &BTreeMap<String, String>,
) -> BTreeMap<String, EnvironmentValue> {
    let mut values: BTreeMap<String, EnvironmentValue> = existing
        .iter()
        .filter(|(_, value)| value.id.is_some())
        .map(|(env, value)| {
            let unset = EnvironmentValue {
                id: value.id,
                value: String::new(),
            };
            (env.clone(), unset)
        })
        .collect();
    for (env, value) in planned {
        values
            .entry(env.clone())
            .or_insert_with(EnvironmentValue::default)
            .value = value.clone();
    }
    values
}

pub struct EnvironmentVariableResource;

#[async_trait]
impl ApiObject for EnvironmentVariableResource {
    const NAME: &'static str = "environment variable";

    type Key = (i64, String);
    type Remote = EnvironmentVariable;
    type State<'a> = EnvironmentVariableState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn validate(diags: &mut Diagnostics, config: &EnvironmentVariableState<'_>) {
        validate_name(diags, &config.name);
    }

    fn replace_on(changes: &Changes<'_, EnvironmentVariableState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "name", |s| &s.name);
        paths
    }

    fn key(remote: &EnvironmentVariable) -> Option<(i64, String)> {
        Some((remote.project_id, remote.name.clone()))
    }

    fn draft(planned: &EnvironmentVariableState<'_>) -> EnvironmentVariable {
        EnvironmentVariable {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            name: read_string(&planned.name),
            values: planned_values(
                &BTreeMap::new(),
                &read_string_map(&planned.environment_values),
            ),
        }
    }

    fn merge(
        remote: &mut EnvironmentVariable,
        changes: &Changes<'_, EnvironmentVariableState<'_>>,
    ) {
        if changes.has_change(|s| &s.environment_values) {
            let planned = read_string_map(&changes.planned().environment_values);
            remote.values = planned_values(&remote.values, &planned);
        }
    }

    fn refresh(state: &mut EnvironmentVariableState<'_>, remote: &EnvironmentVariable) {
        state.project_id = Value::Value(remote.project_id);
        state.name = string(remote.name.as_str());
        let values: BTreeMap<String, String> = remote
            .values
            .iter()
            .filter(|(_, value)| !value.value.is_empty())
            .map(|(env, value)| (env.clone(), value.value.clone()))
            .collect();
        state.environment_values = string_map(&values);
    }

    async fn fetch(
        client: &DbtCloudClient,
        key: &(i64, String),
    ) -> Result<EnvironmentVariable, ApiError> {
        client.get_environment_variable(key.0, &key.1).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &EnvironmentVariable,
    ) -> Result<EnvironmentVariable, ApiError> {
        client.create_environment_variable(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        _key: &(i64, String),
        merged: &EnvironmentVariable,
    ) -> Result<EnvironmentVariable, ApiError> {
        client.update_environment_variable(merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, String)) -> Result<(), ApiError> {
        client.delete_environment_variable(key.0, &key.1).await
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOverrideState<'a> {
    pub id: ValueString<'a>,
    pub environment_variable_job_override_id: ValueNumber,
    pub project_id: ValueNumber,
    pub job_definition_id: ValueNumber,
    pub name: ValueString<'a>,
    pub raw_value: ValueString<'a>,
}

impl WithSchema for JobOverrideState<'_> {
    fn schema() -> Schema {
        block(
            "Job-level override of a dbt Cloud environment variable",
            [
                ("id", id("`<project_id>:<job_definition_id>:<override_id>`")),
                (
                    "environment_variable_job_override_id",
                    computed(AttributeType::Number, "Override id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "job_definition_id",
                    required(AttributeType::Number, "Job the override applies to"),
                ),
                (
                    "name",
                    required(AttributeType::String, "Name of the overridden variable"),
                ),
                (
                    "raw_value",
                    required(AttributeType::String, "Value used by the job"),
                ),
            ],
        )
    }
}

impl WithNormalize for JobOverrideState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

pub struct JobOverrideResource;

#[async_trait]
impl ApiObject for JobOverrideResource {
    const NAME: &'static str = "environment variable job override";

    type Key = (i64, i64, i64);
    type Remote = JobOverride;
    type State<'a> = JobOverrideState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.environment_variable_job_override_id as &mut dyn Computed]
    }

    fn validate(diags: &mut Diagnostics, config: &JobOverrideState<'_>) {
        validate_name(diags, &config.name);
    }

    fn replace_on(changes: &Changes<'_, JobOverrideState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "job_definition_id", |s| &s.job_definition_id);
        changes.replace_if(&mut paths, "name", |s| &s.name);
        paths
    }

    fn key(remote: &JobOverride) -> Option<(i64, i64, i64)> {
        Some((remote.project_id, remote.job_definition_id, remote.id?))
    }

    fn draft(planned: &JobOverrideState<'_>) -> JobOverride {
        JobOverride {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            job_definition_id: read_number(&planned.job_definition_id).unwrap_or_default(),
            name: read_string(&planned.name),
            raw_value: read_string(&planned.raw_value),
            ..Default::default()
        }
    }

    fn merge(remote: &mut JobOverride, changes: &Changes<'_, JobOverrideState<'_>>) {
        changes.overlay(&mut remote.raw_value, |s| &s.raw_value, read_string);
    }

    fn refresh(state: &mut JobOverrideState<'_>, remote: &JobOverride) {
        sync_number(&mut state.environment_variable_job_override_id, remote.id);
        state.project_id = Value::Value(remote.project_id);
        state.job_definition_id = Value::Value(remote.job_definition_id);
        state.name = string(remote.name.as_str());
        state.raw_value = string(remote.raw_value.as_str());
    }

    async fn fetch(
        client: &DbtCloudClient,
        key: &(i64, i64, i64),
    ) -> Result<JobOverride, ApiError> {
        client.get_job_override(key.0, key.1, key.2).await
    }

    async fn create(client: &DbtCloudClient, draft: &JobOverride) -> Result<JobOverride, ApiError> {
        client.create_job_override(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64, i64),
        merged: &JobOverride,
    ) -> Result<JobOverride, ApiError> {
        client.update_job_override(key.0, key.2, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64, i64)) -> Result<(), ApiError> {
        client.delete_job_override(key.0, key.2).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::PROJECT_DEFAULT;

    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(env, value)| (env.to_string(), value.to_string()))
            .collect()
    }

    fn state(pairs: &[(&str, &str)]) -> EnvironmentVariableState<'static> {
        EnvironmentVariableState {
            id: string("3:DBT_TARGET"),
            project_id: Value::Value(3),
            name: string("DBT_TARGET"),
            environment_values: string_map(&values(pairs)),
        }
    }

    #[test]
    fn names_must_have_the_dbt_prefix() {
        let mut diags = Diagnostics::default();
        EnvironmentVariableResource::validate(&mut diags, &state(&[]));
        assert!(diags.errors.is_empty());

        let config = EnvironmentVariableState {
            name: string("TARGET"),
            ..state(&[])
        };
        EnvironmentVariableResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn names_cannot_hold_the_id_delimiter() {
        let mut diags = Diagnostics::default();
        let config = EnvironmentVariableState {
            name: string("DBT_A:B"),
            ..state(&[])
        };
        EnvironmentVariableResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);

        let mut diags = Diagnostics::default();
        let config = JobOverrideState {
            name: string("DBT_A:B"),
            ..Default::default()
        };
        JobOverrideResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn merge_keeps_value_ids_and_unsets_removed_environments() {
        let prior = state(&[(PROJECT_DEFAULT, "dev"), ("Production", "prod")]);
        let planned = state(&[(PROJECT_DEFAULT, "dev"), ("Staging", "stg")]);
        let mut fetched = EnvironmentVariable {
            project_id: 3,
            name: "DBT_TARGET".to_owned(),
            values: BTreeMap::from([
                (
                    PROJECT_DEFAULT.to_owned(),
                    EnvironmentValue {
                        id: Some(1),
                        value: "dev".to_owned(),
                    },
                ),
                (
                    "Production".to_owned(),
                    EnvironmentValue {
                        id: Some(2),
                        value: "prod".to_owned(),
                    },
                ),
            ]),
        };

        EnvironmentVariableResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.values[PROJECT_DEFAULT].id, Some(1));
        assert_eq!(fetched.values["Production"].id, Some(2));
        assert_eq!(fetched.values["Production"].value, "");
        assert_eq!(fetched.values["Staging"].id, None);
        assert_eq!(fetched.values["Staging"].value, "stg");

        let mut refreshed = prior.clone();
        EnvironmentVariableResource::refresh(&mut refreshed, &fetched);
        assert_eq!(refreshed, planned);
    }

    #[test]
    fn override_key_includes_the_job() {
        let job_override = JobOverride {
            id: Some(30),
            project_id: 3,
            job_definition_id: 12,
            name: "DBT_TARGET".to_owned(),
            raw_value: "ci".to_owned(),
            ..Default::default()
        };
        assert_eq!(JobOverrideResource::key(&job_override), Some((3, 12, 30)));

        let mut state = JobOverrideState::default();
        state.normalize(&mut Diagnostics::default());
        JobOverrideResource::refresh(&mut state, &job_override);
        assert_eq!(state.environment_variable_job_override_id, Value::Value(30));
        assert_eq!(state.raw_value, string("ci"));
    }
}
