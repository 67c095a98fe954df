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
use tf_provider::Diagnostics;

use crate::api::{ApiError, DbtCloudClient, Environment};
use crate::id::CompositeKey;
use crate::managed::convert::{opt_string, read_number, string};
use crate::managed::schema::{block, computed, id, required};
use crate::managed::ApiLookup;
use crate::utils::WithSchema;

use super::require_known;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentData<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub environment_id: ValueNumber,
    pub name: ValueString<'a>,
    pub dbt_version: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub deployment_type: ValueString<'a>,
    pub use_custom_branch: Value<bool>,
    pub custom_branch: ValueString<'a>,
    pub credential_id: ValueNumber,
}

impl WithSchema for EnvironmentData<'_> {
    fn schema() -> Schema {
        block(
            "Existing dbt Cloud environment",
            [
                ("id", id("`<project_id>:<environment_id>`")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "environment_id",
                    required(AttributeType::Number, "Environment id"),
                ),
                ("name", computed(AttributeType::String, "Environment name")),
                ("dbt_version", computed(AttributeType::String, "dbt version")),
                (
                    "type",
                    computed(AttributeType::String, "`development` or `deployment`"),
                ),
                (
                    "deployment_type",
                    computed(AttributeType::String, "`production` or `staging`"),
                ),
                (
                    "use_custom_branch",
                    computed(AttributeType::Bool, "Whether a custom branch is used"),
                ),
                (
                    "custom_branch",
                    computed(AttributeType::String, "Custom git branch"),
                ),
                (
                    "credential_id",
                    computed(AttributeType::Number, "Credential of the environment"),
                ),
            ],
        )
    }
}

impl EnvironmentData<'_> {
    fn fill(&mut self, remote: &Environment) {
        if let Some(id) = remote.id {
            self.id = string((remote.project_id, id).encode());
        }
        self.name = string(remote.name.as_str());
        self.dbt_version = opt_string(remote.dbt_version.as_deref());
        self.kind = string(remote.kind.as_str());
        self.deployment_type = opt_string(remote.deployment_type.as_deref());
        self.use_custom_branch = Value::Value(remote.use_custom_branch);
        self.custom_branch = opt_string(remote.custom_branch.as_deref());
        self.credential_id = remote.credentials_id.map_or(Value::Null, Value::Value);
    }
}

pub struct EnvironmentLookup;

#[async_trait]
impl ApiLookup for EnvironmentLookup {
    const NAME: &'static str = "environment";

    type State<'a> = EnvironmentData<'a>;

    fn validate(diags: &mut Diagnostics, config: &EnvironmentData<'_>) {
        require_known(diags, "project_id", &config.project_id);
        require_known(diags, "environment_id", &config.environment_id);
    }

    async fn lookup<'a>(
        client: &DbtCloudClient,
        mut config: EnvironmentData<'a>,
    ) -> Result<EnvironmentData<'a>, ApiError> {
        let project_id = read_number(&config.project_id).unwrap_or_default();
        let environment_id = read_number(&config.environment_id).unwrap_or_default();
        let environment = client.get_environment(project_id, environment_id).await?;
        config.fill(&environment);
        Ok(config)
    }
}
