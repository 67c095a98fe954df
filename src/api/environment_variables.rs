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

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiVersion, DbtCloudClient, Extra};

/// Environment name used for the project-wide default value
pub const PROJECT_DEFAULT: &str = "project";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentValue {
    pub id: Option<i64>,
    pub value: String,
}

/// Variable with its value for each environment, keyed by environment name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentVariable {
    pub project_id: i64,
    pub name: String,
    pub values: BTreeMap<String, EnvironmentValue>,
}

impl EnvironmentVariable {
    fn ids(&self) -> Vec<i64> {
        self.values.values().filter_map(|value| value.id).collect()
    }

    fn plain_values(&self) -> BTreeMap<&str, &str> {
        self.values
            .iter()
            .map(|(env, value)| (env.as_str(), value.value.as_str()))
            .collect()
    }
}

#[derive(Serialize)]
struct BulkBody<'a> {
    env_var_name: &'a str,
    ids: Vec<i64>,
    #[serde(flatten)]
    values: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
struct BulkDelete {
    ids: Vec<i64>,
}

/// Job-level override of an environment variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    pub job_definition_id: i64,
    pub name: String,
    pub raw_value: String,
    #[serde(rename = "type", default = "job_kind")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Extra,
}

fn job_kind() -> String {
    "job".to_owned()
}

impl DbtCloudClient {
    fn environment_variables_url(&self, project_id: i64, path: &str) -> String {
        self.url(
            ApiVersion::V3,
            &format!("projects/{project_id}/environment-variables/{path}"),
        )
    }

    /// Every variable of a project
    pub async fn list_environment_variables(
        &self,
        project_id: i64,
    ) -> Result<Vec<EnvironmentVariable>, ApiError> {
        let url = self.environment_variables_url(project_id, "environment/");
        let listed: BTreeMap<String, BTreeMap<String, EnvironmentValue>> = self.get(&url).await?;
        Ok(listed
            .into_iter()
            .map(|(name, values)| EnvironmentVariable {
                project_id,
                name,
                values,
            })
            .collect())
    }

    pub async fn get_environment_variable(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<EnvironmentVariable, ApiError> {
        self.list_environment_variables(project_id)
            .await?
            .into_iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| {
                ApiError::not_found(self.environment_variables_url(project_id, name))
            })
    }

    pub async fn create_environment_variable(
        &self,
        variable: &EnvironmentVariable,
    ) -> Result<EnvironmentVariable, ApiError> {
        let body = BulkBody {
            env_var_name: &variable.name,
            ids: Vec::new(),
            values: variable.plain_values(),
        };
        let url = self.environment_variables_url(variable.project_id, "bulk/");
        self.call(Method::POST, &url, Some(&body)).await?;
        self.get_environment_variable(variable.project_id, &variable.name)
            .await
    }

    /// Replace the values of a variable; `variable.values` keeps the ids of existing values
    pub async fn update_environment_variable(
        &self,
        variable: &EnvironmentVariable,
    ) -> Result<EnvironmentVariable, ApiError> {
        let body = BulkBody {
            env_var_name: &variable.name,
            ids: variable.ids(),
            values: variable.plain_values(),
        };
        let url = self.environment_variables_url(variable.project_id, "bulk/");
        self.call(Method::PUT, &url, Some(&body)).await?;
        self.get_environment_variable(variable.project_id, &variable.name)
            .await
    }

    pub async fn delete_environment_variable(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<(), ApiError> {
        let variable = self.get_environment_variable(project_id, name).await?;
        let url = self.environment_variables_url(project_id, "bulk/");
        self.delete(&url, Some(&BulkDelete { ids: variable.ids() }))
            .await
    }

    fn job_override_url(&self, project_id: i64, override_id: i64) -> String {
        self.environment_variables_url(project_id, &format!("{override_id}/"))
    }

    /// Fetch an override, which must belong to `job_id`
    pub async fn get_job_override(
        &self,
        project_id: i64,
        job_id: i64,
        override_id: i64,
    ) -> Result<JobOverride, ApiError> {
        let url = self.job_override_url(project_id, override_id);
        let job_override: JobOverride = self.get(&url).await?;
        if job_override.job_definition_id != job_id {
            return Err(ApiError::not_found(url));
        }
        Ok(job_override)
    }

    pub async fn create_job_override(
        &self,
        job_override: &JobOverride,
    ) -> Result<JobOverride, ApiError> {
        let body = JobOverride {
            id: None,
            account_id: self.account_id(),
            kind: job_kind(),
            ..job_override.clone()
        };
        let url = self.environment_variables_url(job_override.project_id, "");
        self.post(&url, &body).await
    }

    pub async fn update_job_override(
        &self,
        project_id: i64,
        override_id: i64,
        job_override: &JobOverride,
    ) -> Result<JobOverride, ApiError> {
        self.post(&self.job_override_url(project_id, override_id), job_override)
            .await
    }

    pub async fn delete_job_override(
        &self,
        project_id: i64,
        override_id: i64,
    ) -> Result<(), ApiError> {
        self.delete(&self.job_override_url(project_id, override_id), None::<&()>)
            .await
    }
}
