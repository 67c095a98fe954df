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

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    pub name: String,
    pub dbt_version: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub deployment_type: Option<String>,
    #[serde(default)]
    pub use_custom_branch: bool,
    pub custom_branch: Option<String>,
    pub credentials_id: Option<i64>,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Environment);

impl DbtCloudClient {
    fn environment_url(&self, project_id: i64, environment_id: i64) -> String {
        self.url(
            ApiVersion::V3,
            &format!("projects/{project_id}/environments/{environment_id}/"),
        )
    }

    pub async fn get_environment(
        &self,
        project_id: i64,
        environment_id: i64,
    ) -> Result<Environment, ApiError> {
        self.get_live(&self.environment_url(project_id, environment_id))
            .await
    }

    pub async fn create_environment(
        &self,
        environment: &Environment,
    ) -> Result<Environment, ApiError> {
        let body = Environment {
            id: None,
            account_id: self.account_id(),
            ..environment.clone()
        };
        let url = self.url(
            ApiVersion::V3,
            &format!("projects/{}/environments/", environment.project_id),
        );
        self.post(&url, &body).await
    }

    pub async fn update_environment(
        &self,
        project_id: i64,
        environment_id: i64,
        environment: &Environment,
    ) -> Result<Environment, ApiError> {
        self.post(&self.environment_url(project_id, environment_id), environment)
            .await
    }

    pub async fn delete_environment(
        &self,
        project_id: i64,
        environment_id: i64,
    ) -> Result<(), ApiError> {
        self.delete(&self.environment_url(project_id, environment_id), None::<&()>)
            .await
    }
}
