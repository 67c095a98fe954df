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
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub dbt_project_subdirectory: Option<String>,
    pub connection_id: Option<i64>,
    pub repository_id: Option<i64>,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Project);

impl DbtCloudClient {
    fn project_url(&self, project_id: i64) -> String {
        self.url(ApiVersion::V3, &format!("projects/{project_id}/"))
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Project, ApiError> {
        self.get_live(&self.project_url(project_id)).await
    }

    pub async fn create_project(&self, project: &Project) -> Result<Project, ApiError> {
        let body = Project {
            id: None,
            account_id: self.account_id(),
            ..project.clone()
        };
        self.post(&self.url(ApiVersion::V3, "projects/"), &body)
            .await
    }

    pub async fn update_project(
        &self,
        project_id: i64,
        project: &Project,
    ) -> Result<Project, ApiError> {
        self.post(&self.project_url(project_id), project).await
    }

    pub async fn delete_project(&self, project_id: i64) -> Result<Project, ApiError> {
        self.retire(&self.project_url(project_id)).await
    }
}
