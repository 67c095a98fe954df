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
pub struct DeployKey {
    pub public_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    pub remote_url: String,
    #[serde(default = "default_state")]
    pub state: i64,
    pub git_clone_strategy: String,
    pub repository_credentials_id: Option<i64>,
    pub github_installation_id: Option<i64>,
    pub gitlab_project_id: Option<i64>,
    #[serde(default, skip_serializing)]
    pub deploy_key: Option<DeployKey>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Repository);

impl DbtCloudClient {
    fn repository_url(&self, project_id: i64, repository_id: i64) -> String {
        self.url(
            ApiVersion::V3,
            &format!("projects/{project_id}/repositories/{repository_id}/"),
        )
    }

    pub async fn get_repository(
        &self,
        project_id: i64,
        repository_id: i64,
    ) -> Result<Repository, ApiError> {
        let url = format!(
            "{}?include_related=[deploy_key]",
            self.repository_url(project_id, repository_id)
        );
        self.get_live(&url).await
    }

    pub async fn create_repository(&self, repository: &Repository) -> Result<Repository, ApiError> {
        let body = Repository {
            id: None,
            account_id: self.account_id(),
            ..repository.clone()
        };
        let url = self.url(
            ApiVersion::V3,
            &format!("projects/{}/repositories/", repository.project_id),
        );
        self.post(&url, &body).await
    }

    pub async fn update_repository(
        &self,
        project_id: i64,
        repository_id: i64,
        repository: &Repository,
    ) -> Result<Repository, ApiError> {
        self.post(&self.repository_url(project_id, repository_id), repository)
            .await
    }

    pub async fn delete_repository(
        &self,
        project_id: i64,
        repository_id: i64,
    ) -> Result<(), ApiError> {
        self.delete(&self.repository_url(project_id, repository_id), None::<&()>)
            .await
    }
}
