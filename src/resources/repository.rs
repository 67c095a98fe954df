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

use crate::api::{ApiError, DbtCloudClient, Repository};
use crate::managed::convert::{
    opt_string, read_number, read_opt_string, read_string, string, sync_number,
};
use crate::managed::schema::{block, computed, id, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

use super::{is_active, lifecycle_state, warn_inactive};

const CLONE_STRATEGIES: &[&str] = &[
    "azure_active_directory_app",
    "deploy_key",
    "deploy_token",
    "github_app",
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState<'a> {
    pub id: ValueString<'a>,
    pub repository_id: ValueNumber,
    pub project_id: ValueNumber,
    pub remote_url: ValueString<'a>,
    pub is_active: Value<bool>,
    pub git_clone_strategy: ValueString<'a>,
    pub repository_credentials_id: ValueNumber,
    pub github_installation_id: ValueNumber,
    pub gitlab_project_id: ValueNumber,
    pub deploy_key: ValueString<'a>,
}

impl WithSchema for RepositoryState<'_> {
    fn schema() -> Schema {
        block(
            "Git repository of a dbt Cloud project",
            [
                ("id", id("`<project_id>:<repository_id>`")),
                (
                    "repository_id",
                    computed(AttributeType::Number, "Repository id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "remote_url",
                    required(AttributeType::String, "Git URL of the repository"),
                ),
                (
                    "is_active",
                    optional_computed(AttributeType::Bool, "Whether the repository is active"),
                ),
                (
                    "git_clone_strategy",
                    optional_computed(
                        AttributeType::String,
                        "`deploy_key` (default), `github_app`, `deploy_token` or `azure_active_directory_app`",
                    ),
                ),
                (
                    "repository_credentials_id",
                    optional(AttributeType::Number, "Credentials of a `deploy_token` clone"),
                ),
                (
                    "github_installation_id",
                    optional(AttributeType::Number, "GitHub application installation id"),
                ),
                (
                    "gitlab_project_id",
                    optional(AttributeType::Number, "GitLab project id"),
                ),
                (
                    "deploy_key",
                    computed(
                        AttributeType::String,
                        "Public key to add to the repository for a `deploy_key` clone",
                    ),
                ),
            ],
        )
    }
}

impl WithNormalize for RepositoryState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.is_active.is_null() {
            self.is_active = Value::Value(true);
        }
        if self.git_clone_strategy.is_null() {
            self.git_clone_strategy = string("deploy_key");
        }
    }
}

pub struct RepositoryResource;

#[async_trait]
impl ApiObject for RepositoryResource {
    const NAME: &'static str = "repository";

    type Key = (i64, i64);
    type Remote = Repository;
    type State<'a> = RepositoryState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.repository_id as &mut dyn Computed, &mut state.deploy_key]
    }

    fn validate(diags: &mut Diagnostics, config: &RepositoryState<'_>) {
        check_one_of(
            diags,
            AttributePath::new("git_clone_strategy"),
            &config.git_clone_strategy,
            CLONE_STRATEGIES,
        );
        if config.git_clone_strategy.as_deref_option() == Some("github_app")
            && config.github_installation_id.is_null()
        {
            diags.error_short(
                "`github_installation_id` is required for the `github_app` strategy",
                AttributePath::new("github_installation_id"),
            );
        }
        warn_inactive(diags, &config.is_active);
    }

    fn replace_on(changes: &Changes<'_, RepositoryState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "remote_url", |s| &s.remote_url);
        paths
    }

    fn key(remote: &Repository) -> Option<(i64, i64)> {
        Some((remote.project_id, remote.id?))
    }

    fn draft(planned: &RepositoryState<'_>) -> Repository {
        Repository {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            remote_url: read_string(&planned.remote_url),
            state: lifecycle_state(&planned.is_active),
            git_clone_strategy: read_opt_string(&planned.git_clone_strategy)
                .unwrap_or_else(|| "deploy_key".to_owned()),
            repository_credentials_id: read_number(&planned.repository_credentials_id),
            github_installation_id: read_number(&planned.github_installation_id),
            gitlab_project_id: read_number(&planned.gitlab_project_id),
            ..Default::default()
        }
    }

    fn merge(remote: &mut Repository, changes: &Changes<'_, RepositoryState<'_>>) {
        changes.overlay(&mut remote.state, |s| &s.is_active, lifecycle_state);
        changes.overlay(&mut remote.git_clone_strategy, |s| &s.git_clone_strategy, |v| {
            read_opt_string(v).unwrap_or_else(|| "deploy_key".to_owned())
        });
        changes.overlay(
            &mut remote.repository_credentials_id,
            |s| &s.repository_credentials_id,
            read_number,
        );
        changes.overlay(
            &mut remote.github_installation_id,
            |s| &s.github_installation_id,
            read_number,
        );
        changes.overlay(&mut remote.gitlab_project_id, |s| &s.gitlab_project_id, read_number);
    }

    fn refresh(state: &mut RepositoryState<'_>, remote: &Repository) {
        sync_number(&mut state.repository_id, remote.id);
        state.project_id = Value::Value(remote.project_id);
        state.remote_url = string(remote.remote_url.as_str());
        state.is_active = Value::Value(is_active(remote.state));
        state.git_clone_strategy = string(remote.git_clone_strategy.as_str());
        sync_number(&mut state.repository_credentials_id, remote.repository_credentials_id);
        sync_number(&mut state.github_installation_id, remote.github_installation_id);
        sync_number(&mut state.gitlab_project_id, remote.gitlab_project_id);
        // the key is only included by reads, updates keep the known value
        if remote.deploy_key.is_some() || state.deploy_key.is_unknown() {
            state.deploy_key = opt_string(
                remote
                    .deploy_key
                    .as_ref()
                    .map(|key| key.public_key.as_str()),
            );
        }
    }

    async fn fetch(client: &DbtCloudClient, key: &(i64, i64)) -> Result<Repository, ApiError> {
        client.get_repository(key.0, key.1).await
    }

    async fn create(client: &DbtCloudClient, draft: &Repository) -> Result<Repository, ApiError> {
        client.create_repository(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &Repository,
    ) -> Result<Repository, ApiError> {
        client.update_repository(key.0, key.1, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        client.delete_repository(key.0, key.1).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::DeployKey;
    use crate::managed::plan_state;

    use super::*;

    fn state() -> RepositoryState<'static> {
        let mut state = RepositoryState {
            project_id: Value::Value(3),
            remote_url: string("git@github.com:acme/analytics.git"),
            ..Default::default()
        };
        plan_state::<RepositoryResource>(&mut Diagnostics::default(), &mut state);
        state
    }

    #[test]
    fn deploy_key_is_read_once_known() {
        let mut state = state();
        assert!(state.deploy_key.is_unknown());
        assert_eq!(state.git_clone_strategy, string("deploy_key"));

        let created = Repository {
            id: Some(5),
            ..RepositoryResource::draft(&state)
        };
        RepositoryResource::refresh(&mut state, &created);
        assert!(state.deploy_key.is_null());

        let fetched = Repository {
            deploy_key: Some(DeployKey {
                public_key: "ssh-rsa AAAA".to_owned(),
            }),
            ..created.clone()
        };
        RepositoryResource::refresh(&mut state, &fetched);
        assert_eq!(state.deploy_key, string("ssh-rsa AAAA"));

        RepositoryResource::refresh(&mut state, &created);
        assert_eq!(state.deploy_key, string("ssh-rsa AAAA"));
        assert_eq!(state.repository_id, Value::Value(5));
    }

    #[test]
    fn github_app_needs_an_installation() {
        let mut diags = Diagnostics::default();
        let config = RepositoryState {
            git_clone_strategy: string("github_app"),
            ..state()
        };
        RepositoryResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn remote_url_forces_replacement() {
        let prior = state();
        let planned = RepositoryState {
            remote_url: string("git@github.com:acme/other.git"),
            ..state()
        };
        assert_eq!(
            RepositoryResource::replace_on(&Changes::new(&prior, &planned)).len(),
            1
        );
    }
}
