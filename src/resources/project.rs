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

use crate::api::{ApiError, DbtCloudClient, Project, STATE_ACTIVE};
use crate::managed::convert::{read_number, read_opt_string, read_string, string, sync_string};
use crate::managed::schema::{block, id, optional, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{WithNormalize, WithSchema};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub dbt_project_subdirectory: ValueString<'a>,
}

impl WithSchema for ProjectState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud project",
            [
                ("id", id("Project id")),
                ("name", required(AttributeType::String, "Project name")),
                (
                    "description",
                    optional(AttributeType::String, "Description of the project"),
                ),
                (
                    "dbt_project_subdirectory",
                    optional(
                        AttributeType::String,
                        "Subdirectory of the repository holding the dbt project",
                    ),
                ),
            ],
        )
    }
}

impl WithNormalize for ProjectState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

pub struct ProjectResource;

#[async_trait]
impl ApiObject for ProjectResource {
    const NAME: &'static str = "project";

    type Key = i64;
    type Remote = Project;
    type State<'a> = ProjectState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn key(remote: &Project) -> Option<i64> {
        remote.id
    }

    fn draft(planned: &ProjectState<'_>) -> Project {
        Project {
            name: read_string(&planned.name),
            description: read_opt_string(&planned.description),
            dbt_project_subdirectory: read_opt_string(&planned.dbt_project_subdirectory),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    fn merge(remote: &mut Project, changes: &Changes<'_, ProjectState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.description, |s| &s.description, read_opt_string);
        changes.overlay(
            &mut remote.dbt_project_subdirectory,
            |s| &s.dbt_project_subdirectory,
            read_opt_string,
        );
    }

    fn refresh(state: &mut ProjectState<'_>, remote: &Project) {
        state.name = string(remote.name.as_str());
        sync_string(&mut state.description, remote.description.as_deref());
        sync_string(
            &mut state.dbt_project_subdirectory,
            remote.dbt_project_subdirectory.as_deref(),
        );
    }

    async fn fetch(client: &DbtCloudClient, key: &i64) -> Result<Project, ApiError> {
        client.get_project(*key).await
    }

    async fn create(client: &DbtCloudClient, draft: &Project) -> Result<Project, ApiError> {
        client.create_project(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &i64,
        merged: &Project,
    ) -> Result<Project, ApiError> {
        client.update_project(*key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &i64) -> Result<(), ApiError> {
        client.delete_project(*key).await.map(drop)
    }
}

/// Link between a project and the connection it uses
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConnectionState<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub connection_id: ValueNumber,
}

impl WithSchema for ProjectConnectionState<'_> {
    fn schema() -> Schema {
        block(
            "Connection used by a dbt Cloud project",
            [
                ("id", id("`<project_id>:<connection_id>`")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "connection_id",
                    required(AttributeType::Number, "Connection id"),
                ),
            ],
        )
    }
}

impl WithNormalize for ProjectConnectionState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

pub struct ProjectConnectionResource;

#[async_trait]
impl ApiObject for ProjectConnectionResource {
    const NAME: &'static str = "project connection";

    type Key = (i64, i64);
    type Remote = Project;
    type State<'a> = ProjectConnectionState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn replace_on(changes: &Changes<'_, ProjectConnectionState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "connection_id", |s| &s.connection_id);
        paths
    }

    fn key(remote: &Project) -> Option<(i64, i64)> {
        Some((remote.id?, remote.connection_id?))
    }

    fn draft(planned: &ProjectConnectionState<'_>) -> Project {
        Project {
            id: read_number(&planned.project_id),
            connection_id: read_number(&planned.connection_id),
            ..Default::default()
        }
    }

    fn merge(_remote: &mut Project, _changes: &Changes<'_, ProjectConnectionState<'_>>) {}

    fn refresh(state: &mut ProjectConnectionState<'_>, remote: &Project) {
        state.project_id = remote.id.map_or(Value::Null, Value::Value);
        state.connection_id = remote.connection_id.map_or(Value::Null, Value::Value);
    }

    async fn fetch(client: &DbtCloudClient, key: &(i64, i64)) -> Result<Project, ApiError> {
        let (project_id, connection_id) = *key;
        let project = client.get_project(project_id).await?;
        if project.connection_id != Some(connection_id) {
            return Err(ApiError::not_found(format!(
                "project {project_id} connection {connection_id}"
            )));
        }
        Ok(project)
    }

    async fn create(client: &DbtCloudClient, draft: &Project) -> Result<Project, ApiError> {
        let project_id = draft.id.ok_or(ApiError::MissingIdentifier {
            kind: "project connection",
        })?;
        let mut project = client.get_project(project_id).await?;
        project.connection_id = draft.connection_id;
        client.update_project(project_id, &project).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &Project,
    ) -> Result<Project, ApiError> {
        client.update_project(key.0, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        let mut project = Self::fetch(client, key).await?;
        project.connection_id = None;
        client.update_project(key.0, &project).await.map(drop)
    }
}

/// Link between a project and its git repository
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRepositoryState<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub repository_id: ValueNumber,
}

impl WithSchema for ProjectRepositoryState<'_> {
    fn schema() -> Schema {
        block(
            "Repository used by a dbt Cloud project",
            [
                ("id", id("`<project_id>:<repository_id>`")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "repository_id",
                    required(AttributeType::Number, "Repository id"),
                ),
            ],
        )
    }
}

impl WithNormalize for ProjectRepositoryState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

pub struct ProjectRepositoryResource;

#[async_trait]
impl ApiObject for ProjectRepositoryResource {
    const NAME: &'static str = "project repository";

    type Key = (i64, i64);
    type Remote = Project;
    type State<'a> = ProjectRepositoryState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn replace_on(changes: &Changes<'_, ProjectRepositoryState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "repository_id", |s| &s.repository_id);
        paths
    }

    fn key(remote: &Project) -> Option<(i64, i64)> {
        Some((remote.id?, remote.repository_id?))
    }

    fn draft(planned: &ProjectRepositoryState<'_>) -> Project {
        Project {
            id: read_number(&planned.project_id),
            repository_id: read_number(&planned.repository_id),
            ..Default::default()
        }
    }

    fn merge(_remote: &mut Project, _changes: &Changes<'_, ProjectRepositoryState<'_>>) {}

    fn refresh(state: &mut ProjectRepositoryState<'_>, remote: &Project) {
        state.project_id = remote.id.map_or(Value::Null, Value::Value);
        state.repository_id = remote.repository_id.map_or(Value::Null, Value::Value);
    }

    async fn fetch(client: &DbtCloudClient, key: &(i64, i64)) -> Result<Project, ApiError> {
        let (project_id, repository_id) = *key;
        let project = client.get_project(project_id).await?;
        if project.repository_id != Some(repository_id) {
            return Err(ApiError::not_found(format!(
                "project {project_id} repository {repository_id}"
            )));
        }
        Ok(project)
    }

    async fn create(client: &DbtCloudClient, draft: &Project) -> Result<Project, ApiError> {
        let project_id = draft.id.ok_or(ApiError::MissingIdentifier {
            kind: "project repository",
        })?;
        let mut project = client.get_project(project_id).await?;
        project.repository_id = draft.repository_id;
        client.update_project(project_id, &project).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &Project,
    ) -> Result<Project, ApiError> {
        client.update_project(key.0, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        let mut project = Self::fetch(client, key).await?;
        project.repository_id = None;
        client.update_project(key.0, &project).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> Project {
        Project {
            id: Some(3),
            account_id: 1,
            name: "analytics".to_owned(),
            description: Some("old".to_owned()),
            dbt_project_subdirectory: None,
            connection_id: Some(5),
            repository_id: Some(8),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    #[test]
    fn merge_keeps_unchanged_fields() {
        let prior = ProjectState {
            id: string("3"),
            name: string("analytics"),
            description: string("old"),
            dbt_project_subdirectory: Value::Null,
        };
        let planned = ProjectState {
            description: string("new"),
            ..prior.clone()
        };

        // renamed outside of Terraform since the last refresh
        let mut fetched = Project {
            name: "renamed".to_owned(),
            ..remote()
        };
        ProjectResource::merge(&mut fetched, &Changes::new(&prior, &planned));

        assert_eq!(fetched.name, "renamed");
        assert_eq!(fetched.description.as_deref(), Some("new"));
        assert_eq!(fetched.connection_id, Some(5));
        assert_eq!(fetched.repository_id, Some(8));
    }

    #[test]
    fn refresh_keeps_null_optionals() {
        let mut state = ProjectState {
            dbt_project_subdirectory: Value::Null,
            ..Default::default()
        };
        ProjectResource::refresh(&mut state, &remote());
        assert_eq!(state.name, string("analytics"));
        assert_eq!(state.description, string("old"));
        assert!(state.dbt_project_subdirectory.is_null());
    }

    #[test]
    fn links_are_keyed_by_project() {
        assert_eq!(ProjectConnectionResource::key(&remote()), Some((3, 5)));
        assert_eq!(ProjectRepositoryResource::key(&remote()), Some((3, 8)));
        assert_eq!(
            ProjectConnectionResource::key(&Project {
                connection_id: None,
                ..remote()
            }),
            None
        );
    }

    #[test]
    fn changing_a_link_forces_replacement() {
        let prior = ProjectConnectionState {
            id: string("3:5"),
            project_id: Value::Value(3),
            connection_id: Value::Value(5),
        };
        let planned = ProjectConnectionState {
            connection_id: Value::Value(6),
            ..prior.clone()
        };
        let paths = ProjectConnectionResource::replace_on(&Changes::new(&prior, &planned));
        assert_eq!(paths.len(), 1);
    }
}
