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

use crate::api::{ApiError, DbtCloudClient, Project};
use crate::managed::convert::{opt_string, read_number, string};
use crate::managed::schema::{block, computed, id, required};
use crate::managed::ApiLookup;
use crate::utils::WithSchema;

use super::require_known;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub dbt_project_subdirectory: ValueString<'a>,
    pub connection_id: ValueNumber,
    pub repository_id: ValueNumber,
}

impl WithSchema for ProjectData<'_> {
    fn schema() -> Schema {
        block(
            "Existing dbt Cloud project",
            [
                ("id", id("Project id")),
                ("project_id", required(AttributeType::Number, "Project id")),
                ("name", computed(AttributeType::String, "Project name")),
                (
                    "description",
                    computed(AttributeType::String, "Description of the project"),
                ),
                (
                    "dbt_project_subdirectory",
                    computed(
                        AttributeType::String,
                        "Subdirectory of the repository holding the dbt project",
                    ),
                ),
                (
                    "connection_id",
                    computed(AttributeType::Number, "Connection of the project"),
                ),
                (
                    "repository_id",
                    computed(AttributeType::Number, "Repository of the project"),
                ),
            ],
        )
    }
}

impl ProjectData<'_> {
    fn fill(&mut self, remote: &Project) {
        if let Some(id) = remote.id {
            self.id = string(id.to_string());
        }
        self.name = string(remote.name.as_str());
        self.description = opt_string(remote.description.as_deref());
        self.dbt_project_subdirectory = opt_string(remote.dbt_project_subdirectory.as_deref());
        self.connection_id = remote.connection_id.map_or(Value::Null, Value::Value);
        self.repository_id = remote.repository_id.map_or(Value::Null, Value::Value);
    }
}

pub struct ProjectLookup;

#[async_trait]
impl ApiLookup for ProjectLookup {
    const NAME: &'static str = "project";

    type State<'a> = ProjectData<'a>;

    fn validate(diags: &mut Diagnostics, config: &ProjectData<'_>) {
        require_known(diags, "project_id", &config.project_id);
    }

    async fn lookup<'a>(
        client: &DbtCloudClient,
        mut config: ProjectData<'a>,
    ) -> Result<ProjectData<'a>, ApiError> {
        let project_id = read_number(&config.project_id).unwrap_or_default();
        let project = client.get_project(project_id).await?;
        config.fill(&project);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reads_links() {
        let mut data = ProjectData {
            project_id: Value::Value(3),
            ..Default::default()
        };
        data.fill(&Project {
            id: Some(3),
            name: "analytics".to_owned(),
            description: Some(String::new()),
            repository_id: Some(8),
            ..Default::default()
        });
        assert_eq!(data.id, string("3"));
        assert!(data.description.is_null());
        assert!(data.connection_id.is_null());
        assert_eq!(data.repository_id, Value::Value(8));
    }
}
