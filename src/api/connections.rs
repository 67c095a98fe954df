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

/// Warehouse specific settings, only the fields of the connection type are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sso: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(default)]
    pub details: ConnectionDetails,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Connection);

impl DbtCloudClient {
    fn connection_url(&self, project_id: i64, connection_id: i64) -> String {
        self.url(
            ApiVersion::V3,
            &format!("projects/{project_id}/connections/{connection_id}/"),
        )
    }

    pub async fn get_connection(
        &self,
        project_id: i64,
        connection_id: i64,
    ) -> Result<Connection, ApiError> {
        self.get_live(&self.connection_url(project_id, connection_id))
            .await
    }

    pub async fn create_connection(&self, connection: &Connection) -> Result<Connection, ApiError> {
        let body = Connection {
            id: None,
            account_id: self.account_id(),
            ..connection.clone()
        };
        let url = self.url(
            ApiVersion::V3,
            &format!("projects/{}/connections/", connection.project_id),
        );
        self.post(&url, &body).await
    }

    pub async fn update_connection(
        &self,
        project_id: i64,
        connection_id: i64,
        connection: &Connection,
    ) -> Result<Connection, ApiError> {
        self.post(&self.connection_url(project_id, connection_id), connection)
            .await
    }

    pub async fn delete_connection(
        &self,
        project_id: i64,
        connection_id: i64,
    ) -> Result<Connection, ApiError> {
        self.retire(&self.connection_url(project_id, connection_id))
            .await
    }
}
