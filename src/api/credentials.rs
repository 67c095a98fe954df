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

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{default_state, impl_lifecycle, ApiError, ApiVersion, DbtCloudClient, Extra, Lifecycle};

/// Credential flavour stored under `projects/{id}/credentials/`
pub(crate) trait Credential: Serialize + DeserializeOwned + Lifecycle + Clone {
    fn project_id(&self) -> i64;
    fn prepare(&self, account_id: i64) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeCredential {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    #[serde(rename = "type", default = "snowflake")]
    pub kind: String,
    #[serde(default = "default_state")]
    pub state: i64,
    pub threads: i64,
    pub auth_type: String,
    pub schema: String,
    pub user: String,
    pub database: Option<String>,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn snowflake() -> String {
    "snowflake".to_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresCredential {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    /// `postgres` or `redshift`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_state")]
    pub state: i64,
    pub threads: i64,
    #[serde(default)]
    pub target_name: String,
    pub username: String,
    pub default_schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(SnowflakeCredential, PostgresCredential);

impl Credential for SnowflakeCredential {
    fn project_id(&self) -> i64 {
        self.project_id
    }

    fn prepare(&self, account_id: i64) -> Self {
        Self {
            id: None,
            account_id,
            kind: snowflake(),
            ..self.clone()
        }
    }
}

impl Credential for PostgresCredential {
    fn project_id(&self) -> i64 {
        self.project_id
    }

    fn prepare(&self, account_id: i64) -> Self {
        Self {
            id: None,
            account_id,
            ..self.clone()
        }
    }
}

impl DbtCloudClient {
    fn credential_url(&self, project_id: i64, credential_id: i64) -> String {
        self.url(
            ApiVersion::V3,
            &format!("projects/{project_id}/credentials/{credential_id}/"),
        )
    }

    pub(crate) async fn get_credential<C: Credential>(
        &self,
        project_id: i64,
        credential_id: i64,
    ) -> Result<C, ApiError> {
        self.get_live(&self.credential_url(project_id, credential_id))
            .await
    }

    pub(crate) async fn create_credential<C: Credential + Sync>(
        &self,
        credential: &C,
    ) -> Result<C, ApiError> {
        let url = self.url(
            ApiVersion::V3,
            &format!("projects/{}/credentials/", credential.project_id()),
        );
        self.post(&url, &credential.prepare(self.account_id()))
            .await
    }

    pub(crate) async fn update_credential<C: Credential + Sync>(
        &self,
        project_id: i64,
        credential_id: i64,
        credential: &C,
    ) -> Result<C, ApiError> {
        self.post(&self.credential_url(project_id, credential_id), credential)
            .await
    }

    pub(crate) async fn delete_credential<C: Credential>(
        &self,
        project_id: i64,
        credential_id: i64,
    ) -> Result<C, ApiError> {
        self.retire(&self.credential_url(project_id, credential_id))
            .await
    }

    pub async fn get_snowflake_credential(
        &self,
        project_id: i64,
        credential_id: i64,
    ) -> Result<SnowflakeCredential, ApiError> {
        self.get_credential(project_id, credential_id).await
    }

    pub async fn get_postgres_credential(
        &self,
        project_id: i64,
        credential_id: i64,
    ) -> Result<PostgresCredential, ApiError> {
        self.get_credential(project_id, credential_id).await
    }
}
