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

use crate::api::{ApiError, DbtCloudClient};
use crate::id::CompositeKey;
use crate::managed::convert::{read_number, string};
use crate::managed::schema::{block, computed, id, required};
use crate::managed::ApiLookup;
use crate::resources::{refresh_snowflake, SnowflakeCredentialState};
use crate::utils::WithSchema;

use super::require_known;

/// Snowflake credential without its secrets, which the API never returns
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeCredentialData<'a> {
    pub id: ValueString<'a>,
    pub project_id: ValueNumber,
    pub credential_id: ValueNumber,
    pub is_active: Value<bool>,
    pub auth_type: ValueString<'a>,
    pub database: ValueString<'a>,
    pub role: ValueString<'a>,
    pub warehouse: ValueString<'a>,
    pub schema: ValueString<'a>,
    pub user: ValueString<'a>,
    pub num_threads: ValueNumber,
}

impl WithSchema for SnowflakeCredentialData<'_> {
    fn schema() -> Schema {
        block(
            "Existing Snowflake credential",
            [
                ("id", id("`<project_id>:<credential_id>`")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "credential_id",
                    required(AttributeType::Number, "Credential id"),
                ),
                (
                    "is_active",
                    computed(AttributeType::Bool, "Whether the credential is active"),
                ),
                (
                    "auth_type",
                    computed(AttributeType::String, "`password` or `keypair`"),
                ),
                ("database", computed(AttributeType::String, "Database")),
                ("role", computed(AttributeType::String, "Role")),
                ("warehouse", computed(AttributeType::String, "Warehouse")),
                ("schema", computed(AttributeType::String, "Default schema")),
                ("user", computed(AttributeType::String, "Username")),
                (
                    "num_threads",
                    computed(AttributeType::Number, "Number of threads"),
                ),
            ],
        )
    }
}

pub struct SnowflakeCredentialLookup;

#[async_trait]
impl ApiLookup for SnowflakeCredentialLookup {
    const NAME: &'static str = "snowflake credential";

    type State<'a> = SnowflakeCredentialData<'a>;

    fn validate(diags: &mut Diagnostics, config: &SnowflakeCredentialData<'_>) {
        require_known(diags, "project_id", &config.project_id);
        require_known(diags, "credential_id", &config.credential_id);
    }

    async fn lookup<'a>(
        client: &DbtCloudClient,
        config: SnowflakeCredentialData<'a>,
    ) -> Result<SnowflakeCredentialData<'a>, ApiError> {
        let key = (
            read_number(&config.project_id).unwrap_or_default(),
            read_number(&config.credential_id).unwrap_or_default(),
        );
        let credential = client.get_snowflake_credential(key.0, key.1).await?;

        let mut state = SnowflakeCredentialState::default();
        refresh_snowflake(&mut state, &credential);
        Ok(SnowflakeCredentialData {
            id: string(key.encode()),
            project_id: config.project_id,
            credential_id: config.credential_id,
            is_active: state.is_active,
            auth_type: state.auth_type,
            database: state.database,
            role: state.role,
            warehouse: state.warehouse,
            schema: state.schema,
            user: state.user,
            num_threads: state.num_threads,
        })
    }
}
