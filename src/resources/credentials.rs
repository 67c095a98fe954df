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

use crate::api::{ApiError, DbtCloudClient, PostgresCredential, SnowflakeCredential};
use crate::managed::convert::{
    read_number, read_opt_string, read_string, string, sync_number, sync_string,
};
use crate::managed::schema::{
    block, computed, id, optional, optional_computed, required, sensitive,
};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

use super::{is_active, lifecycle_state, warn_inactive};

const AUTH_TYPES: &[&str] = &["password", "keypair"];
const POSTGRES_TYPES: &[&str] = &["postgres", "redshift"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeCredentialState<'a> {
    pub id: ValueString<'a>,
    pub credential_id: ValueNumber,
    pub project_id: ValueNumber,
    pub is_active: Value<bool>,
    pub auth_type: ValueString<'a>,
    pub database: ValueString<'a>,
    pub role: ValueString<'a>,
    pub warehouse: ValueString<'a>,
    pub schema: ValueString<'a>,
    pub user: ValueString<'a>,
    pub password: ValueString<'a>,
    pub private_key: ValueString<'a>,
    pub private_key_passphrase: ValueString<'a>,
    pub num_threads: ValueNumber,
}

impl WithSchema for SnowflakeCredentialState<'_> {
    fn schema() -> Schema {
        block(
            "Snowflake credential of a dbt Cloud project",
            [
                ("id", id("`<project_id>:<credential_id>`")),
                (
                    "credential_id",
                    computed(AttributeType::Number, "Credential id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "is_active",
                    optional_computed(AttributeType::Bool, "Whether the credential is active"),
                ),
                (
                    "auth_type",
                    required(AttributeType::String, "`password` or `keypair`"),
                ),
                ("database", optional(AttributeType::String, "Database")),
                ("role", optional(AttributeType::String, "Role")),
                ("warehouse", optional(AttributeType::String, "Warehouse")),
                ("schema", required(AttributeType::String, "Default schema")),
                ("user", required(AttributeType::String, "Username")),
                (
                    "password",
                    sensitive(optional(AttributeType::String, "Password of `password` auth")),
                ),
                (
                    "private_key",
                    sensitive(optional(AttributeType::String, "Private key of `keypair` auth")),
                ),
                (
                    "private_key_passphrase",
                    sensitive(optional(AttributeType::String, "Passphrase of the private key")),
                ),
                (
                    "num_threads",
                    required(AttributeType::Number, "Number of threads"),
                ),
            ],
        )
    }
}

impl WithNormalize for SnowflakeCredentialState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.is_active.is_null() {
            self.is_active = Value::Value(true);
        }
    }
}

pub(crate) fn refresh_snowflake(
    state: &mut SnowflakeCredentialState<'_>,
    remote: &SnowflakeCredential,
) {
    // Secrets are never returned by the API and keep their planned value
    sync_number(&mut state.credential_id, remote.id);
    state.project_id = Value::Value(remote.project_id);
    state.is_active = Value::Value(is_active(remote.state));
    state.auth_type = string(remote.auth_type.as_str());
    sync_string(&mut state.database, remote.database.as_deref());
    sync_string(&mut state.role, remote.role.as_deref());
    sync_string(&mut state.warehouse, remote.warehouse.as_deref());
    state.schema = string(remote.schema.as_str());
    state.user = string(remote.user.as_str());
    state.num_threads = Value::Value(remote.threads);
}

pub struct SnowflakeCredentialResource;

#[async_trait]
impl ApiObject for SnowflakeCredentialResource {
    const NAME: &'static str = "snowflake credential";

    type Key = (i64, i64);
    type Remote = SnowflakeCredential;
    type State<'a> = SnowflakeCredentialState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.credential_id as &mut dyn Computed]
    }

    fn validate(diags: &mut Diagnostics, config: &SnowflakeCredentialState<'_>) {
        check_one_of(
            diags,
            AttributePath::new("auth_type"),
            &config.auth_type,
            AUTH_TYPES,
        );
        match config.auth_type.as_deref_option() {
            Some("password") if config.password.is_null() => {
                diags.error_short(
                    "`password` is required for `password` authentication",
                    AttributePath::new("password"),
                );
            }
            Some("keypair") if config.private_key.is_null() => {
                diags.error_short(
                    "`private_key` is required for `keypair` authentication",
                    AttributePath::new("private_key"),
                );
            }
            _ => (),
        }
        warn_inactive(diags, &config.is_active);
    }

    fn replace_on(changes: &Changes<'_, SnowflakeCredentialState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        paths
    }

    fn key(remote: &SnowflakeCredential) -> Option<(i64, i64)> {
        Some((remote.project_id, remote.id?))
    }

    fn draft(planned: &SnowflakeCredentialState<'_>) -> SnowflakeCredential {
        SnowflakeCredential {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            state: lifecycle_state(&planned.is_active),
            threads: read_number(&planned.num_threads).unwrap_or(1),
            auth_type: read_string(&planned.auth_type),
            schema: read_string(&planned.schema),
            user: read_string(&planned.user),
            database: read_opt_string(&planned.database),
            role: read_opt_string(&planned.role),
            warehouse: read_opt_string(&planned.warehouse),
            password: read_opt_string(&planned.password),
            private_key: read_opt_string(&planned.private_key),
            private_key_passphrase: read_opt_string(&planned.private_key_passphrase),
            ..Default::default()
        }
    }

    fn merge(remote: &mut SnowflakeCredential, changes: &Changes<'_, SnowflakeCredentialState<'_>>) {
        changes.overlay(&mut remote.state, |s| &s.is_active, lifecycle_state);
        changes.overlay(&mut remote.auth_type, |s| &s.auth_type, read_string);
        changes.overlay(&mut remote.database, |s| &s.database, read_opt_string);
        changes.overlay(&mut remote.role, |s| &s.role, read_opt_string);
        changes.overlay(&mut remote.warehouse, |s| &s.warehouse, read_opt_string);
        changes.overlay(&mut remote.schema, |s| &s.schema, read_string);
        changes.overlay(&mut remote.user, |s| &s.user, read_string);
        changes.overlay(&mut remote.password, |s| &s.password, read_opt_string);
        changes.overlay(&mut remote.private_key, |s| &s.private_key, read_opt_string);
        changes.overlay(
            &mut remote.private_key_passphrase,
            |s| &s.private_key_passphrase,
            read_opt_string,
        );
        changes.overlay(&mut remote.threads, |s| &s.num_threads, |v| {
            read_number(v).unwrap_or(1)
        });
    }

    fn refresh(state: &mut SnowflakeCredentialState<'_>, remote: &SnowflakeCredential) {
        refresh_snowflake(state, remote);
    }

    async fn fetch(
        client: &DbtCloudClient,
        key: &(i64, i64),
    ) -> Result<SnowflakeCredential, ApiError> {
        client.get_snowflake_credential(key.0, key.1).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &SnowflakeCredential,
    ) -> Result<SnowflakeCredential, ApiError> {
        client.create_credential(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &SnowflakeCredential,
    ) -> Result<SnowflakeCredential, ApiError> {
        client.update_credential(key.0, key.1, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        client
            .delete_credential::<SnowflakeCredential>(key.0, key.1)
            .await
            .map(drop)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresCredentialState<'a> {
    pub id: ValueString<'a>,
    pub credential_id: ValueNumber,
    pub project_id: ValueNumber,
    pub is_active: Value<bool>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub default_schema: ValueString<'a>,
    pub target_name: ValueString<'a>,
    pub username: ValueString<'a>,
    pub password: ValueString<'a>,
    pub num_threads: ValueNumber,
}

impl WithSchema for PostgresCredentialState<'_> {
    fn schema() -> Schema {
        block(
            "Postgres or Redshift credential of a dbt Cloud project",
            [
                ("id", id("`<project_id>:<credential_id>`")),
                (
                    "credential_id",
                    computed(AttributeType::Number, "Credential id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "is_active",
                    optional_computed(AttributeType::Bool, "Whether the credential is active"),
                ),
                (
                    "type",
                    required(AttributeType::String, "`postgres` or `redshift`"),
                ),
                (
                    "default_schema",
                    required(AttributeType::String, "Default schema"),
                ),
                (
                    "target_name",
                    optional_computed(AttributeType::String, "Target name, `default` by default"),
                ),
                ("username", required(AttributeType::String, "Username")),
                (
                    "password",
                    sensitive(optional(AttributeType::String, "Password")),
                ),
                (
                    "num_threads",
                    required(AttributeType::Number, "Number of threads"),
                ),
            ],
        )
    }
}

impl WithNormalize for PostgresCredentialState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.is_active.is_null() {
            self.is_active = Value::Value(true);
        }
        if self.target_name.is_null() {
            self.target_name = string("default");
        }
    }
}

pub struct PostgresCredentialResource;

#[async_trait]
impl ApiObject for PostgresCredentialResource {
    const NAME: &'static str = "postgres credential";

    type Key = (i64, i64);
    type Remote = PostgresCredential;
    type State<'a> = PostgresCredentialState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.credential_id as &mut dyn Computed]
    }

    fn validate(diags: &mut Diagnostics, config: &PostgresCredentialState<'_>) {
        check_one_of(diags, AttributePath::new("type"), &config.kind, POSTGRES_TYPES);
        warn_inactive(diags, &config.is_active);
    }

    fn replace_on(changes: &Changes<'_, PostgresCredentialState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        paths
    }

    fn key(remote: &PostgresCredential) -> Option<(i64, i64)> {
        Some((remote.project_id, remote.id?))
    }

    fn draft(planned: &PostgresCredentialState<'_>) -> PostgresCredential {
        PostgresCredential {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            kind: read_string(&planned.kind),
            state: lifecycle_state(&planned.is_active),
            threads: read_number(&planned.num_threads).unwrap_or(1),
            target_name: read_opt_string(&planned.target_name)
                .unwrap_or_else(|| "default".to_owned()),
            username: read_string(&planned.username),
            default_schema: read_string(&planned.default_schema),
            password: read_opt_string(&planned.password),
            ..Default::default()
        }
    }

    fn merge(remote: &mut PostgresCredential, changes: &Changes<'_, PostgresCredentialState<'_>>) {
        changes.overlay(&mut remote.kind, |s| &s.kind, read_string);
        changes.overlay(&mut remote.state, |s| &s.is_active, lifecycle_state);
        changes.overlay(&mut remote.threads, |s| &s.num_threads, |v| {
            read_number(v).unwrap_or(1)
        });
        changes.overlay(&mut remote.target_name, |s| &s.target_name, |v| {
            read_opt_string(v).unwrap_or_else(|| "default".to_owned())
        });
        changes.overlay(&mut remote.username, |s| &s.username, read_string);
        changes.overlay(&mut remote.default_schema, |s| &s.default_schema, read_string);
        changes.overlay(&mut remote.password, |s| &s.password, read_opt_string);
    }

    fn refresh(state: &mut PostgresCredentialState<'_>, remote: &PostgresCredential) {
        sync_number(&mut state.credential_id, remote.id);
        state.project_id = Value::Value(remote.project_id);
        state.is_active = Value::Value(is_active(remote.state));
        state.kind = string(remote.kind.as_str());
        state.default_schema = string(remote.default_schema.as_str());
        state.target_name = string(remote.target_name.as_str());
        state.username = string(remote.username.as_str());
        state.num_threads = Value::Value(remote.threads);
    }

    async fn fetch(
        client: &DbtCloudClient,
        key: &(i64, i64),
    ) -> Result<PostgresCredential, ApiError> {
        client.get_postgres_credential(key.0, key.1).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &PostgresCredential,
    ) -> Result<PostgresCredential, ApiError> {
        client.create_credential(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &PostgresCredential,
    ) -> Result<PostgresCredential, ApiError> {
        client.update_credential(key.0, key.1, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        client
            .delete_credential::<PostgresCredential>(key.0, key.1)
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::STATE_ACTIVE;

    use super::*;

    fn snowflake() -> SnowflakeCredentialState<'static> {
        let mut state = SnowflakeCredentialState {
            id: string("3:40"),
            credential_id: Value::Value(40),
            project_id: Value::Value(3),
            auth_type: string("password"),
            schema: string("analytics"),
            user: string("dbt"),
            password: string("hunter2"),
            num_threads: Value::Value(4),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        state
    }

    #[test]
    fn password_is_kept_across_refresh() {
        let mut state = snowflake();
        let remote = SnowflakeCredential {
            id: Some(40),
            password: None,
            ..SnowflakeCredentialResource::draft(&state)
        };
        refresh_snowflake(&mut state, &remote);
        assert_eq!(state.password, string("hunter2"));
        assert_eq!(state, snowflake());
    }

    #[test]
    fn auth_type_requires_its_secret() {
        let mut diags = Diagnostics::default();
        SnowflakeCredentialResource::validate(&mut diags, &snowflake());
        assert!(diags.errors.is_empty());

        let config = SnowflakeCredentialState {
            auth_type: string("keypair"),
            ..snowflake()
        };
        SnowflakeCredentialResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn merge_overlays_threads_only() {
        let prior = snowflake();
        let planned = SnowflakeCredentialState {
            num_threads: Value::Value(8),
            ..snowflake()
        };
        let mut fetched = SnowflakeCredential {
            id: Some(40),
            password: None,
            warehouse: Some("TRANSFORMING".to_owned()),
            ..SnowflakeCredentialResource::draft(&prior)
        };
        SnowflakeCredentialResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.threads, 8);
        assert_eq!(fetched.warehouse.as_deref(), Some("TRANSFORMING"));
        assert_eq!(fetched.password, None);
        assert_eq!(fetched.state, STATE_ACTIVE);
    }

    #[test]
    fn postgres_type_is_checked() {
        let mut diags = Diagnostics::default();
        let config = PostgresCredentialState {
            kind: string("mysql"),
            ..Default::default()
        };
        PostgresCredentialResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 1);
    }
}
