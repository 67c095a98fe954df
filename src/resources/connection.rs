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

use crate::api::{ApiError, Connection, ConnectionDetails, DbtCloudClient};
use crate::managed::convert::{
    read_bool, read_number, read_opt_string, read_string, string, sync_bool, sync_number,
    sync_string,
};
use crate::managed::schema::{block, computed, id, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

use super::{is_active, lifecycle_state, warn_inactive};

const CONNECTION_TYPES: &[&str] = &["snowflake", "postgres", "redshift"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState<'a> {
    pub id: ValueString<'a>,
    pub connection_id: ValueNumber,
    pub project_id: ValueNumber,
    pub name: ValueString<'a>,
    #[serde(rename = "type")]
    pub kind: ValueString<'a>,
    pub is_active: Value<bool>,
    pub account: ValueString<'a>,
    pub database: ValueString<'a>,
    pub warehouse: ValueString<'a>,
    pub role: ValueString<'a>,
    pub allow_sso: Value<bool>,
    pub host_name: ValueString<'a>,
    pub port: ValueNumber,
}

impl WithSchema for ConnectionState<'_> {
    fn schema() -> Schema {
        block(
            "Warehouse connection of a dbt Cloud project",
            [
                ("id", id("`<project_id>:<connection_id>`")),
                (
                    "connection_id",
                    computed(AttributeType::Number, "Connection id"),
                ),
                ("project_id", required(AttributeType::Number, "Project id")),
                ("name", required(AttributeType::String, "Connection name")),
                (
                    "type",
                    required(
                        AttributeType::String,
                        "`snowflake`, `postgres` or `redshift`",
                    ),
                ),
                (
                    "is_active",
                    optional_computed(AttributeType::Bool, "Whether the connection is active"),
                ),
                (
                    "account",
                    optional(AttributeType::String, "Snowflake account"),
                ),
                ("database", optional(AttributeType::String, "Database name")),
                (
                    "warehouse",
                    optional(AttributeType::String, "Snowflake warehouse"),
                ),
                ("role", optional(AttributeType::String, "Snowflake role")),
                (
                    "allow_sso",
                    optional(AttributeType::Bool, "Allow Snowflake OAuth"),
                ),
                (
                    "host_name",
                    optional(AttributeType::String, "Host of a postgres or redshift server"),
                ),
                (
                    "port",
                    optional(AttributeType::Number, "Port of a postgres or redshift server"),
                ),
            ],
        )
    }
}

impl WithNormalize for ConnectionState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.is_active.is_null() {
            self.is_active = Value::Value(true);
        }
    }
}

/// Attributes required by each connection type
fn required_fields(config: &ConnectionState<'_>) -> Vec<(&'static str, bool)> {
    match config.kind.as_deref_option() {
        Some("snowflake") => vec![
            ("account", config.account.is_null()),
            ("database", config.database.is_null()),
            ("warehouse", config.warehouse.is_null()),
        ],
        Some("postgres" | "redshift") => vec![
            ("host_name", config.host_name.is_null()),
            ("port", config.port.is_null()),
            ("database", config.database.is_null()),
        ],
        _ => Vec::new(),
    }
}

fn is_snowflake(kind: &str) -> bool {
    kind == "snowflake"
}

fn details_of(planned: &ConnectionState<'_>) -> ConnectionDetails {
    let database = read_opt_string(&planned.database);
    if is_snowflake(planned.kind.as_deref_option().unwrap_or_default()) {
        ConnectionDetails {
            account: read_opt_string(&planned.account),
            database,
            warehouse: read_opt_string(&planned.warehouse),
            role: read_opt_string(&planned.role),
            allow_sso: read_bool(&planned.allow_sso),
            ..Default::default()
        }
    } else {
        ConnectionDetails {
            hostname: read_opt_string(&planned.host_name),
            port: read_number(&planned.port),
            dbname: database,
            ..Default::default()
        }
    }
}

pub struct ConnectionResource;

#[async_trait]
impl ApiObject for ConnectionResource {
    const NAME: &'static str = "connection";

    type Key = (i64, i64);
    type Remote = Connection;
    type State<'a> = ConnectionState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.connection_id as &mut dyn Computed]
    }

    fn validate(diags: &mut Diagnostics, config: &ConnectionState<'_>) {
        check_one_of(diags, AttributePath::new("type"), &config.kind, CONNECTION_TYPES);
        for (name, missing) in required_fields(config) {
            if missing {
                diags.error(
                    "Missing connection attribute",
                    format!(
                        "`{name}` is required for `{}` connections",
                        config.kind.as_deref_option().unwrap_or_default()
                    ),
                    AttributePath::new(name),
                );
            }
        }
        warn_inactive(diags, &config.is_active);
    }

    fn replace_on(changes: &Changes<'_, ConnectionState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        changes.replace_if(&mut paths, "type", |s| &s.kind);
        paths
    }

    fn key(remote: &Connection) -> Option<(i64, i64)> {
        Some((remote.project_id, remote.id?))
    }

    fn draft(planned: &ConnectionState<'_>) -> Connection {
        Connection {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            name: read_string(&planned.name),
            kind: read_string(&planned.kind),
            state: lifecycle_state(&planned.is_active),
            details: details_of(planned),
            ..Default::default()
        }
    }

    fn merge(remote: &mut Connection, changes: &Changes<'_, ConnectionState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.state, |s| &s.is_active, lifecycle_state);

        let details = &mut remote.details;
        changes.overlay(&mut details.account, |s| &s.account, read_opt_string);
        changes.overlay(&mut details.warehouse, |s| &s.warehouse, read_opt_string);
        changes.overlay(&mut details.role, |s| &s.role, read_opt_string);
        changes.overlay(&mut details.allow_sso, |s| &s.allow_sso, read_bool);
        changes.overlay(&mut details.hostname, |s| &s.host_name, read_opt_string);
        changes.overlay(&mut details.port, |s| &s.port, read_number);
        if is_snowflake(&remote.kind) {
            changes.overlay(&mut details.database, |s| &s.database, read_opt_string);
        } else {
            changes.overlay(&mut details.dbname, |s| &s.database, read_opt_string);
        }
    }

    fn refresh(state: &mut ConnectionState<'_>, remote: &Connection) {
        sync_number(&mut state.connection_id, remote.id);
        state.project_id = Value::Value(remote.project_id);
        state.name = string(remote.name.as_str());
        state.kind = string(remote.kind.as_str());
        state.is_active = Value::Value(is_active(remote.state));

        let details = &remote.details;
        sync_string(&mut state.account, details.account.as_deref());
        sync_string(&mut state.warehouse, details.warehouse.as_deref());
        sync_string(&mut state.role, details.role.as_deref());
        if details.allow_sso.is_some() || !state.allow_sso.is_null() {
            sync_bool(&mut state.allow_sso, details.allow_sso);
        }
        sync_string(&mut state.host_name, details.hostname.as_deref());
        sync_number(&mut state.port, details.port);
        let database = if is_snowflake(&remote.kind) {
            details.database.as_deref()
        } else {
            details.dbname.as_deref()
        };
        sync_string(&mut state.database, database);
    }

    async fn fetch(client: &DbtCloudClient, key: &(i64, i64)) -> Result<Connection, ApiError> {
        client.get_connection(key.0, key.1).await
    }

    async fn create(client: &DbtCloudClient, draft: &Connection) -> Result<Connection, ApiError> {
        client.create_connection(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &(i64, i64),
        merged: &Connection,
    ) -> Result<Connection, ApiError> {
        client.update_connection(key.0, key.1, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &(i64, i64)) -> Result<(), ApiError> {
        client.delete_connection(key.0, key.1).await.map(drop)
    }
}
