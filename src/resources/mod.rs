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

//! Terraform resources of the dbt Cloud provider

use serde::{Deserialize, Serialize};
use tf_provider::schema::AttributeType;
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{Permission, STATE_ACTIVE, STATE_DELETED};
use crate::managed::convert::{read_bool, read_number, read_string, string};
use crate::managed::schema::object_of;

mod connection;
mod credentials;
mod environment;
mod environment_variable;
mod group;
mod job;
mod notification;
mod project;
mod repository;
mod service_token;
mod webhook;

pub use connection::{ConnectionResource, ConnectionState};
pub(crate) use credentials::refresh_snowflake;
pub(crate) use group::refresh_group;
pub(crate) use job::refresh_job;
pub use credentials::{
    PostgresCredentialResource, PostgresCredentialState, SnowflakeCredentialResource,
    SnowflakeCredentialState,
};
pub use environment::{EnvironmentResource, EnvironmentState};
pub use environment_variable::{
    EnvironmentVariableResource, EnvironmentVariableState, JobOverrideResource, JobOverrideState,
};
pub use group::{GroupResource, GroupState};
pub use job::{JobResource, JobState};
pub use notification::{NotificationResource, NotificationState};
pub use project::{
    ProjectConnectionResource, ProjectConnectionState, ProjectRepositoryResource,
    ProjectRepositoryState, ProjectResource, ProjectState,
};
pub use repository::{RepositoryResource, RepositoryState};
pub use service_token::{ServiceTokenResource, ServiceTokenState};
pub use webhook::{WebhookResource, WebhookState};

/// `is_active` of objects deleted by flag
pub(crate) fn is_active(state: i64) -> bool {
    state == STATE_ACTIVE
}

pub(crate) fn lifecycle_state(is_active: &Value<bool>) -> i64 {
    match read_bool(is_active) {
        Some(false) => STATE_DELETED,
        _ => STATE_ACTIVE,
    }
}

/// Deactivating an object deletes it in dbt Cloud
pub(crate) fn warn_inactive(diags: &mut Diagnostics, is_active: &Value<bool>) {
    if read_bool(is_active) == Some(false) {
        diags.warning(
            "Inactive object",
            "dbt Cloud deletes inactive objects, the resource will be removed from the state on the next refresh",
            AttributePath::new("is_active"),
        );
    }
}

/// Permission granted to a group or a service token
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionState<'a> {
    pub permission_set: ValueString<'a>,
    pub project_id: ValueNumber,
    pub all_projects: Value<bool>,
}

pub(crate) fn permission_type() -> AttributeType {
    object_of([
        ("permission_set", AttributeType::String),
        ("project_id", AttributeType::Number),
        ("all_projects", AttributeType::Bool),
    ])
}

pub(crate) fn read_permissions(
    permissions: &ValueList<Value<PermissionState<'_>>>,
) -> Vec<Permission> {
    permissions
        .iter()
        .flatten()
        .filter_map(|permission| permission.as_ref_option())
        .map(|permission| Permission {
            permission_set: read_string(&permission.permission_set),
            project_id: read_number(&permission.project_id),
            all_projects: read_bool(&permission.all_projects).unwrap_or_default(),
        })
        .collect()
}

pub(crate) fn permission_list<'a>(permissions: &[Permission]) -> ValueList<Value<PermissionState<'a>>> {
    Value::Value(
        permissions
            .iter()
            .map(|permission| {
                Value::Value(PermissionState {
                    permission_set: string(permission.permission_set.as_str()),
                    project_id: permission.project_id.map_or(Value::Null, Value::Value),
                    all_projects: Value::Value(permission.all_projects),
                })
            })
            .collect(),
    )
}

/// A permission applies either to all projects or to one project
pub(crate) fn validate_permissions(
    diags: &mut Diagnostics,
    attr_name: &str,
    permissions: &ValueList<Value<PermissionState<'_>>>,
) {
    for (i, permission) in permissions.iter().flatten().enumerate() {
        let Some(permission) = permission.as_ref_option() else {
            continue;
        };
        let all_projects = read_bool(&permission.all_projects).unwrap_or_default();
        if all_projects && read_number(&permission.project_id).is_some() {
            diags.error(
                "Conflicting permission scope",
                "`project_id` must not be set when `all_projects` is true",
                AttributePath::new(attr_name.to_string()).index(i as i64).attribute("project_id"),
            );
        }
        if !all_projects && permission.project_id.is_null() && !permission.all_projects.is_unknown()
        {
            diags.error(
                "Missing permission scope",
                "`project_id` is required unless `all_projects` is true",
                AttributePath::new(attr_name.to_string()).index(i as i64).attribute("project_id"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_active_maps_to_lifecycle_state() {
        assert_eq!(lifecycle_state(&Value::Value(true)), STATE_ACTIVE);
        assert_eq!(lifecycle_state(&Value::Unknown), STATE_ACTIVE);
        assert_eq!(lifecycle_state(&Value::Value(false)), STATE_DELETED);
        assert!(is_active(STATE_ACTIVE));
        assert!(!is_active(STATE_DELETED));

        let mut diags = Diagnostics::default();
        warn_inactive(&mut diags, &Value::Value(false));
        assert!(diags.errors.is_empty());
        assert_eq!(diags.warnings.len(), 1);
    }

    #[test]
    fn permissions_round_trip_through_state() {
        let permissions = vec![
            Permission {
                permission_set: "developer".to_owned(),
                project_id: Some(3),
                all_projects: false,
            },
            Permission {
                permission_set: "account_viewer".to_owned(),
                project_id: None,
                all_projects: true,
            },
        ];
        assert_eq!(read_permissions(&permission_list(&permissions)), permissions);
    }

    #[test]
    fn permission_scope_is_checked() {
        let mut diags = Diagnostics::default();
        let permissions = permission_list(&[
            Permission {
                permission_set: "developer".to_owned(),
                project_id: Some(3),
                all_projects: true,
            },
            Permission {
                permission_set: "developer".to_owned(),
                project_id: None,
                all_projects: false,
            },
        ]);
        validate_permissions(&mut diags, "group_permissions", &permissions);
        assert_eq!(diags.errors.len(), 2);
    }
}
