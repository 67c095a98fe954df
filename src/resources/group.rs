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
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::Diagnostics;

use crate::api::{ApiError, DbtCloudClient, Group, STATE_ACTIVE};
use crate::managed::convert::{read_bool, read_string, read_strings, string, sync_strings};
use crate::managed::schema::{block, id, list_of, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{WithNormalize, WithSchema};

use super::{permission_list, permission_type, read_permissions, validate_permissions, PermissionState};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState<'a> {
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub assign_by_default: Value<bool>,
    pub sso_mapping_groups: ValueList<ValueString<'a>>,
    pub group_permissions: ValueList<Value<PermissionState<'a>>>,
}

impl WithSchema for GroupState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud group of users",
            [
                ("id", id("Group id")),
                ("name", required(AttributeType::String, "Group name")),
                (
                    "assign_by_default",
                    optional_computed(
                        AttributeType::Bool,
                        "Whether new users are added to the group",
                    ),
                ),
                (
                    "sso_mapping_groups",
                    optional(
                        list_of(AttributeType::String),
                        "SSO groups mapped to this group",
                    ),
                ),
                (
                    "group_permissions",
                    optional(list_of(permission_type()), "Permissions of the group"),
                ),
            ],
        )
    }
}

impl WithNormalize for GroupState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.assign_by_default.is_null() {
            self.assign_by_default = Value::Value(false);
        }
    }
}

pub(crate) fn refresh_group(state: &mut GroupState<'_>, remote: &Group) {
    state.name = string(remote.name.as_str());
    state.assign_by_default = Value::Value(remote.assign_by_default);
    sync_strings(&mut state.sso_mapping_groups, &remote.sso_mapping_groups);
    if !(remote.group_permissions.is_empty() && state.group_permissions.is_null()) {
        state.group_permissions = permission_list(&remote.group_permissions);
    }
}

pub struct GroupResource;

#[async_trait]
impl ApiObject for GroupResource {
    const NAME: &'static str = "group";

    type Key = i64;
    type Remote = Group;
    type State<'a> = GroupState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(_state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        Vec::new()
    }

    fn validate(diags: &mut Diagnostics, config: &GroupState<'_>) {
        validate_permissions(diags, "group_permissions", &config.group_permissions);
    }

    fn key(remote: &Group) -> Option<i64> {
        remote.id
    }

    fn draft(planned: &GroupState<'_>) -> Group {
        Group {
            name: read_string(&planned.name),
            assign_by_default: read_bool(&planned.assign_by_default).unwrap_or_default(),
            sso_mapping_groups: read_strings(&planned.sso_mapping_groups),
            group_permissions: read_permissions(&planned.group_permissions),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    fn merge(remote: &mut Group, changes: &Changes<'_, GroupState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.assign_by_default, |s| &s.assign_by_default, |v| {
            read_bool(v).unwrap_or_default()
        });
        changes.overlay(
            &mut remote.sso_mapping_groups,
            |s| &s.sso_mapping_groups,
            read_strings,
        );
        changes.overlay(
            &mut remote.group_permissions,
            |s| &s.group_permissions,
            read_permissions,
        );
    }

    fn refresh(state: &mut GroupState<'_>, remote: &Group) {
        refresh_group(state, remote);
    }

    async fn fetch(client: &DbtCloudClient, key: &i64) -> Result<Group, ApiError> {
        client.get_group(*key).await
    }

    async fn create(client: &DbtCloudClient, draft: &Group) -> Result<Group, ApiError> {
        client.create_group(draft).await
    }

    async fn replace(client: &DbtCloudClient, key: &i64, merged: &Group) -> Result<Group, ApiError> {
        client.update_group(*key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &i64) -> Result<(), ApiError> {
        client.delete_group(*key).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::Permission;
    use crate::managed::convert::string_list;

    use super::*;

    fn state() -> GroupState<'static> {
        GroupState {
            id: string("4"),
            name: string("analysts"),
            assign_by_default: Value::Value(false),
            sso_mapping_groups: string_list(&["okta-analysts".to_owned()]),
            group_permissions: permission_list(&[Permission {
                permission_set: "analyst".to_owned(),
                project_id: None,
                all_projects: true,
            }]),
        }
    }

    #[test]
    fn merge_replaces_changed_permissions() {
        let prior = state();
        let planned = GroupState {
            group_permissions: permission_list(&[Permission {
                permission_set: "developer".to_owned(),
                project_id: Some(3),
                all_projects: false,
            }]),
            ..state()
        };
        let mut fetched = Group {
            id: Some(4),
            name: "analysts (renamed)".to_owned(),
            ..GroupResource::draft(&prior)
        };

        GroupResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.name, "analysts (renamed)");
        assert_eq!(fetched.group_permissions.len(), 1);
        assert_eq!(fetched.group_permissions[0].permission_set, "developer");
        assert_eq!(fetched.sso_mapping_groups, vec!["okta-analysts".to_owned()]);
    }

    #[test]
    fn refresh_keeps_null_lists() {
        let mut state = GroupState {
            sso_mapping_groups: Value::Null,
            group_permissions: Value::Null,
            ..state()
        };
        let remote = Group {
            id: Some(4),
            name: "analysts".to_owned(),
            ..Default::default()
        };
        refresh_group(&mut state, &remote);
        assert!(state.sso_mapping_groups.is_null());
        assert!(state.group_permissions.is_null());
    }
}
