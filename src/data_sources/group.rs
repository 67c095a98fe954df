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
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};
use tf_provider::Diagnostics;

use crate::api::{ApiError, DbtCloudClient};
use crate::managed::convert::{read_number, string};
use crate::managed::schema::{block, computed, id, list_of, required};
use crate::managed::ApiLookup;
use crate::resources::{GroupState, PermissionState};
use crate::utils::WithSchema;

use super::require_known;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData<'a> {
    pub id: ValueString<'a>,
    pub group_id: ValueNumber,
    pub name: ValueString<'a>,
    pub is_active: Value<bool>,
    pub assign_by_default: Value<bool>,
    pub sso_mapping_groups: ValueList<ValueString<'a>>,
    pub group_permissions: ValueList<Value<PermissionState<'a>>>,
}

impl WithSchema for GroupData<'_> {
    fn schema() -> Schema {
        block(
            "Existing dbt Cloud group",
            [
                ("id", id("Group id")),
                ("group_id", required(AttributeType::Number, "Group id")),
                ("name", computed(AttributeType::String, "Group name")),
                (
                    "is_active",
                    computed(AttributeType::Bool, "Whether the group is active"),
                ),
                (
                    "assign_by_default",
                    computed(AttributeType::Bool, "Whether new users join the group"),
                ),
                (
                    "sso_mapping_groups",
                    computed(list_of(AttributeType::String), "SSO groups mapped to the group"),
                ),
                (
                    "group_permissions",
                    computed(
                        list_of(crate::resources::permission_type()),
                        "Permissions of the group",
                    ),
                ),
            ],
        )
    }
}

pub struct GroupLookup;

#[async_trait]
impl ApiLookup for GroupLookup {
    const NAME: &'static str = "group";

    type State<'a> = GroupData<'a>;

    fn validate(diags: &mut Diagnostics, config: &GroupData<'_>) {
        require_known(diags, "group_id", &config.group_id);
    }

    async fn lookup<'a>(
        client: &DbtCloudClient,
        config: GroupData<'a>,
    ) -> Result<GroupData<'a>, ApiError> {
        let group_id = read_number(&config.group_id).unwrap_or_default();
        let group = client.get_group(group_id).await?;

        // lists are always set on a data source
        let mut state = GroupState {
            sso_mapping_groups: Value::Value(Vec::new()),
            group_permissions: Value::Value(Vec::new()),
            ..Default::default()
        };
        crate::resources::refresh_group(&mut state, &group);
        Ok(GroupData {
            id: string(group_id.to_string()),
            group_id: config.group_id,
            name: state.name,
            // soft-deleted groups are reported as not found
            is_active: Value::Value(true),
            assign_by_default: state.assign_by_default,
            sso_mapping_groups: state.sso_mapping_groups,
            group_permissions: state.group_permissions,
        })
    }
}
