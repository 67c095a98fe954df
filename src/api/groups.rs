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

use super::{default_state, impl_lifecycle, ApiError, ApiVersion, DbtCloudClient, Extra, Permission};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub name: String,
    #[serde(default)]
    pub assign_by_default: bool,
    #[serde(default)]
    pub sso_mapping_groups: Vec<String>,
    #[serde(default)]
    pub group_permissions: Vec<Permission>,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Group);

#[derive(Serialize)]
struct GroupPermissionBody<'a> {
    account_id: i64,
    group_id: i64,
    #[serde(flatten)]
    permission: &'a Permission,
}

impl DbtCloudClient {
    fn group_url(&self, group_id: i64) -> String {
        self.url(ApiVersion::V3, &format!("groups/{group_id}/"))
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Group, ApiError> {
        self.get_live(&self.group_url(group_id)).await
    }

    /// Create a group, then grant its permissions
    pub async fn create_group(&self, group: &Group) -> Result<Group, ApiError> {
        let body = Group {
            id: None,
            account_id: self.account_id(),
            group_permissions: Vec::new(),
            ..group.clone()
        };
        let mut created: Group = self
            .post(&self.url(ApiVersion::V3, "groups/"), &body)
            .await?;
        let group_id = created
            .id
            .ok_or(ApiError::MissingIdentifier { kind: "group" })?;
        if !group.group_permissions.is_empty() {
            created.group_permissions = self
                .update_group_permissions(group_id, &group.group_permissions)
                .await?;
        }
        Ok(created)
    }

    pub async fn update_group(&self, group_id: i64, group: &Group) -> Result<Group, ApiError> {
        let mut updated: Group = self.post(&self.group_url(group_id), group).await?;
        updated.group_permissions = self
            .update_group_permissions(group_id, &group.group_permissions)
            .await?;
        Ok(updated)
    }

    /// Replace the whole set of permissions of a group
    pub async fn update_group_permissions(
        &self,
        group_id: i64,
        permissions: &[Permission],
    ) -> Result<Vec<Permission>, ApiError> {
        let body: Vec<_> = permissions
            .iter()
            .map(|permission| GroupPermissionBody {
                account_id: self.account_id(),
                group_id,
                permission,
            })
            .collect();
        let url = self.url(ApiVersion::V3, &format!("group-permissions/{group_id}/"));
        self.post(&url, &body).await
    }

    pub async fn delete_group(&self, group_id: i64) -> Result<Group, ApiError> {
        self.retire(&self.group_url(group_id)).await
    }
}
