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

use super::{default_state, ApiError, ApiVersion, DbtCloudClient, Extra, Permission};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceToken {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub name: String,
    #[serde(default)]
    pub uid: String,
    /// Only returned by the creation call
    #[serde(default, skip_serializing)]
    pub token_string: Option<String>,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(default, skip_serializing)]
    pub permissions: Vec<Permission>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Serialize)]
struct ServiceTokenPermissionBody<'a> {
    account_id: i64,
    service_token_id: i64,
    #[serde(flatten)]
    permission: &'a Permission,
}

impl DbtCloudClient {
    fn service_token_url(&self, token_id: i64) -> String {
        self.url(ApiVersion::V3, &format!("service-tokens/{token_id}/"))
    }

    fn service_token_permissions_url(&self, token_id: i64) -> String {
        self.url(
            ApiVersion::V3,
            &format!("service-tokens/{token_id}/permissions/"),
        )
    }

    /// Fetch a token and its permissions
    pub async fn get_service_token(&self, token_id: i64) -> Result<ServiceToken, ApiError> {
        let token_url = self.service_token_url(token_id);
        let permissions_url = self.service_token_permissions_url(token_id);
        let (mut token, permissions): (ServiceToken, Vec<Permission>) =
            futures::try_join!(self.get(&token_url), self.get(&permissions_url))?;
        token.permissions = permissions;
        Ok(token)
    }

    pub async fn create_service_token(
        &self,
        token: &ServiceToken,
    ) -> Result<ServiceToken, ApiError> {
        let body = ServiceToken {
            id: None,
            account_id: self.account_id(),
            ..token.clone()
        };
        let mut created: ServiceToken = self
            .post(&self.url(ApiVersion::V3, "service-tokens/"), &body)
            .await?;
        let token_id = created
            .id
            .ok_or(ApiError::MissingIdentifier {
                kind: "service token",
            })?;
        if !token.permissions.is_empty() {
            created.permissions = self
                .update_service_token_permissions(token_id, &token.permissions)
                .await?;
        }
        Ok(created)
    }

    pub async fn update_service_token(
        &self,
        token_id: i64,
        token: &ServiceToken,
    ) -> Result<ServiceToken, ApiError> {
        let mut updated: ServiceToken = self.post(&self.service_token_url(token_id), token).await?;
        updated.permissions = self
            .update_service_token_permissions(token_id, &token.permissions)
            .await?;
        Ok(updated)
    }

    pub async fn update_service_token_permissions(
        &self,
        token_id: i64,
        permissions: &[Permission],
    ) -> Result<Vec<Permission>, ApiError> {
        let body: Vec<_> = permissions
            .iter()
            .map(|permission| ServiceTokenPermissionBody {
                account_id: self.account_id(),
                service_token_id: token_id,
                permission,
            })
            .collect();
        self.post(&self.service_token_permissions_url(token_id), &body)
            .await
    }

    pub async fn delete_service_token(&self, token_id: i64) -> Result<(), ApiError> {
        self.delete(&self.service_token_url(token_id), None::<&()>)
            .await
    }
}
