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

use crate::api::{ApiError, DbtCloudClient, ServiceToken, STATE_ACTIVE};
use crate::managed::convert::{read_string, string};
use crate::managed::schema::{block, computed, id, list_of, optional, required, sensitive};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{WithNormalize, WithSchema};

use super::{permission_list, permission_type, read_permissions, validate_permissions, PermissionState};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTokenState<'a> {
    pub id: ValueString<'a>,
    pub uid: ValueString<'a>,
    pub name: ValueString<'a>,
    pub token_string: ValueString<'a>,
    pub service_token_permissions: ValueList<Value<PermissionState<'a>>>,
}

impl WithSchema for ServiceTokenState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud service token",
            [
                ("id", id("Service token id")),
                ("uid", computed(AttributeType::String, "Public identifier of the token")),
                ("name", required(AttributeType::String, "Service token name")),
                (
                    "token_string",
                    sensitive(computed(
                        AttributeType::String,
                        "Secret value of the token, only known when the token is created",
                    )),
                ),
                (
                    "service_token_permissions",
                    optional(list_of(permission_type()), "Permissions of the token"),
                ),
            ],
        )
    }
}

impl WithNormalize for ServiceTokenState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

pub struct ServiceTokenResource;

#[async_trait]
impl ApiObject for ServiceTokenResource {
    const NAME: &'static str = "service token";

    type Key = i64;
    type Remote = ServiceToken;
    type State<'a> = ServiceTokenState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.uid as &mut dyn Computed, &mut state.token_string]
    }

    fn validate(diags: &mut Diagnostics, config: &ServiceTokenState<'_>) {
        validate_permissions(diags, "service_token_permissions", &config.service_token_permissions);
    }

    fn key(remote: &ServiceToken) -> Option<i64> {
        remote.id
    }

    fn draft(planned: &ServiceTokenState<'_>) -> ServiceToken {
        ServiceToken {
            name: read_string(&planned.name),
            permissions: read_permissions(&planned.service_token_permissions),
            state: STATE_ACTIVE,
            ..Default::default()
        }
    }

    fn merge(remote: &mut ServiceToken, changes: &Changes<'_, ServiceTokenState<'_>>) {
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(
            &mut remote.permissions,
            |s| &s.service_token_permissions,
            read_permissions,
        );
    }

    fn refresh(state: &mut ServiceTokenState<'_>, remote: &ServiceToken) {
        state.uid = string(remote.uid.as_str());
        state.name = string(remote.name.as_str());
        // The secret is only returned once, later reads keep the stored value
        match &remote.token_string {
            Some(token) => state.token_string = string(token.as_str()),
            None if state.token_string.is_unknown() => state.token_string = Value::Null,
            None => (),
        }
        if !(remote.permissions.is_empty() && state.service_token_permissions.is_null()) {
            state.service_token_permissions = permission_list(&remote.permissions);
        }
    }

    async fn fetch(client: &DbtCloudClient, key: &i64) -> Result<ServiceToken, ApiError> {
        client.get_service_token(*key).await
    }

    async fn create(
        client: &DbtCloudClient,
        draft: &ServiceToken,
    ) -> Result<ServiceToken, ApiError> {
        client.create_service_token(draft).await
    }

    async fn replace(
        client: &DbtCloudClient,
        key: &i64,
        merged: &ServiceToken,
    ) -> Result<ServiceToken, ApiError> {
        client.update_service_token(*key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &i64) -> Result<(), ApiError> {
        client.delete_service_token(*key).await
    }
}

#[cfg(test)]
mod tests {
    use crate::managed::plan_state;

    use super::*;

    fn remote(token_string: Option<&str>) -> ServiceToken {
        ServiceToken {
            id: Some(21),
            account_id: 1,
            name: "ci".to_owned(),
            uid: "Yx2".to_owned(),
            token_string: token_string.map(str::to_owned),
            state: STATE_ACTIVE,
            permissions: Vec::new(),
            ..Default::default()
        }
    }

    #[test]
    fn token_string_survives_refresh() {
        let mut state = ServiceTokenState {
            name: string("ci"),
            ..Default::default()
        };
        plan_state::<ServiceTokenResource>(&mut Diagnostics::default(), &mut state);
        assert!(state.token_string.is_unknown());

        ServiceTokenResource::refresh(&mut state, &remote(Some("dbtc_secret")));
        assert_eq!(state.token_string, string("dbtc_secret"));
        assert_eq!(state.uid, string("Yx2"));

        ServiceTokenResource::refresh(&mut state, &remote(None));
        assert_eq!(state.token_string, string("dbtc_secret"));
        assert!(state.service_token_permissions.is_null());
    }

    #[test]
    fn imported_token_has_no_secret() {
        let mut state = ServiceTokenState {
            id: string("21"),
            token_string: Value::Unknown,
            ..Default::default()
        };
        ServiceTokenResource::refresh(&mut state, &remote(None));
        assert!(state.token_string.is_null());
    }
}
