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

use std::borrow::Cow;
use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;

use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::api::ApiError;
use crate::id::CompositeKey;
use crate::utils::{WithNormalize, WithSchema};

use super::{ApiObject, Changes, ClientSlot};

pub struct ManagedResource<K: ApiObject> {
    client: ClientSlot,
    kind: PhantomData<fn() -> K>,
}

impl<K: ApiObject> ManagedResource<K> {
    pub fn new(client: ClientSlot) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }
}

impl<K: ApiObject> Debug for ManagedResource<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedResource")
            .field("kind", &K::NAME)
            .field("client", &self.client)
            .finish()
    }
}

fn decode_key<K: ApiObject>(diags: &mut Diagnostics, id: &ValueString<'_>) -> Option<K::Key> {
    let Some(id) = id.as_deref_option() else {
        diags.error_short("The resource has no identifier", AttributePath::new("id"));
        return None;
    };
    match K::Key::decode(id) {
        Ok(key) => Some(key),
        Err(err) => {
            diags.error(
                format!("Invalid {} identifier", K::NAME),
                err.to_string(),
                AttributePath::new("id"),
            );
            None
        }
    }
}

/// Fill the defaults of a planned state and mark its computed attributes unknown
pub(crate) fn plan_state<K: ApiObject>(diags: &mut Diagnostics, state: &mut K::State<'_>) {
    state.normalize(diags);
    for attribute in K::computed(state) {
        attribute.plan_unknown();
    }
}

fn report<K: ApiObject>(diags: &mut Diagnostics, action: &str, err: ApiError) {
    diags.root_error(format!("Failed to {action} {}", K::NAME), err.to_string());
}

#[async_trait]
impl<K: ApiObject> Resource for ManagedResource<K> {
    type State<'a> = Value<K::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<K::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            K::validate(diags, config);
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match state {
            Value::Value(state) => state,
            state => return Some((state, private_state)),
        };
        let client = self.client.get(diags)?;
        let key = decode_key::<K>(diags, K::id(&state))?;

        match K::fetch(client, &key).await {
            Ok(remote) => {
                K::refresh(&mut state, &remote);
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                // Deleted outside of Terraform: drop it from the state
                tracing::warn!("{} {} not found, removing it from state", K::NAME, key.encode());
                Some((Value::Null, private_state))
            }
            Err(err) => {
                report::<K>(diags, "read", err);
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = match proposed_state {
            Value::Value(state) => state,
            state => return Some((state, Default::default())),
        };
        *K::id_mut(&mut state) = Value::Unknown;
        plan_state::<K>(diags, &mut state);

        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<AttributePath>,
    )> {
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, proposed_state) else {
            diags.root_error(
                "Invalid plan",
                "Cannot plan an update without a prior and a proposed state",
            );
            return None;
        };
        *K::id_mut(&mut state) = K::id(&prior).clone();
        plan_state::<K>(diags, &mut state);

        let trigger_replace = K::replace_on(&Changes::new(&prior, &state));

        Some((Value::Value(state), prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(mut state) = planned_state else {
            diags.root_error(
                "Invalid plan",
                "Cannot create a resource without a planned state",
            );
            return None;
        };
        let client = self.client.get(diags)?;

        let draft = K::draft(&state);
        let remote = match K::create(client, &draft).await {
            Ok(remote) => remote,
            Err(err) => {
                report::<K>(diags, "create", err);
                return None;
            }
        };
        let Some(key) = K::key(&remote) else {
            report::<K>(diags, "create", ApiError::MissingIdentifier { kind: K::NAME });
            return None;
        };

        let id = key.encode();
        tracing::info!("created {} {}", K::NAME, id);
        *K::id_mut(&mut state) = Value::Value(Cow::Owned(id));
        K::refresh(&mut state, &remote);

        Some((Value::Value(state), private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let (Value::Value(prior), Value::Value(mut state)) = (prior_state, planned_state) else {
            diags.root_error(
                "Invalid plan",
                "Cannot update a resource without a prior and a planned state",
            );
            return None;
        };
        let client = self.client.get(diags)?;
        let key = decode_key::<K>(diags, K::id(&prior))?;

        // Objects are written back whole: start from the current remote object
        // so that attributes not managed here are preserved
        let mut remote = match K::fetch(client, &key).await {
            Ok(remote) => remote,
            Err(err) => {
                report::<K>(diags, "read", err);
                return None;
            }
        };
        K::merge(&mut remote, &Changes::new(&prior, &state));

        let remote = match K::replace(client, &key, &remote).await {
            Ok(remote) => remote,
            Err(err) => {
                report::<K>(diags, "update", err);
                return None;
            }
        };
        tracing::info!("updated {} {}", K::NAME, key.encode());
        K::refresh(&mut state, &remote);

        Some((Value::Value(state), private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = state else {
            return Some(());
        };
        let client = self.client.get(diags)?;
        let key = decode_key::<K>(diags, K::id(&state))?;

        match K::delete(client, &key).await {
            Ok(()) => {
                tracing::info!("deleted {} {}", K::NAME, key.encode());
                Some(())
            }
            Err(err) => {
                report::<K>(diags, "delete", err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let id: ValueString<'a> = Value::Value(Cow::Owned(id));
        decode_key::<K>(diags, &id)?;

        // The remaining attributes are filled by the read following the import
        let mut state = <K::State<'a> as Default>::default();
        *K::id_mut(&mut state) = id;
        Some((Value::Value(state), Default::default()))
    }
}
