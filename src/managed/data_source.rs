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

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, DataSource, Diagnostics};

use crate::utils::WithSchema;

use super::{ApiLookup, ClientSlot};

pub struct ManagedDataSource<L: ApiLookup> {
    client: ClientSlot,
    kind: PhantomData<fn() -> L>,
}

impl<L: ApiLookup> ManagedDataSource<L> {
    pub fn new(client: ClientSlot) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }
}

impl<L: ApiLookup> Debug for ManagedDataSource<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedDataSource")
            .field("kind", &L::NAME)
            .field("client", &self.client)
            .finish()
    }
}

#[async_trait]
impl<L: ApiLookup> DataSource for ManagedDataSource<L> {
    type State<'a> = Value<L::State<'a>>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<L::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            L::validate(diags, config);
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
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let Value::Value(config) = config else {
            diags.root_error("Invalid configuration", "The data source has no configuration");
            return None;
        };
        let client = self.client.get(diags)?;

        match L::lookup(client, config).await {
            Ok(state) => Some(Value::Value(state)),
            Err(err) => {
                diags.root_error(format!("Failed to read {}", L::NAME), err.to_string());
                None
            }
        }
    }
}
