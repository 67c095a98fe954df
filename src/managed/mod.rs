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

//! Generic Terraform resources and data sources backed by the dbt Cloud API.
//!
//! Every dbt Cloud object follows the same lifecycle: its state id is a
//! [`CompositeKey`], reads fetch the object, updates fetch it, overlay the
//! changed attributes and write the whole object back, and deletes either
//! call DELETE or flag the object as deleted. [`ManagedResource`] implements
//! that lifecycle once for every [`ApiObject`].

use std::fmt::Debug;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{ApiError, DbtCloudClient};
use crate::id::CompositeKey;
use crate::utils::{WithNormalize, WithSchema};

pub(crate) mod convert;
mod data_source;
mod diff;
mod resource;
pub(crate) mod schema;

pub use data_source::ManagedDataSource;
pub use diff::Changes;
pub use resource::ManagedResource;
pub(crate) use resource::plan_state;

/// API client shared by the provider and all its resources, set by `configure`
#[derive(Debug, Default, Clone)]
pub struct ClientSlot(Arc<OnceLock<DbtCloudClient>>);

impl ClientSlot {
    pub fn with_client(client: DbtCloudClient) -> Self {
        let slot = Self::default();
        slot.set(client);
        slot
    }

    /// Store the client, returns false if one was already configured
    pub fn set(&self, client: DbtCloudClient) -> bool {
        self.0.set(client).is_ok()
    }

    pub fn get(&self, diags: &mut Diagnostics) -> Option<&DbtCloudClient> {
        let client = self.0.get();
        if client.is_none() {
            diags.root_error(
                "Provider not configured",
                "The dbt Cloud provider must be configured before managing resources.",
            );
        }
        client
    }
}

/// Attribute filled by the API, planned as unknown while it is null
pub trait Computed {
    fn plan_unknown(&mut self);
}

impl<T> Computed for Value<T> {
    fn plan_unknown(&mut self) {
        convert::unknown_if_null(self);
    }
}

/// dbt Cloud object managed as a Terraform resource
#[async_trait]
pub trait ApiObject: Send + Sync + 'static {
    /// Name used in diagnostics and logs
    const NAME: &'static str;

    type Key: CompositeKey + Debug + Send + Sync;
    type Remote: Debug + Send + Sync;
    type State<'a>: WithSchema
        + WithNormalize
        + Serialize
        + Deserialize<'a>
        + Debug
        + Clone
        + Default
        + PartialEq
        + Send
        + Sync;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a>;
    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a>;

    /// Attributes other than the id that the API fills in
    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed>;

    /// Check a configuration, unknown values must be accepted
    fn validate(_diags: &mut Diagnostics, _config: &Self::State<'_>) {}

    /// Attributes whose change forces a replacement
    fn replace_on(_changes: &Changes<'_, Self::State<'_>>) -> Vec<AttributePath> {
        Vec::new()
    }

    /// Key of a remote object, `None` if the API did not return it
    fn key(remote: &Self::Remote) -> Option<Self::Key>;

    /// Remote object to create from a planned state
    fn draft(planned: &Self::State<'_>) -> Self::Remote;

    /// Overlay the changed attributes onto a freshly fetched object
    fn merge(remote: &mut Self::Remote, changes: &Changes<'_, Self::State<'_>>);

    /// Copy the remote attributes into a state
    fn refresh(state: &mut Self::State<'_>, remote: &Self::Remote);

    async fn fetch(client: &DbtCloudClient, key: &Self::Key) -> Result<Self::Remote, ApiError>;
    async fn create(client: &DbtCloudClient, draft: &Self::Remote)
        -> Result<Self::Remote, ApiError>;
    async fn replace(
        client: &DbtCloudClient,
        key: &Self::Key,
        merged: &Self::Remote,
    ) -> Result<Self::Remote, ApiError>;
    async fn delete(client: &DbtCloudClient, key: &Self::Key) -> Result<(), ApiError>;
}

/// dbt Cloud object exposed as a Terraform data source
#[async_trait]
pub trait ApiLookup: Send + Sync + 'static {
    const NAME: &'static str;

    type State<'a>: WithSchema
        + Serialize
        + Deserialize<'a>
        + Debug
        + Clone
        + Default
        + Send
        + Sync;

    fn validate(_diags: &mut Diagnostics, _config: &Self::State<'_>) {}

    /// Fill the computed attributes of `config`
    async fn lookup<'a>(
        client: &DbtCloudClient,
        config: Self::State<'a>,
    ) -> Result<Self::State<'a>, ApiError>;
}
