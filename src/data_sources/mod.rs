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

//! Terraform data sources of the dbt Cloud provider.
//!
//! Data sources read an existing object from its ids. Unlike resources, a
//! missing object is an error.

mod environment;
mod group;
mod job;
mod project;
mod snowflake_credential;

pub use environment::{EnvironmentData, EnvironmentLookup};
pub use group::{GroupData, GroupLookup};
pub use job::{JobData, JobLookup};
pub use project::{ProjectData, ProjectLookup};
pub use snowflake_credential::{SnowflakeCredentialData, SnowflakeCredentialLookup};

use tf_provider::value::ValueNumber;
use tf_provider::{AttributePath, Diagnostics};

/// Lookup ids must be known when the data source is read
pub(crate) fn require_known(diags: &mut Diagnostics, name: &str, value: &ValueNumber) {
    if value.is_null() {
        diags.error_short(format!("`{name}` is required"), AttributePath::new(name.to_string()));
    }
}
