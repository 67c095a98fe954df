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

use tf_provider::AttributePath;

/// Prior and planned states of a resource being updated.
///
/// An attribute has changed when its planned value differs from its prior
/// value. Only changed attributes are copied onto the remote object, the
/// others keep the value that was just fetched from the API.
#[derive(Debug, Clone, Copy)]
pub struct Changes<'s, S> {
    prior: &'s S,
    planned: &'s S,
}

impl<'s, S> Changes<'s, S> {
    pub fn new(prior: &'s S, planned: &'s S) -> Self {
        Self { prior, planned }
    }

    pub fn prior(&self) -> &'s S {
        self.prior
    }

    pub fn planned(&self) -> &'s S {
        self.planned
    }

    pub fn has_change<V, F>(&self, field: F) -> bool
    where
        V: PartialEq + ?Sized,
        F: Fn(&S) -> &V,
    {
        field(self.prior) != field(self.planned)
    }

    /// Set `target` from the planned value of `field` if it has changed
    pub fn overlay<T, V, F, C>(&self, target: &mut T, field: F, convert: C)
    where
        V: PartialEq + ?Sized,
        F: Fn(&S) -> &V,
        C: FnOnce(&V) -> T,
    {
        if self.has_change(&field) {
            *target = convert(field(self.planned));
        }
    }

    /// Record `name` as requiring a replacement if `field` has changed
    pub fn replace_if<V, F>(&self, paths: &mut Vec<AttributePath>, name: &str, field: F)
    where
        V: PartialEq + ?Sized,
        F: Fn(&S) -> &V,
    {
        if self.has_change(field) {
            paths.push(AttributePath::new(name.to_string()));
        }
    }
}
