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

//! Builders for resource and data source schemas

use std::collections::HashMap;

use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, Schema};

fn attribute(attr_type: AttributeType, description: &str, constraint: AttributeConstraint) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        sensitive: false,
        deprecated: false,
    }
}

pub(crate) fn required(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Required)
}

pub(crate) fn optional(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Optional)
}

pub(crate) fn computed(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::Computed)
}

/// Optional attribute whose default is chosen by the API
pub(crate) fn optional_computed(attr_type: AttributeType, description: &str) -> Attribute {
    attribute(attr_type, description, AttributeConstraint::OptionalComputed)
}

pub(crate) fn sensitive(attribute: Attribute) -> Attribute {
    Attribute {
        sensitive: true,
        ..attribute
    }
}

pub(crate) fn list_of(attr_type: AttributeType) -> AttributeType {
    AttributeType::List(Box::new(attr_type))
}

pub(crate) fn map_of(attr_type: AttributeType) -> AttributeType {
    AttributeType::Map(Box::new(attr_type))
}

pub(crate) fn object_of<'n>(fields: impl IntoIterator<Item = (&'n str, AttributeType)>) -> AttributeType {
    AttributeType::Object(
        fields
            .into_iter()
            .map(|(name, attr_type)| (name.to_owned(), attr_type))
            .collect(),
    )
}

/// Computed `id` attribute shared by all resources
pub(crate) fn id(description: &str) -> Attribute {
    computed(AttributeType::String, description)
}

pub(crate) fn block<'n>(
    description: &str,
    attributes: impl IntoIterator<Item = (&'n str, Attribute)>,
) -> Schema {
    let attributes: HashMap<String, Attribute> = attributes
        .into_iter()
        .map(|(name, attribute)| (name.to_owned(), attribute))
        .collect();
    Schema {
        version: 1,
        block: Block {
            attributes,
            description: Description::plain(description),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_collects_attributes() {
        let schema = block(
            "test",
            [
                ("id", id("id")),
                ("token", sensitive(computed(AttributeType::String, "token"))),
                ("ids", optional(list_of(AttributeType::Number), "ids")),
            ],
        );
        assert_eq!(schema.block.attributes.len(), 3);
        assert!(schema.block.attributes["token"].sensitive);
        assert!(!schema.block.attributes["ids"].sensitive);
    }
}
