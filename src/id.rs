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

//! Composite identifiers stored as the Terraform `id` of nested objects.
//!
//! The dbt Cloud API addresses most objects through their parent project,
//! so the state id of a credential is `"<project_id>:<credential_id>"`, the
//! id of a job-level environment variable override is
//! `"<project_id>:<job_id>:<override_id>"`, and so on.

use std::fmt::Display;

use thiserror::Error;

use crate::utils::DisplayJoinable;

/// Separator between the components of a composite id
pub const ID_DELIMITER: &str = ":";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIdentifier {
    #[error("malformed identifier `{id}`: expected {expected} part(s) separated by `:`, found {found}")]
    Arity {
        id: String,
        expected: usize,
        found: usize,
    },
    #[error("malformed identifier `{id}`: part {position} (`{part}`) is not a non-negative integer")]
    NotNumeric {
        id: String,
        position: usize,
        part: String,
    },
    #[error("malformed identifier `{id}`: part {position} is empty")]
    Empty { id: String, position: usize },
}

/// Join the components of an identifier
pub fn encode<I, D>(parts: I) -> String
where
    I: IntoIterator<Item = D>,
    D: Display,
{
    parts.into_iter().join_with(ID_DELIMITER).to_string()
}

/// Split an identifier into exactly `arity` parts
pub fn decode(id: &str, arity: usize) -> Result<Vec<&str>, MalformedIdentifier> {
    let parts: Vec<&str> = id.split(ID_DELIMITER).collect();
    if parts.len() != arity {
        return Err(MalformedIdentifier::Arity {
            id: id.to_owned(),
            expected: arity,
            found: parts.len(),
        });
    }
    if let Some(position) = parts.iter().position(|part| part.is_empty()) {
        return Err(MalformedIdentifier::Empty {
            id: id.to_owned(),
            position,
        });
    }
    Ok(parts)
}

fn numeric(id: &str, position: usize, part: &str) -> Result<i64, MalformedIdentifier> {
    let not_numeric = || MalformedIdentifier::NotNumeric {
        id: id.to_owned(),
        position,
        part: part.to_owned(),
    };
    // `str::parse` would accept a leading `+`
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }
    part.parse().map_err(|_| not_numeric())
}

/// Typed key of an API object, with a fixed number of components
pub trait CompositeKey: Sized {
    const ARITY: usize;

    fn encode(&self) -> String;
    fn decode(id: &str) -> Result<Self, MalformedIdentifier>;
}

impl CompositeKey for i64 {
    const ARITY: usize = 1;

    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(id: &str) -> Result<Self, MalformedIdentifier> {
        let parts = decode(id, Self::ARITY)?;
        numeric(id, 0, parts[0])
    }
}

impl CompositeKey for String {
    const ARITY: usize = 1;

    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(id: &str) -> Result<Self, MalformedIdentifier> {
        let parts = decode(id, Self::ARITY)?;
        Ok(parts[0].to_owned())
    }
}

impl CompositeKey for (i64, i64) {
    const ARITY: usize = 2;

    fn encode(&self) -> String {
        encode([self.0, self.1])
    }

    fn decode(id: &str) -> Result<Self, MalformedIdentifier> {
        let parts = decode(id, Self::ARITY)?;
        Ok((numeric(id, 0, parts[0])?, numeric(id, 1, parts[1])?))
    }
}

impl CompositeKey for (i64, String) {
    const ARITY: usize = 2;

    fn encode(&self) -> String {
        format!("{}{ID_DELIMITER}{}", self.0, self.1)
    }

    fn decode(id: &str) -> Result<Self, MalformedIdentifier> {
        let parts = decode(id, Self::ARITY)?;
        Ok((numeric(id, 0, parts[0])?, parts[1].to_owned()))
    }
}

impl CompositeKey for (i64, i64, i64) {
    const ARITY: usize = 3;

    fn encode(&self) -> String {
        encode([self.0, self.1, self.2])
    }

    fn decode(id: &str) -> Result<Self, MalformedIdentifier> {
        let parts = decode(id, Self::ARITY)?;
        Ok((
            numeric(id, 0, parts[0])?,
            numeric(id, 1, parts[1])?,
            numeric(id, 2, parts[2])?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn encode_joins_with_delimiter() {
        assert_eq!(encode([12, 34]), "12:34");
        assert_eq!((12i64, 34i64).encode(), "12:34");
        assert_eq!((1i64, 2i64, 3i64).encode(), "1:2:3");
        assert_eq!((7i64, "DBT_TARGET".to_owned()).encode(), "7:DBT_TARGET");
    }

    #[test]
    fn decode_two_parts() {
        assert_eq!(<(i64, i64)>::decode("12:34"), Ok((12, 34)));
        assert_eq!(decode("12:34", 2), Ok(vec!["12", "34"]));
    }

    #[test]
    fn decode_rejects_wrong_arity() {
        assert_eq!(
            <(i64, i64)>::decode("12:34:56"),
            Err(MalformedIdentifier::Arity {
                id: "12:34:56".to_owned(),
                expected: 2,
                found: 3,
            })
        );
        assert!(matches!(
            <(i64, i64, i64)>::decode("12:34"),
            Err(MalformedIdentifier::Arity { found: 2, .. })
        ));
        assert!(matches!(
            i64::decode("1:2"),
            Err(MalformedIdentifier::Arity { .. })
        ));
    }

    #[test]
    fn decode_rejects_non_numeric_parts() {
        for id in ["12:abc", "12: 34", "+12:34", "-1:34", "12:3.4"] {
            assert!(
                matches!(
                    <(i64, i64)>::decode(id),
                    Err(MalformedIdentifier::NotNumeric { .. })
                ),
                "{id} should be rejected"
            );
        }
        assert!(matches!(
            <(i64, String)>::decode("x:DBT_NAME"),
            Err(MalformedIdentifier::NotNumeric { position: 0, .. })
        ));
    }

    #[test]
    fn decode_rejects_empty_parts() {
        assert!(matches!(
            <(i64, i64)>::decode("12:"),
            Err(MalformedIdentifier::Empty { position: 1, .. })
        ));
        assert!(matches!(
            i64::decode(""),
            Err(MalformedIdentifier::Empty { position: 0, .. })
        ));
    }

    #[test]
    fn decode_does_not_normalize() {
        assert_eq!(
            <(i64, String)>::decode("3:dbt_lower"),
            Ok((3, "dbt_lower".to_owned()))
        );
        assert!(String::decode("wsu_123").is_ok());
        assert!(i64::decode("007").is_ok());
    }

    #[test]
    fn overflowing_part_is_not_numeric() {
        assert!(matches!(
            i64::decode("99999999999999999999"),
            Err(MalformedIdentifier::NotNumeric { .. })
        ));
    }

    proptest! {
        #[test]
        fn pair_round_trip(a in 0..i64::MAX, b in 0..i64::MAX) {
            prop_assert_eq!(<(i64, i64)>::decode(&(a, b).encode()), Ok((a, b)));
        }

        #[test]
        fn triple_round_trip(a in 0..i64::MAX, b in 0..i64::MAX, c in 0..i64::MAX) {
            prop_assert_eq!(<(i64, i64, i64)>::decode(&(a, b, c).encode()), Ok((a, b, c)));
        }

        #[test]
        fn named_round_trip(project in 0..i64::MAX, name in "DBT_[A-Z0-9_]{1,30}") {
            let key = (project, name);
            prop_assert_eq!(<(i64, String)>::decode(&key.encode()), Ok(key));
        }
    }
}
