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

//! Conversions between Terraform values and API fields

use std::borrow::Cow;
use std::collections::BTreeMap;

use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};

pub(crate) fn string<'a>(value: impl Into<String>) -> ValueString<'a> {
    Value::Value(Cow::Owned(value.into()))
}

/// `None` and empty strings are null
pub(crate) fn opt_string<'a>(value: Option<&str>) -> ValueString<'a> {
    match value {
        Some(value) if !value.is_empty() => string(value),
        _ => Value::Null,
    }
}

pub(crate) fn read_string(value: &ValueString<'_>) -> String {
    value.as_deref_option().unwrap_or_default().to_owned()
}

pub(crate) fn read_opt_string(value: &ValueString<'_>) -> Option<String> {
    value.as_deref_option().map(str::to_owned)
}

pub(crate) fn read_number(value: &ValueNumber) -> Option<i64> {
    match value {
        Value::Value(value) => Some(*value),
        _ => None,
    }
}

pub(crate) fn read_bool(value: &Value<bool>) -> Option<bool> {
    match value {
        Value::Value(value) => Some(*value),
        _ => None,
    }
}

pub(crate) fn read_strings(value: &ValueList<ValueString<'_>>) -> Vec<String> {
    value
        .iter()
        .flatten()
        .filter_map(|item| item.as_deref_option().map(str::to_owned))
        .collect()
}

pub(crate) fn read_numbers(value: &ValueList<ValueNumber>) -> Vec<i64> {
    value.iter().flatten().filter_map(read_number).collect()
}

pub(crate) fn read_string_map(value: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    value
        .iter()
        .flatten()
        .filter_map(|(key, item)| Some((key.to_string(), item.as_deref_option()?.to_owned())))
        .collect()
}

pub(crate) fn string_list<'a>(items: &[String]) -> ValueList<ValueString<'a>> {
    Value::Value(items.iter().map(|item| string(item.as_str())).collect())
}

pub(crate) fn number_list(items: &[i64]) -> ValueList<ValueNumber> {
    Value::Value(items.iter().copied().map(Value::Value).collect())
}

pub(crate) fn string_map<'a>(items: &BTreeMap<String, String>) -> ValueMap<'a, ValueString<'a>> {
    Value::Value(
        items
            .iter()
            .map(|(key, item)| (Cow::Owned(key.clone()), string(item.as_str())))
            .collect(),
    )
}

/// Update an optional string, an empty remote value keeping a null attribute null
pub(crate) fn sync_string<'a>(target: &mut ValueString<'a>, remote: Option<&str>) {
    match remote {
        Some(remote) if !remote.is_empty() => *target = string(remote),
        _ if target.is_null() => {}
        Some(_) => *target = string(""),
        None => *target = Value::Null,
    }
}

pub(crate) fn sync_number(target: &mut ValueNumber, remote: Option<i64>) {
    *target = match remote {
        Some(remote) => Value::Value(remote),
        None => Value::Null,
    };
}

pub(crate) fn sync_bool(target: &mut Value<bool>, remote: Option<bool>) {
    *target = match remote {
        Some(remote) => Value::Value(remote),
        None => Value::Null,
    };
}

/// Update an optional list, an empty remote list keeping a null attribute null
pub(crate) fn sync_strings<'a>(target: &mut ValueList<ValueString<'a>>, remote: &[String]) {
    if remote.is_empty() && target.is_null() {
        return;
    }
    *target = string_list(remote);
}

pub(crate) fn sync_numbers(target: &mut ValueList<ValueNumber>, remote: &[i64]) {
    if remote.is_empty() && target.is_null() {
        return;
    }
    *target = number_list(remote);
}

/// Let the provider compute an attribute left out of the configuration
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_null() {
        assert_eq!(opt_string(Some("")), Value::Null);
        assert_eq!(opt_string(None), Value::Null);
        assert_eq!(opt_string(Some("a")), string("a"));
    }

    #[test]
    fn sync_string_keeps_null() {
        let mut target: ValueString = Value::Null;
        sync_string(&mut target, Some(""));
        assert!(target.is_null());
        sync_string(&mut target, None);
        assert!(target.is_null());

        let mut target = string("old");
        sync_string(&mut target, Some(""));
        assert_eq!(target, string(""));
        sync_string(&mut target, Some("new"));
        assert_eq!(target, string("new"));

        let mut target: ValueString = Value::Unknown;
        sync_string(&mut target, None);
        assert!(target.is_null());
    }

    #[test]
    fn sync_lists_keep_null() {
        let mut target: ValueList<ValueNumber> = Value::Null;
        sync_numbers(&mut target, &[]);
        assert!(target.is_null());
        sync_numbers(&mut target, &[1, 2]);
        assert_eq!(read_numbers(&target), vec![1, 2]);

        let mut target: ValueList<ValueString> = Value::Unknown;
        sync_strings(&mut target, &[]);
        assert_eq!(target, Value::Value(vec![]));
    }

    #[test]
    fn read_lists_skip_unknown_items() {
        let list: ValueList<ValueString> = Value::Value(vec![string("a"), Value::Unknown]);
        assert_eq!(read_strings(&list), vec!["a".to_owned()]);
        assert!(read_strings(&Value::Unknown).is_empty());
    }
}
