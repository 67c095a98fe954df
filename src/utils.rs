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

use std::cell::RefCell;

use tf_provider::{value::ValueString, AttributePath, Diagnostics, Schema};

pub trait WithSchema {
    fn schema() -> Schema;
}

pub trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

/// Report an error if a known string value is not one of `allowed`
pub(crate) fn check_one_of(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &ValueString<'_>,
    allowed: &[&str],
) {
    if let Some(value) = value.as_deref_option() {
        if !allowed.contains(&value) {
            diags.error(
                "Invalid attribute value",
                format!(
                    "`{value}` is not one of: {}",
                    allowed.iter().map(|v| format!("`{v}`")).join_with(", ")
                ),
                attr_path,
            );
        }
    }
}

pub struct DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    iter: RefCell<T>,
    sep: &'a str,
}

pub trait DisplayJoinable {
    type Joiner<'a>;
    fn join_with(self, sep: &str) -> Self::Joiner<'_>;
}

impl<T, I> DisplayJoinable for T
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    type Joiner<'a> = DisplayJoiner<'a, T, I>;

    fn join_with(self, sep: &str) -> Self::Joiner<'_> {
        DisplayJoiner {
            iter: RefCell::new(self),
            sep,
        }
    }
}

impl<'a, T, I> std::fmt::Display for DisplayJoiner<'a, T, I>
where
    T: Iterator<Item = I>,
    I: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        let mut iter = self.iter.try_borrow_mut().or(Err(std::fmt::Error))?;
        for elt in iter.by_ref() {
            f.write_str(sep)?;
            f.write_fmt(format_args!("{elt}"))?;
            sep = self.sep;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use tf_provider::value::Value;

    use super::*;

    #[test]
    fn join_with_separator() {
        assert_eq!([1, 2, 3].iter().join_with(":").to_string(), "1:2:3");
        assert_eq!(std::iter::empty::<i64>().join_with(":").to_string(), "");
    }

    #[test]
    fn one_of_ignores_unknown_and_null() {
        let mut diags = Diagnostics::default();
        let allowed = ["a", "b"];
        check_one_of(&mut diags, AttributePath::new("x"), &Value::Unknown, &allowed);
        check_one_of(&mut diags, AttributePath::new("x"), &Value::Null, &allowed);
        check_one_of(
            &mut diags,
            AttributePath::new("x"),
            &Value::Value(Cow::Borrowed("a")),
            &allowed,
        );
        assert!(diags.errors.is_empty());

        check_one_of(
            &mut diags,
            AttributePath::new("x"),
            &Value::Value(Cow::Borrowed("c")),
            &allowed,
        );
        assert_eq!(diags.errors.len(), 1);
    }
}
