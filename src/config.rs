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

//! Provider configuration, merged from the provider block and the environment.

use thiserror::Error;
use url::Url;

pub const ACCOUNT_ID_ENV: &str = "DBT_CLOUD_ACCOUNT_ID";
pub const TOKEN_ENV: &str = "DBT_CLOUD_TOKEN";
pub const HOST_URL_ENV: &str = "DBT_CLOUD_HOST_URL";
pub const DEFAULT_HOST_URL: &str = "https://cloud.getdbt.com/api";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no account id: set `account_id` in the provider block or DBT_CLOUD_ACCOUNT_ID")]
    MissingAccountId,
    #[error("invalid account id `{0}`: expected a positive integer")]
    InvalidAccountId(String),
    #[error("no API token: set `token` in the provider block or DBT_CLOUD_TOKEN")]
    MissingToken,
    #[error("invalid host url `{url}`: {reason}")]
    InvalidHostUrl { url: String, reason: String },
}

/// Settings used to build the API client
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub account_id: i64,
    pub token: String,
    pub host_url: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("account_id", &self.account_id)
            .field("token", &"<redacted>")
            .field("host_url", &self.host_url)
            .finish()
    }
}

impl Settings {
    /// Resolve the settings: explicit values win over `env`, which wins over defaults.
    pub fn resolve<E>(
        account_id: Option<i64>,
        token: Option<&str>,
        host_url: Option<&str>,
        env: E,
    ) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let account_id = match account_id {
            Some(account_id) => account_id,
            None => {
                let raw = env(ACCOUNT_ID_ENV).ok_or(ConfigError::MissingAccountId)?;
                raw.parse()
                    .map_err(|_| ConfigError::InvalidAccountId(raw.clone()))?
            }
        };
        if account_id <= 0 {
            return Err(ConfigError::InvalidAccountId(account_id.to_string()));
        }

        let token = token
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
            .or_else(|| env(TOKEN_ENV))
            .ok_or(ConfigError::MissingToken)?;

        let host_url = host_url
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
            .or_else(|| env(HOST_URL_ENV))
            .unwrap_or_else(|| DEFAULT_HOST_URL.to_owned());
        let parsed = Url::parse(&host_url).map_err(|err| ConfigError::InvalidHostUrl {
            url: host_url.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidHostUrl {
                url: host_url,
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        Ok(Self {
            account_id,
            token,
            host_url: host_url.trim_end_matches('/').to_owned(),
        })
    }
}

/// Environment lookup backed by the process environment, ignoring empty values
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let env = env_of(&[
            (ACCOUNT_ID_ENV, "1"),
            (TOKEN_ENV, "env-token"),
            (HOST_URL_ENV, "https://emea.dbt.com/api"),
        ]);
        let settings = Settings::resolve(
            Some(42),
            Some("block-token"),
            Some("https://cloud.example.com/api/"),
            env,
        )
        .unwrap();
        assert_eq!(settings.account_id, 42);
        assert_eq!(settings.token, "block-token");
        assert_eq!(settings.host_url, "https://cloud.example.com/api");
    }

    #[test]
    fn falls_back_to_environment_then_default() {
        let env = env_of(&[(ACCOUNT_ID_ENV, "7"), (TOKEN_ENV, "env-token")]);
        let settings = Settings::resolve(None, None, None, env).unwrap();
        assert_eq!(settings.account_id, 7);
        assert_eq!(settings.token, "env-token");
        assert_eq!(settings.host_url, DEFAULT_HOST_URL);
    }

    #[test]
    fn empty_block_values_are_ignored() {
        let env = env_of(&[(TOKEN_ENV, "env-token")]);
        let settings = Settings::resolve(Some(3), Some(""), Some(""), env).unwrap();
        assert_eq!(settings.token, "env-token");
        assert_eq!(settings.host_url, DEFAULT_HOST_URL);
    }

    #[test]
    fn missing_values_are_errors() {
        assert_eq!(
            Settings::resolve(None, Some("t"), None, env_of(&[])),
            Err(ConfigError::MissingAccountId)
        );
        assert_eq!(
            Settings::resolve(Some(1), None, None, env_of(&[])),
            Err(ConfigError::MissingToken)
        );
    }

    #[test]
    fn invalid_values_are_errors() {
        assert_eq!(
            Settings::resolve(None, Some("t"), None, env_of(&[(ACCOUNT_ID_ENV, "abc")])),
            Err(ConfigError::InvalidAccountId("abc".to_owned()))
        );
        assert_eq!(
            Settings::resolve(Some(0), Some("t"), None, env_of(&[])),
            Err(ConfigError::InvalidAccountId("0".to_owned()))
        );
        assert!(matches!(
            Settings::resolve(Some(1), Some("t"), Some("not a url"), env_of(&[])),
            Err(ConfigError::InvalidHostUrl { .. })
        ));
        assert!(matches!(
            Settings::resolve(Some(1), Some("t"), Some("ftp://cloud.getdbt.com"), env_of(&[])),
            Err(ConfigError::InvalidHostUrl { .. })
        ));
    }

    #[test]
    fn debug_hides_token() {
        let settings = Settings::resolve(Some(1), Some("secret"), None, env_of(&[])).unwrap();
        assert!(!format!("{settings:?}").contains("secret"));
    }
}
