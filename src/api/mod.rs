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

//! Client of the dbt Cloud REST API

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Settings;

mod connections;
mod credentials;
mod environment_variables;
mod environments;
pub mod error;
mod groups;
mod jobs;
mod notifications;
mod projects;
mod repositories;
mod service_tokens;
mod webhooks;

pub use connections::{Connection, ConnectionDetails};
pub use credentials::{PostgresCredential, SnowflakeCredential};
pub use environment_variables::{
    EnvironmentValue, EnvironmentVariable, JobOverride, PROJECT_DEFAULT,
};
pub use environments::Environment;
pub use error::ApiError;
pub use groups::Group;
pub use jobs::{Job, JobSchedule, JobSettings, JobTriggers, ScheduleDate, ScheduleTime};
pub use notifications::{
    Notification, NOTIFICATION_EMAIL, NOTIFICATION_EXTERNAL_EMAIL, NOTIFICATION_SLACK,
};
pub use projects::Project;
pub use repositories::{DeployKey, Repository};
pub use service_tokens::ServiceToken;
pub use webhooks::Webhook;

pub const STATE_ACTIVE: i64 = 1;
pub const STATE_DELETED: i64 = 2;

/// Fields of an API object that are not modelled here. They are kept from
/// the fetched object and sent back as is when the object is written whole.
pub type Extra = serde_json::Map<String, serde_json::Value>;

pub(crate) fn default_state() -> i64 {
    STATE_ACTIVE
}

/// Permission granted to a group or a service token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub permission_set: String,
    pub project_id: Option<i64>,
    #[serde(default)]
    pub all_projects: bool,
}

/// Objects deleted by flagging their `state` instead of a DELETE call
pub(crate) trait Lifecycle {
    fn state(&self) -> i64;
    fn set_state(&mut self, state: i64);
}

macro_rules! impl_lifecycle {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::api::Lifecycle for $t {
            fn state(&self) -> i64 {
                self.state
            }
            fn set_state(&mut self, state: i64) {
                self.state = state;
            }
        }
    )+};
}
pub(crate) use impl_lifecycle;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ApiVersion {
    V2,
    V3,
}

impl ApiVersion {
    fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Clone)]
pub struct DbtCloudClient {
    http: reqwest::Client,
    host_url: String,
    account_id: i64,
}

impl std::fmt::Debug for DbtCloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbtCloudClient")
            .field("host_url", &self.host_url)
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl DbtCloudClient {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let mut auth = HeaderValue::from_str(&format!("Token {}", settings.token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!(
                "terraform-provider-dbtcloud/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            host_url: settings.host_url.trim_end_matches('/').to_owned(),
            account_id: settings.account_id,
        })
    }

    pub fn account_id(&self) -> i64 {
        self.account_id
    }

    pub(crate) fn url(&self, version: ApiVersion, path: &str) -> String {
        format!(
            "{}/{}/accounts/{}/{}",
            self.host_url,
            version.as_str(),
            self.account_id,
            path
        )
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, url, None::<&()>).await?;
        decode(url, &body)
    }

    pub(crate) async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send(Method::POST, url, Some(body)).await?;
        decode(url, &body)
    }

    pub(crate) async fn put<B, T>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.send(Method::PUT, url, Some(body)).await?;
        decode(url, &body)
    }

    /// DELETE, ignoring the response body
    pub(crate) async fn delete<B>(&self, url: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::DELETE, url, body).await
    }

    /// Any request whose response body is not needed
    pub(crate) async fn call<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, url, body).await.map(drop)
    }

    /// Fetch an object, a soft-deleted one being reported as not found
    pub(crate) async fn get_live<T>(&self, url: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Lifecycle,
    {
        let object: T = self.get(url).await?;
        if object.state() == STATE_DELETED {
            return Err(ApiError::not_found(url));
        }
        Ok(object)
    }

    /// Delete an object by writing it back with its `state` set to deleted
    pub(crate) async fn retire<T>(&self, url: &str) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned + Lifecycle,
    {
        let mut object: T = self.get_live(url).await?;
        object.set_state(STATE_DELETED);
        tracing::debug!("flagging {} as deleted", url);
        self.post(url, &object).await
    }

    async fn send<B>(&self, method: Method, url: &str, body: Option<&B>) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_owned(),
            source,
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_owned(),
                source,
            })?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, error::truncate(&body));
            return Err(ApiError::from_response(status, url, &body));
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|source| ApiError::Decode {
            url: url.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DbtCloudClient {
        DbtCloudClient::new(&Settings {
            account_id: 12,
            token: "token".to_owned(),
            host_url: "https://cloud.getdbt.com/api/".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn urls_are_account_scoped() {
        let client = client();
        assert_eq!(
            client.url(ApiVersion::V3, "projects/3/"),
            "https://cloud.getdbt.com/api/v3/accounts/12/projects/3/"
        );
        assert_eq!(
            client.url(ApiVersion::V2, "jobs/"),
            "https://cloud.getdbt.com/api/v2/accounts/12/jobs/"
        );
    }

    #[test]
    fn invalid_token_is_rejected() {
        let err = DbtCloudClient::new(&Settings {
            account_id: 1,
            token: "bad\ntoken".to_owned(),
            host_url: "https://cloud.getdbt.com/api".to_owned(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn decode_unwraps_data() {
        let project: Project = decode(
            "u",
            r#"{"status": {"code": 200}, "data": {"id": 5, "account_id": 12, "name": "p", "state": 1}}"#,
        )
        .unwrap();
        assert_eq!(project.id, Some(5));
        assert_eq!(project.name, "p");
        assert!(matches!(
            decode::<Project>("u", "{}"),
            Err(ApiError::Decode { .. })
        ));
    }
}
