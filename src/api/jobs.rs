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

use serde::{Deserialize, Serialize};

use super::{default_state, impl_lifecycle, ApiError, ApiVersion, DbtCloudClient, Extra};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTriggers {
    #[serde(default)]
    pub github_webhook: bool,
    #[serde(default)]
    pub git_provider_webhook: bool,
    #[serde(default)]
    pub schedule: bool,
    #[serde(default)]
    pub on_merge: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    pub threads: i64,
    pub target_name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            target_name: "default".to_owned(),
            extra: Extra::new(),
        }
    }
}

/// Days part of a schedule: `every_day`, `days_of_week` or `custom_cron`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

/// Hours part of a schedule: `every_hour` or `at_exact_hours`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTime {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSchedule {
    #[serde(default)]
    pub cron: String,
    pub date: ScheduleDate,
    pub time: ScheduleTime,
}

impl Default for JobSchedule {
    fn default() -> Self {
        Self {
            cron: "0 * * * *".to_owned(),
            date: ScheduleDate {
                kind: "every_day".to_owned(),
                days: None,
                cron: None,
            },
            time: ScheduleTime {
                kind: "every_hour".to_owned(),
                interval: Some(1),
                hours: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub account_id: i64,
    pub project_id: i64,
    pub environment_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub execute_steps: Vec<String>,
    pub dbt_version: Option<String>,
    #[serde(default)]
    pub triggers: JobTriggers,
    #[serde(default)]
    pub settings: JobSettings,
    #[serde(default)]
    pub schedule: JobSchedule,
    #[serde(default)]
    pub generate_docs: bool,
    #[serde(default)]
    pub run_generate_sources: bool,
    #[serde(default = "default_state")]
    pub state: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

impl_lifecycle!(Job);

impl DbtCloudClient {
    fn job_url(&self, job_id: i64) -> String {
        self.url(ApiVersion::V2, &format!("jobs/{job_id}/"))
    }

    pub async fn get_job(&self, job_id: i64) -> Result<Job, ApiError> {
        self.get_live(&self.job_url(job_id)).await
    }

    pub async fn create_job(&self, job: &Job) -> Result<Job, ApiError> {
        let body = Job {
            id: None,
            account_id: self.account_id(),
            ..job.clone()
        };
        self.post(&self.url(ApiVersion::V2, "jobs/"), &body).await
    }

    pub async fn update_job(&self, job_id: i64, job: &Job) -> Result<Job, ApiError> {
        self.post(&self.job_url(job_id), job).await
    }

    pub async fn delete_job(&self, job_id: i64) -> Result<Job, ApiError> {
        self.retire(&self.job_url(job_id)).await
    }
}
