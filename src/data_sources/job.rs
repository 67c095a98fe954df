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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeType, Schema};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::Diagnostics;

use crate::api::{ApiError, DbtCloudClient};
use crate::managed::convert::{read_number, string};
use crate::managed::schema::{block, computed, id, list_of, map_of, required};
use crate::managed::ApiLookup;
use crate::resources::{refresh_job, JobState};
use crate::utils::WithSchema;

use super::require_known;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobData<'a> {
    pub id: ValueString<'a>,
    pub job_id: ValueNumber,
    pub project_id: ValueNumber,
    pub environment_id: ValueNumber,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub execute_steps: ValueList<ValueString<'a>>,
    pub dbt_version: ValueString<'a>,
    pub num_threads: ValueNumber,
    pub target_name: ValueString<'a>,
    pub generate_docs: Value<bool>,
    pub run_generate_sources: Value<bool>,
    pub is_active: Value<bool>,
    pub triggers: ValueMap<'a, Value<bool>>,
    pub schedule_type: ValueString<'a>,
    pub schedule_days: ValueList<ValueNumber>,
    pub schedule_hours: ValueList<ValueNumber>,
    pub schedule_interval: ValueNumber,
    pub schedule_cron: ValueString<'a>,
}

impl WithSchema for JobData<'_> {
    fn schema() -> Schema {
        block(
            "Existing dbt Cloud job",
            [
                ("id", id("Job id")),
                ("job_id", required(AttributeType::Number, "Job id")),
                ("project_id", computed(AttributeType::Number, "Project id")),
                (
                    "environment_id",
                    computed(AttributeType::Number, "Environment the job runs in"),
                ),
                ("name", computed(AttributeType::String, "Job name")),
                (
                    "description",
                    computed(AttributeType::String, "Description of the job"),
                ),
                (
                    "execute_steps",
                    computed(list_of(AttributeType::String), "dbt commands run by the job"),
                ),
                ("dbt_version", computed(AttributeType::String, "dbt version")),
                (
                    "num_threads",
                    computed(AttributeType::Number, "Number of threads"),
                ),
                ("target_name", computed(AttributeType::String, "Target name")),
                (
                    "generate_docs",
                    computed(AttributeType::Bool, "Whether documentation is generated"),
                ),
                (
                    "run_generate_sources",
                    computed(AttributeType::Bool, "Whether source freshness is run"),
                ),
                (
                    "is_active",
                    computed(AttributeType::Bool, "Whether the job is active"),
                ),
                (
                    "triggers",
                    computed(map_of(AttributeType::Bool), "Trigger flags"),
                ),
                ("schedule_type", computed(AttributeType::String, "Schedule type")),
                (
                    "schedule_days",
                    computed(list_of(AttributeType::Number), "Days of week"),
                ),
                (
                    "schedule_hours",
                    computed(list_of(AttributeType::Number), "Hours of day"),
                ),
                (
                    "schedule_interval",
                    computed(AttributeType::Number, "Hours between runs"),
                ),
                (
                    "schedule_cron",
                    computed(AttributeType::String, "Cron expression"),
                ),
            ],
        )
    }
}

impl<'a> From<JobState<'a>> for JobData<'a> {
    fn from(state: JobState<'a>) -> Self {
        Self {
            id: state.id,
            job_id: Value::Null,
            project_id: state.project_id,
            environment_id: state.environment_id,
            name: state.name,
            description: state.description,
            execute_steps: state.execute_steps,
            dbt_version: state.dbt_version,
            num_threads: state.num_threads,
            target_name: state.target_name,
            generate_docs: state.generate_docs,
            run_generate_sources: state.run_generate_sources,
            is_active: state.is_active,
            triggers: state.triggers,
            schedule_type: state.schedule_type,
            schedule_days: state.schedule_days,
            schedule_hours: state.schedule_hours,
            schedule_interval: state.schedule_interval,
            schedule_cron: state.schedule_cron,
        }
    }
}

pub struct JobLookup;

#[async_trait]
impl ApiLookup for JobLookup {
    const NAME: &'static str = "job";

    type State<'a> = JobData<'a>;

    fn validate(diags: &mut Diagnostics, config: &JobData<'_>) {
        require_known(diags, "job_id", &config.job_id);
    }

    async fn lookup<'a>(
        client: &DbtCloudClient,
        config: JobData<'a>,
    ) -> Result<JobData<'a>, ApiError> {
        let job_id = read_number(&config.job_id).unwrap_or_default();
        let job = client.get_job(job_id).await?;

        let mut state = JobState {
            id: string(job_id.to_string()),
            ..Default::default()
        };
        refresh_job(&mut state, &job);
        Ok(JobData {
            job_id: config.job_id,
            ..JobData::from(state)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::Job;

    use super::*;

    #[test]
    fn job_data_is_filled_from_the_job() {
        let job = Job {
            id: Some(12),
            project_id: 3,
            environment_id: 4,
            name: "nightly".to_owned(),
            execute_steps: vec!["dbt build".to_owned()],
            ..Default::default()
        };
        let mut state = JobState {
            id: string("12"),
            ..Default::default()
        };
        refresh_job(&mut state, &job);
        let data = JobData {
            job_id: Value::Value(12),
            ..JobData::from(state)
        };
        assert_eq!(data.id, string("12"));
        assert_eq!(data.project_id, Value::Value(3));
        assert_eq!(data.environment_id, Value::Value(4));
        assert_eq!(data.name, string("nightly"));
        assert_eq!(data.job_id, Value::Value(12));
    }
}
