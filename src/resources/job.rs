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

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeType, Schema};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{
    ApiError, DbtCloudClient, Job, JobSchedule, JobSettings, JobTriggers, ScheduleDate,
    ScheduleTime,
};
use crate::managed::convert::{
    read_bool, read_number, read_numbers, read_opt_string, read_string, read_strings, string,
    string_list, sync_number, sync_numbers, sync_string,
};
use crate::managed::schema::{block, id, list_of, map_of, optional, optional_computed, required};
use crate::managed::{ApiObject, Changes, Computed};
use crate::utils::{check_one_of, WithNormalize, WithSchema};

use super::{is_active, lifecycle_state, warn_inactive};

const SCHEDULE_TYPES: &[&str] = &["every_day", "days_of_week", "custom_cron"];
const TRIGGERS: &[&str] = &["github_webhook", "git_provider_webhook", "schedule", "on_merge"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState<'a> {
    pub id: ValueString<'a>,
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

impl WithSchema for JobState<'_> {
    fn schema() -> Schema {
        block(
            "dbt Cloud job",
            [
                ("id", id("Job id")),
                ("project_id", required(AttributeType::Number, "Project id")),
                (
                    "environment_id",
                    required(AttributeType::Number, "Environment the job runs in"),
                ),
                ("name", required(AttributeType::String, "Job name")),
                (
                    "description",
                    optional(AttributeType::String, "Description of the job"),
                ),
                (
                    "execute_steps",
                    required(list_of(AttributeType::String), "dbt commands to run"),
                ),
                (
                    "dbt_version",
                    optional(
                        AttributeType::String,
                        "dbt version, inherited from the environment if unset",
                    ),
                ),
                (
                    "num_threads",
                    optional_computed(AttributeType::Number, "Number of threads, 1 by default"),
                ),
                (
                    "target_name",
                    optional_computed(AttributeType::String, "Target name, `default` by default"),
                ),
                (
                    "generate_docs",
                    optional_computed(AttributeType::Bool, "Generate documentation"),
                ),
                (
                    "run_generate_sources",
                    optional_computed(AttributeType::Bool, "Run source freshness"),
                ),
                (
                    "is_active",
                    optional_computed(AttributeType::Bool, "Whether the job is active"),
                ),
                (
                    "triggers",
                    required(
                        map_of(AttributeType::Bool),
                        "`github_webhook`, `git_provider_webhook`, `schedule` and `on_merge` flags",
                    ),
                ),
                (
                    "schedule_type",
                    optional_computed(
                        AttributeType::String,
                        "`every_day`, `days_of_week` or `custom_cron`",
                    ),
                ),
                (
                    "schedule_days",
                    optional(list_of(AttributeType::Number), "Days of week, 0 is Sunday"),
                ),
                (
                    "schedule_hours",
                    optional(list_of(AttributeType::Number), "Hours of day to run at"),
                ),
                (
                    "schedule_interval",
                    optional_computed(AttributeType::Number, "Hours between runs"),
                ),
                (
                    "schedule_cron",
                    optional(AttributeType::String, "Cron expression of a `custom_cron` schedule"),
                ),
            ],
        )
    }
}

impl WithNormalize for JobState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.num_threads.is_null() {
            self.num_threads = Value::Value(1);
        }
        if self.target_name.is_null() {
            self.target_name = string("default");
        }
        if self.generate_docs.is_null() {
            self.generate_docs = Value::Value(false);
        }
        if self.run_generate_sources.is_null() {
            self.run_generate_sources = Value::Value(false);
        }
        if self.is_active.is_null() {
            self.is_active = Value::Value(true);
        }
        if self.schedule_type.is_null() {
            self.schedule_type = string("every_day");
        }
    }
}

fn read_triggers(triggers: &ValueMap<'_, Value<bool>>) -> JobTriggers {
    let flag = |name: &str| {
        triggers
            .as_ref_option()
            .and_then(|triggers| triggers.get(name))
            .and_then(read_bool)
            .unwrap_or_default()
    };
    JobTriggers {
        github_webhook: flag("github_webhook"),
        git_provider_webhook: flag("git_provider_webhook"),
        schedule: flag("schedule"),
        on_merge: flag("on_merge"),
        ..Default::default()
    }
}

fn trigger_map<'a>(triggers: &JobTriggers) -> ValueMap<'a, Value<bool>> {
    Value::Value(
        [
            ("github_webhook", triggers.github_webhook),
            ("git_provider_webhook", triggers.git_provider_webhook),
            ("schedule", triggers.schedule),
            ("on_merge", triggers.on_merge),
        ]
        .into_iter()
        .map(|(name, flag)| (Cow::Borrowed(name), Value::Value(flag)))
        .collect(),
    )
}

fn read_schedule(state: &JobState<'_>) -> JobSchedule {
    let kind = state
        .schedule_type
        .as_deref_option()
        .unwrap_or("every_day")
        .to_owned();
    let days = read_numbers(&state.schedule_days);
    let cron = read_opt_string(&state.schedule_cron);
    let hours = read_numbers(&state.schedule_hours);

    let time = if hours.is_empty() {
        ScheduleTime {
            kind: "every_hour".to_owned(),
            interval: Some(read_number(&state.schedule_interval).unwrap_or(1)),
            hours: None,
        }
    } else {
        ScheduleTime {
            kind: "at_exact_hours".to_owned(),
            interval: None,
            hours: Some(hours),
        }
    };

    JobSchedule {
        cron: cron.clone().unwrap_or_else(|| JobSchedule::default().cron),
        date: ScheduleDate {
            days: (kind == "days_of_week").then_some(days),
            cron: if kind == "custom_cron" { cron } else { None },
            kind,
        },
        time,
    }
}

fn schedule_changed(changes: &Changes<'_, JobState<'_>>) -> bool {
    changes.has_change(|s| &s.schedule_type)
        || changes.has_change(|s| &s.schedule_days)
        || changes.has_change(|s| &s.schedule_hours)
        || changes.has_change(|s| &s.schedule_interval)
        || changes.has_change(|s| &s.schedule_cron)
}

pub(crate) fn refresh_job(state: &mut JobState<'_>, remote: &Job) {
    state.project_id = Value::Value(remote.project_id);
    state.environment_id = Value::Value(remote.environment_id);
    state.name = string(remote.name.as_str());
    sync_string(&mut state.description, Some(remote.description.as_str()));
    state.execute_steps = string_list(&remote.execute_steps);
    sync_string(&mut state.dbt_version, remote.dbt_version.as_deref());
    state.num_threads = Value::Value(remote.settings.threads);
    state.target_name = string(remote.settings.target_name.as_str());
    state.generate_docs = Value::Value(remote.generate_docs);
    state.run_generate_sources = Value::Value(remote.run_generate_sources);
    state.is_active = Value::Value(is_active(remote.state));
    state.triggers = trigger_map(&remote.triggers);

    let schedule = &remote.schedule;
    state.schedule_type = string(schedule.date.kind.as_str());
    sync_numbers(
        &mut state.schedule_days,
        schedule.date.days.as_deref().unwrap_or_default(),
    );
    sync_numbers(
        &mut state.schedule_hours,
        schedule.time.hours.as_deref().unwrap_or_default(),
    );
    sync_number(&mut state.schedule_interval, schedule.time.interval);
    sync_string(&mut state.schedule_cron, schedule.date.cron.as_deref());
}

pub struct JobResource;

#[async_trait]
impl ApiObject for JobResource {
    const NAME: &'static str = "job";

    type Key = i64;
    type Remote = Job;
    type State<'a> = JobState<'a>;

    fn id<'s, 'a>(state: &'s Self::State<'a>) -> &'s ValueString<'a> {
        &state.id
    }

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a> {
        &mut state.id
    }

    fn computed<'s, 'a>(state: &'s mut Self::State<'a>) -> Vec<&'s mut dyn Computed> {
        vec![&mut state.schedule_interval as &mut dyn Computed]
    }

    fn validate(diags: &mut Diagnostics, config: &JobState<'_>) {
        check_one_of(
            diags,
            AttributePath::new("schedule_type"),
            &config.schedule_type,
            SCHEDULE_TYPES,
        );
        for (name, _) in config.triggers.iter().flatten() {
            let name: &str = name;
            if !TRIGGERS.contains(&name) {
                diags.error(
                    "Unknown trigger",
                    format!("`{name}` is not one of: {}", TRIGGERS.join(", ")),
                    AttributePath::new("triggers").key(name.to_owned()),
                );
            }
        }
        for (i, day) in config.schedule_days.iter().flatten().enumerate() {
            if read_number(day).is_some_and(|day| !(0..=6).contains(&day)) {
                diags.error_short(
                    "Days of week must be between 0 and 6",
                    AttributePath::new("schedule_days").index(i as i64),
                );
            }
        }
        for (i, hour) in config.schedule_hours.iter().flatten().enumerate() {
            if read_number(hour).is_some_and(|hour| !(0..=23).contains(&hour)) {
                diags.error_short(
                    "Hours must be between 0 and 23",
                    AttributePath::new("schedule_hours").index(i as i64),
                );
            }
        }
        match config.schedule_type.as_deref_option() {
            Some("custom_cron") if config.schedule_cron.is_null() => {
                diags.error_short(
                    "`schedule_cron` is required for a `custom_cron` schedule",
                    AttributePath::new("schedule_cron"),
                );
            }
            Some("days_of_week") if config.schedule_days.is_null() => {
                diags.error_short(
                    "`schedule_days` is required for a `days_of_week` schedule",
                    AttributePath::new("schedule_days"),
                );
            }
            _ => (),
        }
        warn_inactive(diags, &config.is_active);
    }

    fn replace_on(changes: &Changes<'_, JobState<'_>>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        changes.replace_if(&mut paths, "project_id", |s| &s.project_id);
        paths
    }

    fn key(remote: &Job) -> Option<i64> {
        remote.id
    }

    fn draft(planned: &JobState<'_>) -> Job {
        let defaults = JobSettings::default();
        Job {
            project_id: read_number(&planned.project_id).unwrap_or_default(),
            environment_id: read_number(&planned.environment_id).unwrap_or_default(),
            name: read_string(&planned.name),
            description: read_string(&planned.description),
            execute_steps: read_strings(&planned.execute_steps),
            dbt_version: read_opt_string(&planned.dbt_version),
            triggers: read_triggers(&planned.triggers),
            settings: JobSettings {
                threads: read_number(&planned.num_threads).unwrap_or(defaults.threads),
                target_name: read_opt_string(&planned.target_name)
                    .unwrap_or(defaults.target_name),
                ..Default::default()
            },
            schedule: read_schedule(planned),
            generate_docs: read_bool(&planned.generate_docs).unwrap_or_default(),
            run_generate_sources: read_bool(&planned.run_generate_sources).unwrap_or_default(),
            state: lifecycle_state(&planned.is_active),
            ..Default::default()
        }
    }

    fn merge(remote: &mut Job, changes: &Changes<'_, JobState<'_>>) {
        changes.overlay(&mut remote.environment_id, |s| &s.environment_id, |v| {
            read_number(v).unwrap_or_default()
        });
        changes.overlay(&mut remote.name, |s| &s.name, read_string);
        changes.overlay(&mut remote.description, |s| &s.description, read_string);
        changes.overlay(&mut remote.execute_steps, |s| &s.execute_steps, read_strings);
        changes.overlay(&mut remote.dbt_version, |s| &s.dbt_version, read_opt_string);
        changes.overlay(&mut remote.settings.threads, |s| &s.num_threads, |v| {
            read_number(v).unwrap_or(1)
        });
        changes.overlay(&mut remote.settings.target_name, |s| &s.target_name, |v| {
            read_opt_string(v).unwrap_or_else(|| "default".to_owned())
        });
        changes.overlay(&mut remote.generate_docs, |s| &s.generate_docs, |v| {
            read_bool(v).unwrap_or_default()
        });
        changes.overlay(
            &mut remote.run_generate_sources,
            |s| &s.run_generate_sources,
            |v| read_bool(v).unwrap_or_default(),
        );
        changes.overlay(&mut remote.state, |s| &s.is_active, lifecycle_state);
        if changes.has_change(|s| &s.triggers) {
            remote.triggers = JobTriggers {
                extra: std::mem::take(&mut remote.triggers.extra),
                ..read_triggers(&changes.planned().triggers)
            };
        }
        if schedule_changed(changes) {
            remote.schedule = read_schedule(changes.planned());
        }
    }

    fn refresh(state: &mut JobState<'_>, remote: &Job) {
        refresh_job(state, remote);
    }

    async fn fetch(client: &DbtCloudClient, key: &i64) -> Result<Job, ApiError> {
        client.get_job(*key).await
    }

    async fn create(client: &DbtCloudClient, draft: &Job) -> Result<Job, ApiError> {
        client.create_job(draft).await
    }

    async fn replace(client: &DbtCloudClient, key: &i64, merged: &Job) -> Result<Job, ApiError> {
        client.update_job(*key, merged).await
    }

    async fn delete(client: &DbtCloudClient, key: &i64) -> Result<(), ApiError> {
        client.delete_job(*key).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::STATE_ACTIVE;

    use super::*;

    fn state() -> JobState<'static> {
        let mut state = JobState {
            id: string("11"),
            project_id: Value::Value(3),
            environment_id: Value::Value(9),
            name: string("nightly"),
            description: Value::Null,
            execute_steps: string_list(&["dbt build".to_owned()]),
            triggers: trigger_map(&JobTriggers {
                schedule: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        state.normalize(&mut Diagnostics::default());
        state.schedule_interval = Value::Value(1);
        state
    }

    #[test]
    fn draft_uses_defaults() {
        let job = JobResource::draft(&state());
        assert_eq!(job.settings, JobSettings::default());
        assert_eq!(job.schedule, JobSchedule::default());
        assert!(job.triggers.schedule);
        assert!(!job.triggers.github_webhook);
        assert_eq!(job.state, STATE_ACTIVE);
    }

    #[test]
    fn changed_triggers_keep_unmodelled_flags() {
        let prior = state();
        let planned = JobState {
            triggers: trigger_map(&JobTriggers {
                github_webhook: true,
                ..Default::default()
            }),
            ..state()
        };
        let mut fetched = JobResource::draft(&prior);
        fetched
            .triggers
            .extra
            .insert("custom_branch_only".to_owned(), serde_json::Value::Bool(true));

        JobResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert!(fetched.triggers.github_webhook);
        assert!(!fetched.triggers.schedule);
        assert_eq!(
            fetched.triggers.extra.get("custom_branch_only"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[test]
    fn merge_only_overlays_threads() {
        let prior = state();
        let planned = JobState {
            num_threads: Value::Value(8),
            ..state()
        };
        let mut fetched = Job {
            id: Some(11),
            settings: JobSettings {
                threads: 4,
                target_name: "prod".to_owned(),
                ..Default::default()
            },
            ..JobResource::draft(&prior)
        };
        fetched.name = "A".to_owned();

        JobResource::merge(&mut fetched, &Changes::new(&prior, &planned));
        assert_eq!(fetched.name, "A");
        assert_eq!(fetched.settings.threads, 8);
        assert_eq!(fetched.settings.target_name, "prod");
    }

    #[test]
    fn schedule_is_rebuilt_when_changed() {
        let prior = state();
        let planned = JobState {
            schedule_type: string("days_of_week"),
            schedule_days: Value::Value(vec![Value::Value(1), Value::Value(3)]),
            schedule_hours: Value::Value(vec![Value::Value(6)]),
            ..state()
        };
        let mut fetched = JobResource::draft(&prior);
        JobResource::merge(&mut fetched, &Changes::new(&prior, &planned));

        assert_eq!(fetched.schedule.date.kind, "days_of_week");
        assert_eq!(fetched.schedule.date.days, Some(vec![1, 3]));
        assert_eq!(fetched.schedule.time.kind, "at_exact_hours");
        assert_eq!(fetched.schedule.time.hours, Some(vec![6]));
    }

    #[test]
    fn refresh_round_trips_draft() {
        let planned = state();
        let mut refreshed = planned.clone();
        refresh_job(&mut refreshed, &JobResource::draft(&planned));
        assert_eq!(refreshed, planned);
    }

    #[test]
    fn validation_checks_schedule() {
        let mut diags = Diagnostics::default();
        JobResource::validate(&mut diags, &state());
        assert!(diags.errors.is_empty());

        let config = JobState {
            schedule_type: string("custom_cron"),
            schedule_hours: Value::Value(vec![Value::Value(24), Value::Unknown]),
            ..state()
        };
        JobResource::validate(&mut diags, &config);
        assert_eq!(diags.errors.len(), 2);
    }
}
