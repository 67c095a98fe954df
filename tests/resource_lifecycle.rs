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

use serde_json::json;
use tf_provider::value::{Value, ValueEmpty, ValueString};
use tf_provider::{Diagnostics, Resource};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_dbtcloud::api::DbtCloudClient;
use terraform_provider_dbtcloud::config::Settings;
use terraform_provider_dbtcloud::managed::{ClientSlot, ManagedResource};
use terraform_provider_dbtcloud::resources::{
    GroupResource, GroupState, ProjectResource, ProjectState, RepositoryResource, RepositoryState,
};

fn slot(server: &MockServer) -> ClientSlot {
    let client = DbtCloudClient::new(&Settings {
        account_id: 12,
        token: "test-token".to_owned(),
        host_url: server.uri(),
    })
    .unwrap();
    ClientSlot::with_client(client)
}

fn string(value: &str) -> ValueString<'static> {
    Value::Value(Cow::Owned(value.to_owned()))
}

fn data(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": {"code": 200}, "data": value}))
}

fn project_state() -> ProjectState<'static> {
    ProjectState {
        id: string("3"),
        name: string("analytics"),
        description: Value::Null,
        dbt_project_subdirectory: string("dbt"),
    }
}

#[tokio::test]
async fn read_of_a_missing_object_removes_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/projects/3/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let resource = ManagedResource::<ProjectResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .read(
            &mut diags,
            Value::Value(project_state()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(state.is_null());
    assert!(diags.errors.is_empty());
}

#[tokio::test]
async fn read_refreshes_the_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/projects/3/"))
        .respond_with(data(json!({
            "id": 3,
            "account_id": 12,
            "name": "analytics (renamed)",
            "dbt_project_subdirectory": "dbt",
            "state": 1,
        })))
        .mount(&server)
        .await;

    let resource = ManagedResource::<ProjectResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .read(
            &mut diags,
            Value::Value(project_state()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    let Value::Value(state) = state else {
        panic!("state was removed");
    };
    assert_eq!(state.name, string("analytics (renamed)"));
    assert!(state.description.is_null());
}

#[tokio::test]
async fn update_writes_back_untouched_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/projects/3/"))
        .respond_with(data(json!({
            "id": 3,
            "account_id": 12,
            "name": "analytics",
            "description": "set outside of terraform",
            "dbt_project_subdirectory": "dbt",
            "connection_id": 5,
            "docs_job_id": 9,
            "state": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/accounts/12/projects/3/"))
        .and(body_partial_json(json!({
            "name": "analytics",
            "dbt_project_subdirectory": "transform",
            "description": "set outside of terraform",
            "connection_id": 5,
            "docs_job_id": 9,
        })))
        .respond_with(data(json!({
            "id": 3,
            "account_id": 12,
            "name": "analytics",
            "description": "set outside of terraform",
            "dbt_project_subdirectory": "transform",
            "connection_id": 5,
            "state": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = ManagedResource::<ProjectResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let planned = ProjectState {
        dbt_project_subdirectory: string("transform"),
        ..project_state()
    };
    let (state, _) = resource
        .update(
            &mut diags,
            Value::Value(project_state()),
            Value::Value(planned.clone()),
            Value::Value(planned),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    assert!(diags.errors.is_empty());
    let Value::Value(state) = state else {
        panic!("state was removed");
    };
    assert_eq!(state.dbt_project_subdirectory, string("transform"));
    assert_eq!(state.description, string("set outside of terraform"));
}

#[tokio::test]
async fn destroying_a_group_flags_it_as_deleted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/groups/4/"))
        .respond_with(data(json!({
            "id": 4,
            "account_id": 12,
            "name": "analysts",
            "assign_by_default": false,
            "sso_mapping_groups": ["okta-analysts"],
            "docs_url": "https://docs.example.com/analysts",
            "state": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/accounts/12/groups/4/"))
        .and(body_partial_json(json!({
            "state": 2,
            "name": "analysts",
            "assign_by_default": false,
            "sso_mapping_groups": ["okta-analysts"],
            "docs_url": "https://docs.example.com/analysts",
        })))
        .respond_with(data(json!({
            "id": 4,
            "account_id": 12,
            "name": "analysts",
            "state": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = ManagedResource::<GroupResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let state = GroupState {
        id: string("4"),
        name: string("analysts"),
        ..Default::default()
    };
    let destroyed = resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
        )
        .await;
    assert!(destroyed.is_some());
    assert!(diags.errors.is_empty());
}

#[tokio::test]
async fn update_of_a_missing_object_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/projects/3/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resource = ManagedResource::<ProjectResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let planned = ProjectState {
        name: string("analytics v2"),
        ..project_state()
    };
    let updated = resource
        .update(
            &mut diags,
            Value::Value(project_state()),
            Value::Value(planned.clone()),
            Value::Value(planned),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(updated.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn destroying_a_missing_group_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/accounts/12/groups/4/"))
        .respond_with(data(json!({
            "id": 4,
            "account_id": 12,
            "name": "analysts",
            "state": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resource = ManagedResource::<GroupResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let state = GroupState {
        id: string("4"),
        name: string("analysts"),
        ..Default::default()
    };
    let destroyed = resource
        .destroy(
            &mut diags,
            Value::Value(state),
            ValueEmpty::default(),
        )
        .await;
    assert!(destroyed.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn planned_creation_leaves_computed_attributes_unknown() {
    let server = MockServer::start().await;
    let resource = ManagedResource::<RepositoryResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let proposed = RepositoryState {
        project_id: Value::Value(3),
        remote_url: string("git@github.com:acme/analytics.git"),
        ..Default::default()
    };
    let (planned, _) = resource
        .plan_create(
            &mut diags,
            Value::Value(proposed.clone()),
            Value::Value(proposed),
            ValueEmpty::default(),
        )
        .await
        .unwrap();
    let Value::Value(planned) = planned else {
        panic!("no planned state");
    };
    assert!(diags.errors.is_empty());
    assert!(planned.id.is_unknown());
    assert!(planned.repository_id.is_unknown());
    assert!(planned.deploy_key.is_unknown());
    assert_eq!(planned.git_clone_strategy, string("deploy_key"));
}

#[tokio::test]
async fn malformed_import_ids_are_rejected() {
    let server = MockServer::start().await;
    let resource = ManagedResource::<ProjectResource>::new(slot(&server));
    let mut diags = Diagnostics::default();
    let imported = resource.import(&mut diags, "3:4".to_owned()).await;
    assert!(imported.is_none());
    assert_eq!(diags.errors.len(), 1);

    let mut diags = Diagnostics::default();
    let (state, _) = resource
        .import(&mut diags, "3".to_owned())
        .await
        .unwrap();
    let Value::Value(state) = state else {
        panic!("import returned no state");
    };
    assert_eq!(state.id, string("3"));
}

#[tokio::test]
async fn unconfigured_provider_is_an_error() {
    let resource = ManagedResource::<ProjectResource>::new(ClientSlot::default());
    let mut diags = Diagnostics::default();
    let read = resource
        .read(
            &mut diags,
            Value::Value(project_state()),
            ValueEmpty::default(),
            ValueEmpty::default(),
        )
        .await;
    assert!(read.is_none());
    assert_eq!(diags.errors.len(), 1);
}
