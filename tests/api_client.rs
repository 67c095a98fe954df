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

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_dbtcloud::api::{DbtCloudClient, Project, STATE_DELETED};
use terraform_provider_dbtcloud::config::Settings;

const ACCOUNT_ID: i64 = 12;

fn client(server: &MockServer) -> DbtCloudClient {
    DbtCloudClient::new(&Settings {
        account_id: ACCOUNT_ID,
        token: "test-token".to_owned(),
        host_url: format!("{}/api", server.uri()),
    })
    .unwrap()
}

fn data(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": {"code": 200, "is_success": true},
        "data": value,
    }))
}

#[tokio::test]
async fn get_project_sends_token_and_unwraps_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/projects/3/"))
        .and(header("authorization", "Token test-token"))
        .respond_with(data(json!({
            "id": 3,
            "account_id": ACCOUNT_ID,
            "name": "analytics",
            "description": null,
            "dbt_project_subdirectory": "dbt",
            "connection_id": 5,
            "repository_id": null,
            "state": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = client(&server).get_project(3).await.unwrap();
    assert_eq!(project.id, Some(3));
    assert_eq!(project.name, "analytics");
    assert_eq!(project.dbt_project_subdirectory.as_deref(), Some("dbt"));
    assert_eq!(project.connection_id, Some(5));
}

#[tokio::test]
async fn create_project_fills_the_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v3/accounts/12/projects/"))
        .and(body_partial_json(json!({"account_id": ACCOUNT_ID, "name": "analytics"})))
        .respond_with(data(json!({
            "id": 9,
            "account_id": ACCOUNT_ID,
            "name": "analytics",
            "state": 1,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create_project(&Project {
            name: "analytics".to_owned(),
            state: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, Some(9));
}

#[tokio::test]
async fn missing_objects_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/projects/404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": {"code": 404, "is_success": false, "user_message": "resource-not-found"},
            "data": null,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/projects/500/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.get_project(404).await.unwrap_err().is_not_found());
    assert!(!client.get_project(500).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn soft_deleted_objects_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/projects/3/"))
        .respond_with(data(json!({
            "id": 3,
            "account_id": ACCOUNT_ID,
            "name": "analytics",
            "state": STATE_DELETED,
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_project(3).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn deleting_a_group_flags_it_and_keeps_its_fields() {
    let server = MockServer::start().await;
    let group = json!({
        "id": 4,
        "account_id": ACCOUNT_ID,
        "name": "analysts",
        "assign_by_default": true,
        "sso_mapping_groups": ["okta-analysts"],
        "group_permissions": [],
        "state": 1,
    });
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/groups/4/"))
        .respond_with(data(group))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v3/accounts/12/groups/4/"))
        .and(body_partial_json(json!({
            "state": STATE_DELETED,
            "name": "analysts",
            "assign_by_default": true,
            "sso_mapping_groups": ["okta-analysts"],
        })))
        .respond_with(data(json!({
            "id": 4,
            "account_id": ACCOUNT_ID,
            "name": "analysts",
            "assign_by_default": true,
            "sso_mapping_groups": ["okta-analysts"],
            "state": STATE_DELETED,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = client(&server).delete_group(4).await.unwrap();
    assert_eq!(deleted.state, STATE_DELETED);
}

#[tokio::test]
async fn service_token_is_read_with_its_permissions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/service-tokens/21/"))
        .respond_with(data(json!({
            "id": 21,
            "account_id": ACCOUNT_ID,
            "name": "ci",
            "uid": "Yx2",
            "state": 1,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/accounts/12/service-tokens/21/permissions/"))
        .respond_with(data(json!([
            {"permission_set": "job_admin", "project_id": 3, "all_projects": false},
        ])))
        .mount(&server)
        .await;

    let token = client(&server).get_service_token(21).await.unwrap();
    assert_eq!(token.uid, "Yx2");
    assert_eq!(token.token_string, None);
    assert_eq!(token.permissions.len(), 1);
    assert_eq!(token.permissions[0].project_id, Some(3));
}

#[tokio::test]
async fn environment_variables_are_listed_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/api/v3/accounts/12/projects/3/environment-variables/environment/",
        ))
        .respond_with(data(json!({
            "DBT_TARGET": {
                "project": {"id": 1, "value": "dev"},
                "Production": {"id": 2, "value": "prod"},
            },
            "DBT_THREADS": {
                "project": {"id": 3, "value": "4"},
            },
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let variables = client.list_environment_variables(3).await.unwrap();
    assert_eq!(variables.len(), 2);

    let target = client.get_environment_variable(3, "DBT_TARGET").await.unwrap();
    assert_eq!(target.values["Production"].value, "prod");
    assert_eq!(target.values["project"].id, Some(1));

    let missing = client.get_environment_variable(3, "DBT_MISSING").await;
    assert!(missing.unwrap_err().is_not_found());
}
