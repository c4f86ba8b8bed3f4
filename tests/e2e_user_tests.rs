//! End-to-end tests for the user endpoints

mod common;

use common::{TestClient, TestServer, MALFORMED_ID, TEST_USER, UNKNOWN_ID};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_create_and_list_users() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_user("bob", "secret").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bob: Value = response.json().await.unwrap();
    assert_eq!(bob["login"], "bob");
    assert_eq!(bob["version"], 1);
    assert_eq!(bob["createdAt"], bob["updatedAt"]);
    assert!(bob.get("password").is_none());
    assert!(bob.get("passwordHash").is_none());

    let users: Vec<Value> = client.list_users().await.json().await.unwrap();
    let logins: Vec<&str> = users.iter().map(|u| u["login"].as_str().unwrap()).collect();
    assert_eq!(logins, vec![TEST_USER, "bob"]);

    let fetched: Value = client
        .get_user(bob["id"].as_str().unwrap())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, bob);
}

#[tokio::test]
async fn test_create_user_validation() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.create_user(TEST_USER, "whatever").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.create_user("", "whatever").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.create_user("carol", "  ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_user_errors() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    assert_eq!(
        client.get_user(MALFORMED_ID).await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.get_user(UNKNOWN_ID).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.delete_user(UNKNOWN_ID).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_update_password() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let id = TestClient::created_id(client.create_user("dave", "first").await).await;

    let response = client.update_password(&id, "wrong", "second").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.update_password(&id, "first", "second").await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["version"], 2);
    assert!(updated["updatedAt"].as_i64().unwrap() >= updated["createdAt"].as_i64().unwrap());

    let anonymous = TestClient::new(server.base_url.clone());
    assert_eq!(
        anonymous.login("dave", "first").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        anonymous.login("dave", "second").await.status(),
        StatusCode::OK
    );

    let response = client.update_password(UNKNOWN_ID, "a", "b").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user() {
    let server = TestServer::spawn_sqlite().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let id = TestClient::created_id(client.create_user("erin", "pw").await).await;

    let response = client.delete_user(&id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(client.get_user(&id).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        client.delete_user(MALFORMED_ID).await.status(),
        StatusCode::BAD_REQUEST
    );
}
