//! End-to-end tests for the favorites endpoints

mod common;

use common::{TestClient, TestServer, MALFORMED_ID, UNKNOWN_ID};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_favorites_start_empty() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.get_favorites().await;
    assert_eq!(response.status(), StatusCode::OK);
    let favs: Value = response.json().await.unwrap();
    assert_eq!(favs["artists"].as_array().unwrap().len(), 0);
    assert_eq!(favs["albums"].as_array().unwrap().len(), 0);
    assert_eq!(favs["tracks"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_add_favorite_membership_rules() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.add_favorite("track", MALFORMED_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.add_favorite("track", UNKNOWN_ID).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let track = TestClient::created_id(client.create_track("T", 10, None, None).await).await;
    let response = client.add_favorite("track", &track).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains(&track));

    let response = client.add_favorite("track", &track).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Kinds are separate: a track id is not an album
    let response = client.add_favorite("album", &track).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_favorite_kind_is_a_bad_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let response = client.add_favorite("playlist", UNKNOWN_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.remove_favorite("playlist", UNKNOWN_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_favorite() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let album = TestClient::created_id(client.create_album("M", 1999, None).await).await;

    let response = client.remove_favorite("album", &album).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    client.add_favorite("album", &album).await;
    let response = client.remove_favorite("album", &album).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.remove_favorite("album", &album).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.remove_favorite("album", MALFORMED_ID).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The album itself is untouched
    let response = client.get_record("album", &album).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_favorites_are_resolved_in_insertion_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let a1 = TestClient::created_id(client.create_artist("First", false).await).await;
    let a2 = TestClient::created_id(client.create_artist("Second", true).await).await;
    let track = TestClient::created_id(client.create_track("T", 1, Some(&a1), None).await).await;

    client.add_favorite("artist", &a2).await;
    client.add_favorite("artist", &a1).await;
    client.add_favorite("track", &track).await;

    let favs: Value = client.get_favorites().await.json().await.unwrap();
    let artists: Vec<&str> = favs["artists"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(artists, vec!["Second", "First"]);
    assert_eq!(favs["tracks"][0]["id"], track.as_str());
    assert_eq!(favs["tracks"][0]["artistId"], a1.as_str());
    assert_eq!(favs["albums"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_sqlite_favorites_follow_the_same_rules() {
    let server = TestServer::spawn_sqlite().await;
    let client = TestClient::authenticated(server.base_url.clone()).await;

    let artist = TestClient::created_id(client.create_artist("X", false).await).await;
    assert_eq!(
        client.add_favorite("artist", &artist).await.status(),
        StatusCode::CREATED
    );
    assert_eq!(
        client.add_favorite("artist", &artist).await.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        client.add_favorite("artist", UNKNOWN_ID).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let favs: Value = client.get_favorites().await.json().await.unwrap();
    assert_eq!(favs["artists"][0]["id"], artist.as_str());
}
