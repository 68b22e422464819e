//! End-to-end tests for the library endpoints.

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_add_and_list_movies() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .add_movie(&json!({
            "movieId": "tt0133093",
            "title": "The Matrix",
            "year": 1999,
            "rating": "8.7",
            "image": "https://img.example/matrix.jpg"
        }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["movieId"], json!("tt0133093"));
    assert_eq!(body["data"]["title"], json!("The Matrix"));
    assert_eq!(body["data"]["year"], json!(1999));
    assert_eq!(body["data"]["type"], json!("movie"));
    assert_eq!(body["data"]["hasAudioReview"], json!(false));
    assert!(body["data"]["createdAt"].as_i64().unwrap() > 0);

    let response = client.add_movie(&json!({
        "movieId": "tt0111161",
        "title": "The Shawshank Redemption"
    }))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get_library().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Newest first
    assert_eq!(entries[0]["movieId"], json!("tt0111161"));
    assert_eq!(entries[1]["movieId"], json!("tt0133093"));
}

#[tokio::test]
async fn test_add_duplicate_movie_fails() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let movie = json!({"movieId": "tt001", "title": "Movie"});
    let response = client.add_movie(&movie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.add_movie(&movie).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("tt001"));

    // Library still holds a single entry
    let body: Value = client.get_library().await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_movie_without_required_fields_fails() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.add_movie(&json!({"movieId": "tt001", "title": ""})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.add_movie(&json!({"movieId": "  ", "title": "Movie"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_movie() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    client
        .add_movie(&json!({"movieId": "tt001", "title": "Movie"}))
        .await;

    let response = client.remove_movie("tt001").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("removed"));

    let body: Value = client.get_library().await.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    // Removing again fails
    let response = client.remove_movie("tt001").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_movie() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    client
        .add_movie(&json!({"movieId": "tt001", "title": "Movie"}))
        .await;

    let body: Value = client.check_movie("tt001").await.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["isInLibrary"], json!(true));

    let body: Value = client.check_movie("tt999").await.json().await.unwrap();
    assert_eq!(body["isInLibrary"], json!(false));
}

#[tokio::test]
async fn test_readd_after_remove() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let movie = json!({"movieId": "tt001", "title": "Movie"});
    assert_eq!(client.add_movie(&movie).await.status(), StatusCode::OK);
    assert_eq!(client.remove_movie("tt001").await.status(), StatusCode::OK);
    assert_eq!(client.add_movie(&movie).await.status(), StatusCode::OK);

    let body: Value = client.check_movie("tt001").await.json().await.unwrap();
    assert_eq!(body["isInLibrary"], json!(true));
}
