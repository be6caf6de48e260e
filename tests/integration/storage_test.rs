//! Object storage tests against a mock Cloud Storage JSON API

use ai_relay_gateway::config::StorageConfig;
use ai_relay_gateway::storage::auth::{
    AssertionClaims, ServiceAccountKey, ServiceAccountTokenSource, StaticToken, TokenSource,
};
use ai_relay_gateway::storage::{GcsStore, ObjectStore};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{
    body_bytes, body_json, body_string_contains, header, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
const PUBLIC_KEY: &str = include_str!("../fixtures/service_account_pub.pem");

fn storage_config(server: &MockServer) -> StorageConfig {
    StorageConfig {
        bucket: Some("demo.appspot.com".to_string()),
        access_token: Some("emulator-token".to_string()),
        upload_base_url: format!("{}/upload/storage/v1", server.uri()),
        api_base_url: format!("{}/storage/v1", server.uri()),
        ..Default::default()
    }
}

fn service_account_json(token_uri: &str) -> String {
    json!({
        "type": "service_account",
        "project_id": "demo",
        "client_email": "relay@demo.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY,
        "token_uri": token_uri
    })
    .to_string()
}

#[tokio::test]
async fn test_upload_sends_media_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/demo.appspot.com/o"))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "audio/clip.mp3"))
        .and(header("authorization", "Bearer emulator-token"))
        .and(header("content-type", "audio/mpeg"))
        .and(body_bytes(b"mp3-bytes".to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "audio/clip.mp3" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = GcsStore::from_config(&storage_config(&server)).unwrap().unwrap();
    store
        .upload("audio/clip.mp3", b"mp3-bytes".to_vec(), "audio/mpeg")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_make_public_grants_all_users_read() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex("^/storage/v1/b/demo.appspot.com/o/[^/]+/acl$"))
        .and(header("authorization", "Bearer emulator-token"))
        .and(body_json(json!({ "entity": "allUsers", "role": "READER" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "entity": "allUsers" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = GcsStore::from_config(&storage_config(&server)).unwrap().unwrap();
    store.make_public("audio/clip.mp3").await.unwrap();
}

#[tokio::test]
async fn test_upload_failure_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/demo.appspot.com/o"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let store = GcsStore::from_config(&storage_config(&server)).unwrap().unwrap();
    let err = store
        .upload("audio/clip.mp3", b"mp3-bytes".to_vec(), "audio/mpeg")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Cloud Storage returned 403: forbidden");
}

#[tokio::test]
async fn test_public_url_keeps_folders() {
    let server = MockServer::start().await;
    let config = StorageConfig {
        public_base_url: "https://storage.googleapis.com".to_string(),
        ..storage_config(&server)
    };

    let store = GcsStore::new(
        reqwest::Client::new(),
        "demo.appspot.com".to_string(),
        &config,
        Arc::new(StaticToken("unused".to_string())),
    );

    assert_eq!(
        store.public_url("audio/clip.mp3"),
        "https://storage.googleapis.com/demo.appspot.com/audio/clip.mp3"
    );
}

#[test]
fn test_bucket_without_credentials_is_an_error() {
    let config = StorageConfig {
        bucket: Some("demo.appspot.com".to_string()),
        credentials_env: "AI_RELAY_TEST_UNSET_CREDENTIALS".to_string(),
        ..Default::default()
    };

    let err = GcsStore::from_config(&config).err().unwrap();
    assert_eq!(err.to_string(), "AI_RELAY_TEST_UNSET_CREDENTIALS is not configured");
}

#[test]
fn test_service_account_key_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), service_account_json("https://oauth2.example.com/token")).unwrap();

    let key = ServiceAccountKey::from_env_value(file.path().to_str().unwrap()).unwrap();

    assert_eq!(key.client_email, "relay@demo.iam.gserviceaccount.com");
    assert_eq!(key.token_uri.as_deref(), Some("https://oauth2.example.com/token"));
}

#[test]
fn test_assertion_is_signed_rs256() {
    let token_uri = "https://oauth2.example.com/token";
    let key = ServiceAccountKey::from_env_value(&service_account_json(token_uri)).unwrap();
    let source = ServiceAccountTokenSource::new(reqwest::Client::new(), key, None).unwrap();

    let now = chrono::Utc::now().timestamp();
    let assertion = source.assertion(now).unwrap();

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[token_uri]);
    let decoded = jsonwebtoken::decode::<AssertionClaims>(
        &assertion,
        &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap();

    assert_eq!(decoded.claims, source.claims(now));
    assert_eq!(decoded.claims.iss, "relay@demo.iam.gserviceaccount.com");
    assert!(decoded.claims.scope.contains("devstorage"));
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
}

#[tokio::test]
async fn test_token_exchange_is_cached() {
    let server = MockServer::start().await;
    let token_uri = format!("{}/token", server.uri());

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_env_value(&service_account_json(&token_uri)).unwrap();
    let source = ServiceAccountTokenSource::new(reqwest::Client::new(), key, None).unwrap();

    assert_eq!(source.access_token().await.unwrap(), "ya29.fresh");
    assert_eq!(source.access_token().await.unwrap(), "ya29.fresh");
}

#[tokio::test]
async fn test_token_uri_override() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/override/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.override",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_env_value(&service_account_json("https://unreachable.invalid/token"))
        .unwrap();
    let source = ServiceAccountTokenSource::new(
        reqwest::Client::new(),
        key,
        Some(format!("{}/override/token", server.uri())),
    )
    .unwrap();

    assert_eq!(source.access_token().await.unwrap(), "ya29.override");
}
