#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use recipe_api::{
    actions::users::create_user, jwt::TokenSigner, memory::MemoryStore, recover, routes,
    state::AppState, uploads::MediaStorage,
};
use serde_json::Value;
use tempfile::TempDir;
use warp::{
    http::{Response, StatusCode},
    hyper::body::Bytes,
    test::RequestBuilder,
    Filter,
};

pub const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
pub const PASSWORD: &str = "testpass123";

pub const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

/// Full service over an in-memory store and a throwaway media root.
pub struct TestApp {
    pub state: Arc<AppState<MemoryStore>>,
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let media_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            MemoryStore::new(),
            TokenSigner::new(SECRET, Duration::hours(1)).unwrap(),
            MediaStorage::new(media_dir.path(), "/media/"),
        );

        Self {
            state: Arc::new(state),
            media_dir,
        }
    }

    /// Registers a user directly in the store and returns a token for them.
    pub async fn login(&self, email: &str) -> String {
        let user = create_user(&self.state.store, Some(email), PASSWORD)
            .await
            .unwrap();

        self.state.signer.generate(&user).unwrap()
    }

    pub async fn send(&self, request: RequestBuilder) -> Response<Bytes> {
        let api = routes(self.state.clone()).recover(recover);

        request.reply(&api).await
    }

    pub async fn get(&self, path: &str, token: &str) -> Response<Bytes> {
        self.send(authorized(warp::test::request().method("GET").path(path), token))
            .await
    }

    pub async fn json(
        &self,
        method: &str,
        path: &str,
        token: &str,
        body: &Value,
    ) -> Response<Bytes> {
        self.send(authorized(
            warp::test::request().method(method).path(path).json(body),
            token,
        ))
        .await
    }
}

pub fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("authorization", format!("Bearer {token}"))
}

pub fn body(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

pub fn assert_status(response: &Response<Bytes>, status: StatusCode) {
    assert_eq!(
        response.status(),
        status,
        "unexpected body: {}",
        String::from_utf8_lossy(response.body())
    );
}

/// `multipart/form-data` body carrying a single file part.
pub fn multipart(field: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----recipe-api-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}
