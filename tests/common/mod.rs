#![allow(dead_code)]

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use sunrise_store::api::create_api_router;
use sunrise_store::config::Config;
use sunrise_store::entities::primary_setup;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Muzion15";

/// A server on an ephemeral port over its own SQLite file.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub token: String,
    pub config: Arc<Config>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> TestApp {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config {
            database_url: format!("sqlite://{}?mode=rwc", dir.path().join("store.db").display()),
            bind_addr: "127.0.0.1:0".to_owned(),
            secret: "test-secret".to_owned(),
            admin_username: ADMIN_USERNAME.to_owned(),
            admin_password: Some(ADMIN_PASSWORD.to_owned()),
            media_root: dir.path().join("uploads"),
            file_size_limit: 1024 * 1024,
            db_max_connections: 1,
        };

        let db = sunrise_store::connect_with(&config)
            .await
            .expect("Failed to connect to database");
        primary_setup(&db, &config)
            .await
            .expect("Failed to seed administrator");

        let listener = tokio::net::TcpListener::bind(&config.bind_addr)
            .await
            .expect("Failed to bind");
        let address = format!("http://{}", listener.local_addr().expect("No local address"));

        let config = Arc::new(config);
        let app = create_api_router(Arc::new(db), config.clone());
        tokio::spawn(async move {
            sunrise_store::serve(listener, app).await.expect("Server failed");
        });

        let client = Client::new();
        let token = login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await;

        TestApp {
            address,
            client,
            token,
            config,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn admin_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn admin_post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn admin_patch(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn admin_delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn create_category(&self, name: &str, parent_id: Option<i64>) -> Value {
        let response = self
            .admin_post(
                "/admin/category",
                &json!({ "name": name, "parent_id": parent_id }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "creating category {name}");
        body(response).await
    }

    pub async fn create_product(&self, body_json: Value) -> Value {
        let response = self.admin_post("/admin/product", &body_json).await;
        assert_eq!(response.status(), StatusCode::CREATED, "creating {body_json}");
        body(response).await
    }

    /// Creates a user through the admin API and returns its id.
    pub async fn create_user(&self, username: &str) -> i64 {
        let response = self
            .admin_post(
                "/admin/user",
                &json!({ "username": username, "password": "secret-pass" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body(response).await["id"].as_i64().expect("No user id")
    }
}

pub async fn login(client: &Client, address: &str, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{address}/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    body(response).await["token"]
        .as_str()
        .expect("No token in response")
        .to_owned()
}

pub async fn body(response: Response) -> Value {
    response
        .json::<Value>()
        .await
        .expect("Failed to parse response JSON")
}
