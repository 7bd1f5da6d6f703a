#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use city_gallery::{
    entities::{city::{City, CityRegistration}, media::MediaCreatedResponse},
    db::postgres::{create_pool, run_migrations},
    repositories::{any::AnyGalleryRepo, memory::InMemoryGalleryRepo, sqlx_repo::SqlxGalleryRepo},
    routes::configure_routes,
    settings::{AppConfig, StorageBackend},
    AppState,
};
use reqwest::{multipart, Client, Response};
use serde_json::json;
use std::{net::TcpListener, sync::Arc, time::Duration};
use tempfile::TempDir;

pub struct TestApp {
    pub state: Arc<AppState>,
    pub address: String,
    pub client: Client,
    pub config: AppConfig,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let media_dir = TempDir::new().expect("Failed to create media dir");
        let config = test_config(&media_dir);

        Self::launch(config, InMemoryGalleryRepo::new().into(), media_dir).await
    }

    /// Runs against the database in `APP_DATABASE_URL`, emptied first.
    /// `None` when no database is configured.
    pub async fn spawn_postgres() -> Option<Self> {
        dotenv::dotenv().ok();
        let database_url = std::env::var("APP_DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())?;

        let media_dir = TempDir::new().expect("Failed to create media dir");
        let config = AppConfig {
            storage_backend: StorageBackend::Postgres,
            database_url,
            db_max_connections: 5,
            ..test_config(&media_dir)
        };

        let db_pool = create_pool(&config.database_url, config.db_max_connections)
            .await
            .expect("Failed to create test DB pool");

        run_migrations(&db_pool).await.expect("Failed to run migrations");

        sqlx::query("TRUNCATE TABLE media, cities RESTART IDENTITY CASCADE")
            .execute(&db_pool)
            .await
            .expect("Failed to truncate tables");

        Some(Self::launch(config, SqlxGalleryRepo::new(db_pool).into(), media_dir).await)
    }

    async fn launch(config: AppConfig, repo: AnyGalleryRepo, media_dir: TempDir) -> Self {
        let state = Arc::new(AppState::new(&config, repo));
        let upload_rules = state.upload_rules().clone();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state_clone = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::from(state_clone.clone()))
                .wrap(NormalizePath::trim())
                .configure(|cfg| configure_routes(cfg, &upload_rules))
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/api/v1/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            state,
            address,
            client,
            config,
            media_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.media_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn test_config(media_dir: &TempDir) -> AppConfig {
    AppConfig {
        media_root: media_dir.path().to_string_lossy().into_owned(),
        ..AppConfig::for_testing()
    }
}

#[async_trait]
pub trait GalleryTestHelpers: Send + Sync {
    async fn register_city(&self, name: &str, state: &str, country: &str) -> Response;
    async fn create_city(&self, name: &str) -> City;
    async fn upload(&self, city_id: i64, title: &str, file_name: &str, bytes: Vec<u8>) -> Response;
    async fn create_photo(&self, city_id: i64, title: &str) -> MediaCreatedResponse;
    async fn search(&self, keyword: Option<&str>) -> serde_json::Value;
}

#[async_trait]
impl GalleryTestHelpers for TestApp {
    async fn register_city(&self, name: &str, state: &str, country: &str) -> Response {
        self.client
            .post(self.url("/cities"))
            .json(&json!({ "name": name, "state": state, "country": country }))
            .send()
            .await
            .expect("Failed to register city")
    }

    async fn create_city(&self, name: &str) -> City {
        let response = self.register_city(name, "Norte", "Portugal").await;
        assert!(response.status().is_success(), "city registration failed");

        let registration: CityRegistration = response.json().await.expect("Invalid registration body");
        registration.city
    }

    async fn upload(&self, city_id: i64, title: &str, file_name: &str, bytes: Vec<u8>) -> Response {
        let form = multipart::Form::new()
            .text("title", title.to_string())
            .text("description", format!("{title} seen from the river"))
            .text("city_id", city_id.to_string())
            .part("file", multipart::Part::bytes(bytes).file_name(file_name.to_string()));

        self.client
            .post(self.url("/media"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to upload media")
    }

    async fn create_photo(&self, city_id: i64, title: &str) -> MediaCreatedResponse {
        let response = self.upload(city_id, title, "photo.jpg", b"jpeg bytes".to_vec()).await;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            panic!("Upload failed: ({}): {}", status, body);
        }

        response.json().await.expect("Invalid upload body")
    }

    async fn search(&self, keyword: Option<&str>) -> serde_json::Value {
        let mut request = self.client.get(self.url("/media"));
        if let Some(q) = keyword {
            request = request.query(&[("q", q)]);
        }

        request
            .send()
            .await
            .expect("Failed to search")
            .json()
            .await
            .expect("Invalid search body")
    }
}
