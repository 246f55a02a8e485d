//! HTTP side of the Storage Relay: `POST /api/upload`.

use crate::{
    config::{Config, StorageConfig},
    error::{Result, StudioError},
    logger,
    models::{ErrorResponse, QualityTier, UploadResponse},
    storage::UploadService,
};
use actix_web::{
    http::{header, Method, StatusCode},
    middleware::DefaultHeaders,
    web, App, HttpRequest, HttpResponse, HttpServer,
};
use reqwest::Client;
use serde_json::Value;

pub const UPLOAD_PATH: &str = "/api/upload";
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

const INVALID_IMAGE: &str = "Missing or invalid image (base64 data URL)";

/// Upload backend as seen by request handlers. A misconfigured relay still
/// serves requests and reports the problem on each one.
#[derive(Clone)]
pub enum UploadState {
    Ready(UploadService),
    Misconfigured(String),
}

impl UploadState {
    pub fn from_config(config: &StorageConfig, client: Client) -> Self {
        match UploadService::from_config(config, client) {
            Ok(service) => UploadState::Ready(service),
            Err(e) => {
                log::error!("❌ Upload relay is not configured: {}", e);
                UploadState::Misconfigured(e.user_message(QualityTier::Fast))
            }
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(message))
}

/// Pulls a non-empty `image` string out of the request body.
fn image_from_body(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("image")
        .and_then(Value::as_str)
        .filter(|image| !image.is_empty())
        .map(str::to_string)
}

async fn upload(state: web::Data<UploadState>, body: web::Bytes) -> HttpResponse {
    let service = match state.get_ref() {
        UploadState::Ready(service) => service,
        UploadState::Misconfigured(message) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
    };

    let Some(image) = image_from_body(&body) else {
        return error_response(StatusCode::BAD_REQUEST, INVALID_IMAGE);
    };

    match service.store(&image).await {
        Ok(url) => HttpResponse::Ok().json(UploadResponse { url }),
        Err(StudioError::ValidationError(message)) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(e) => {
            log::error!("❌ Upload error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                e.user_message(QualityTier::Fast),
            )
        }
    }
}

async fn other_method(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::NoContent()
            .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
            .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
            .finish();
    }
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Registers the upload route. Needs `web::Data<UploadState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES)).service(
        web::resource(UPLOAD_PATH)
            .route(web::post().to(upload))
            .default_service(web::route().to(other_method)),
    );
}

fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
}

/// Runs the relay as a standalone server. Incomplete storage configuration is
/// an error here rather than a per-request 500.
pub async fn run(config: &Config) -> Result<()> {
    let missing = config.storage.missing_keys();
    if !missing.is_empty() {
        return Err(StudioError::ConfigError(format!(
            "Missing {}",
            missing.join(", ")
        )));
    }

    let service = UploadService::from_config(&config.storage, Client::new())?;
    let state = web::Data::new(UploadState::Ready(service));
    let port = config.port();

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), port);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))
    .map_err(|e| StudioError::EnvironmentError(format!("Failed to bind port {}: {}", port, e)))?
    .run()
    .await
    .map_err(|e| StudioError::EnvironmentError(format!("Upload relay stopped: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::upload::tests::RecordingStore;
    use actix_web::test;
    use serde_json::json;
    use std::sync::Arc;

    fn ready_state() -> web::Data<UploadState> {
        web::Data::new(UploadState::Ready(UploadService::new(Arc::new(
            RecordingStore::default(),
        ))))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors_headers())
                    .app_data($state)
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn stores_image_and_returns_public_url() {
        let app = app!(ready_state());
        let req = test::TestRequest::post()
            .uri(UPLOAD_PATH)
            .set_json(json!({ "image": "data:image/png;base64,aGVsbG8=" }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );

        let body: UploadResponse = test::read_body_json(resp).await;
        assert!(body
            .url
            .starts_with("https://storage.googleapis.com/studio-bucket/generated/"));
        assert!(body.url.ends_with(".png"));
    }

    #[actix_web::test]
    async fn missing_or_non_string_image_is_bad_request() {
        let app = app!(ready_state());

        for body in [json!({}), json!({ "image": 42 }), json!({ "image": "" })] {
            let req = test::TestRequest::post()
                .uri(UPLOAD_PATH)
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: ErrorResponse = test::read_body_json(resp).await;
            assert_eq!(body.error, INVALID_IMAGE);
        }

        let req = test::TestRequest::post()
            .uri(UPLOAD_PATH)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn other_methods_are_rejected() {
        let app = app!(ready_state());

        let req = test::TestRequest::get().uri(UPLOAD_PATH).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Method not allowed");

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri(UPLOAD_PATH)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn misconfiguration_is_reported_per_request() {
        let state = web::Data::new(UploadState::from_config(
            &StorageConfig::new().with_bucket("studio-bucket"),
            Client::new(),
        ));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri(UPLOAD_PATH)
            .set_json(json!({ "image": "data:image/png;base64,aGVsbG8=" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("GOOGLE_CLOUD_PROJECT_ID"));
        assert!(body.error.contains("GOOGLE_CLOUD_KEY_JSON"));
        assert!(!body.error.contains("GOOGLE_CLOUD_BUCKET_NAME"));
    }

    #[actix_web::test]
    async fn invalid_key_json_is_reported() {
        let state = web::Data::new(UploadState::from_config(
            &StorageConfig::new()
                .with_project("p")
                .with_bucket("b")
                .with_key_json("{oops"),
            Client::new(),
        ));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri(UPLOAD_PATH)
            .set_json(json!({ "image": "aGVsbG8=" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid GOOGLE_CLOUD_KEY_JSON");
    }

    #[tokio::test]
    async fn standalone_run_refuses_incomplete_config() {
        let config = Config::new().with_storage(StorageConfig::new().with_project("p"));
        let err = run(&config).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing GOOGLE_CLOUD_BUCKET_NAME, GOOGLE_CLOUD_KEY_JSON"
        );
    }
}
