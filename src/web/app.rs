use super::{SharedState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

pub fn create_app(state: SharedState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::index))
        // Browser form upload
        .route(
            "/convert_from_html_form",
            get(handlers::upload_form).post(handlers::convert_from_html_form),
        )
        // Raw body upload, e.g. `curl -T image.png .../convert_from_curl/image.png`
        .route("/convert_from_curl/{filename}", put(handlers::convert_from_curl))
        // Relay test client for the raw upload endpoint
        .route("/test_curl", get(handlers::relay_form).post(handlers::relay))
        // One body limit for every route: an oversized Content-Length is
        // answered with 413 before any handler runs, and bodies without one
        // are cut off at the same size
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        // Add CORS layer for broader client compatibility
        .layer(CorsLayer::permissive())
        // Add tracing for HTTP requests and responses
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::test_prelude::{
        body_bytes, body_text, encode_sample, multipart_body, multipart_content_type, rgb_sample,
    };
    use crate::web::{AppState, AttachmentDisposition};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use headers::HeaderMapExt;
    use image::ImageFormat;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(config: ServiceConfig) -> Router {
        create_app(Arc::new(AppState::new(config).unwrap()))
    }

    fn app() -> Router {
        app_with(ServiceConfig::default())
    }

    fn put_raw(file_name: &str, data: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(format!("/convert_from_curl/{file_name}"))
            .header(header::CONTENT_LENGTH, data.len())
            .body(Body::from(data))
            .unwrap()
    }

    fn post_form(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/convert_from_html_form")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(multipart_body(field, file_name, data))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_redirects_to_form() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/convert_from_html_form"
        );
    }

    #[tokio::test]
    async fn test_get_upload_form() {
        let response = app()
            .oneshot(
                Request::get("/convert_from_html_form")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("multipart/form-data"));
        assert!(page.contains(r#"name="data_file""#));
    }

    #[tokio::test]
    async fn test_form_empty_upload_is_no_file_with_200() {
        let response = app()
            .oneshot(post_form("data_file", "", b""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No file"));
    }

    #[tokio::test]
    async fn test_form_missing_field_is_no_file_with_200() {
        let response = app()
            .oneshot(post_form("something_else", "a.png", b"abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No file"));
    }

    #[tokio::test]
    async fn test_form_unsupported_extension_is_html_with_200() {
        let response = app()
            .oneshot(post_form("data_file", "picture.bmp", b"BM..."))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("This file extension is not supported: picture.bmp"));
        assert!(page.contains("svg, png, jpg, jpeg, gif"));
    }

    #[tokio::test]
    async fn test_form_undecodable_image_is_html_with_200() {
        let response = app()
            .oneshot(post_form("data_file", "broken.png", b"not a png"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("could not be read as an image: broken.png"));
    }

    #[tokio::test]
    async fn test_form_converts_upload() {
        let png = encode_sample(&rgb_sample(10, 10), ImageFormat::Png);
        let response = app()
            .oneshot(post_form("data_file", "my photo.png", &png))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().typed_get::<AttachmentDisposition>(),
            Some(AttachmentDisposition("my_photo.png".to_string()))
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let img = image::load_from_memory(&body_bytes(response).await).unwrap();
        assert_eq!((img.width(), img.height()), (10, 10));
        assert_eq!(img.color().channel_count(), 1);
    }

    #[tokio::test]
    async fn test_put_unsupported_extension_is_415() {
        let response = app()
            .oneshot(put_raw("test.bmp", b"BM whatever".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let text = body_text(response).await;
        let listed = text.rsplit("Use extension: ").next().unwrap();
        assert_eq!(
            listed.split(", ").collect::<Vec<_>>(),
            vec!["svg", "png", "jpg", "jpeg", "gif"]
        );
    }

    #[tokio::test]
    async fn test_put_rejects_trailing_disallowed_extension() {
        let png = encode_sample(&rgb_sample(4, 4), ImageFormat::Png);
        let response = app().oneshot(put_raw("shell.png.exe", png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
    }

    #[tokio::test]
    async fn test_put_converts_png() {
        let png = encode_sample(&rgb_sample(10, 10), ImageFormat::Png);
        let response = app().oneshot(put_raw("test.png", png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=test.png"
        );

        let bytes = body_bytes(response).await;
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((img.width(), img.height()), (10, 10));
    }

    #[tokio::test]
    async fn test_put_keeps_detected_format_for_mislabeled_file() {
        let gif = encode_sample(&rgb_sample(5, 5), ImageFormat::Gif);
        let response = app().oneshot(put_raw("really.jpg", gif)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/gif");
        let bytes = body_bytes(response).await;
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Gif);
    }

    #[tokio::test]
    async fn test_put_without_content_length_is_400() {
        let png = encode_sample(&rgb_sample(4, 4), ImageFormat::Png);
        let request = Request::builder()
            .method("PUT")
            .uri("/convert_from_curl/test.png")
            .body(Body::from(png))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_put_zero_length_is_400() {
        let response = app()
            .oneshot(put_raw("test.png", Vec::new()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_put_corrupt_image_is_422() {
        let response = app()
            .oneshot(put_raw("test.png", b"\x89PNG but not really".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_put_oversized_body_is_rejected_before_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(ServiceConfig {
            max_body_bytes: 1024,
            persist_converted: true,
            upload_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        });

        // Garbage that would be a 422 if it ever reached the decoder.
        let response = app.oneshot(put_raw("big.png", vec![0u8; 4096])).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join("big.png").exists());
    }

    #[tokio::test]
    async fn test_form_oversized_body_is_413() {
        let app = app_with(ServiceConfig {
            max_body_bytes: 1024,
            ..ServiceConfig::default()
        });

        let mut request = post_form("data_file", "big.png", &[0u8; 4096]);
        request
            .headers_mut()
            .insert(header::CONTENT_LENGTH, header::HeaderValue::from(4096 + 256));
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_get_relay_form() {
        let response = app()
            .oneshot(Request::get("/test_curl").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains(r#"name="source_file_path""#));
        assert!(page.contains(r#"name="output_file_name""#));
    }

    async fn spawn_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = app();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });
        addr
    }

    fn relay_request(host: &str, form: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/test_curl")
            .header(header::HOST, host)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap()
    }

    #[tokio::test]
    async fn test_relay_round_trip_through_host() {
        let addr = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        std::fs::write(
            dir.path().join("source.jpg"),
            encode_sample(&rgb_sample(10, 10), ImageFormat::Jpeg),
        )
        .unwrap();

        let form = format!(
            "source_file_path={dir_str}&source_file_name=source.jpg\
             &output_file_path={dir_str}&output_file_name=edited.jpg"
        );
        let response = app()
            .oneshot(relay_request(&addr.to_string(), form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Response code: <strong>200</strong>"));
        assert!(page.contains("edited.jpg"));

        let written = std::fs::read(dir.path().join("edited.jpg")).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_relay_reports_upstream_status() {
        let addr = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("source.bmp"), b"BM").unwrap();

        let form = format!(
            "source_file_path={dir_str}&source_file_name=source.bmp\
             &output_file_path={dir_str}&output_file_name=edited.bmp"
        );
        let response = app()
            .oneshot(relay_request(&addr.to_string(), form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "Test failed. Response status code:415."
        );
    }

    #[tokio::test]
    async fn test_relay_unreachable_upstream_is_502() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();

        let app = app_with(ServiceConfig {
            relay_base_url: Some(format!("http://{addr}")),
            ..ServiceConfig::default()
        });
        let form = format!(
            "source_file_path={dir_str}&source_file_name=a.png\
             &output_file_path={dir_str}&output_file_name=b.png"
        );
        let response = app
            .oneshot(relay_request("ignored.invalid", form))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.starts_with("Test failed."));
    }
}
