// Handlers for the three request shapes: multipart form upload, raw PUT and
// the relay test client.

use super::{
    SharedState,
    error::ApiError,
    headers::AttachmentDisposition,
    models::{RelayForm, UPLOAD_FIELD},
    pages,
};
use crate::conversion::{ConversionError, ConversionResult, ConversionService, filename};
use crate::relay::{RelayError, RelayJob};
use axum::{
    Form,
    body::{self, Bytes},
    extract::{Multipart, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::TypedHeader;
use headers::{ContentLength, HeaderMapExt};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

// --- GET / ---
pub async fn index() -> Redirect {
    Redirect::to("/convert_from_html_form")
}

// --- GET /convert_from_html_form ---
pub async fn upload_form() -> Html<&'static str> {
    Html(pages::UPLOAD_FORM)
}

// --- POST /convert_from_html_form ---
// User-facing problems (no file, bad extension, undecodable image) are
// answered with a 200 HTML page rather than an error status.
pub async fn convert_from_html_form(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    let mut upload: Option<(Bytes, String)> = None;
    let mut ignored_fields = 0;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            if upload.is_some() {
                warn!(
                    "Multiple '{}' fields found in form upload, using the last one",
                    UPLOAD_FIELD
                );
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            upload = Some((data, file_name));
        } else {
            debug!(
                "Ignoring multipart field: {}",
                field.name().unwrap_or("unnamed")
            );
            ignored_fields += 1;
        }
    }

    if ignored_fields > 0 {
        debug!("Ignored {} non-file fields in form upload", ignored_fields);
    }

    let Some((data, file_name)) = upload else {
        info!("Form upload without a file: request_id={}", request_id);
        return Ok(Html(pages::NO_FILE).into_response());
    };

    info!(
        "Form upload: file_name={:?}, size={}, request_id={}",
        file_name,
        data.len(),
        request_id
    );

    let safe_name = filename::normalize(&file_name);

    match convert_blocking(&state.converter, data, file_name, request_id).await? {
        Ok(result) => Ok(attachment(result)),
        Err(ConversionError::NoFile) => Ok(Html(pages::NO_FILE).into_response()),
        Err(ConversionError::UnsupportedExtension { file_name, allowed }) => {
            Ok(Html(pages::unsupported_extension(&file_name, &allowed)).into_response())
        }
        Err(ConversionError::DecodeFailed(reason)) => {
            debug!("Form upload decode failed: {}", reason);
            Ok(Html(pages::decode_failed(&safe_name)).into_response())
        }
        Err(other) => Err(other.into()),
    }
}

// --- PUT /convert_from_curl/{filename} ---
// Validates the name before touching the body, then answers with proper
// status codes: 415 for the extension, 400 for a missing length, 422 for
// undecodable data.
pub async fn convert_from_curl(
    State(state): State<SharedState>,
    Path(file_name): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    info!(
        "Raw upload: file_name={:?}, request_id={}",
        file_name, request_id
    );

    state.converter.check_file_name(&file_name)?;

    let declared_length = request
        .headers()
        .typed_get::<ContentLength>()
        .map(|ContentLength(length)| length)
        .unwrap_or(0);
    if declared_length == 0 {
        return Err(ConversionError::EmptyOrMissingLength.into());
    }

    let data = body::to_bytes(request.into_body(), state.config.max_body_bytes)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read request body: {}", e)))?;

    debug!(
        "Raw upload body read: declared={}, actual={}, request_id={}",
        declared_length,
        data.len(),
        request_id
    );

    let result = convert_blocking(&state.converter, data, file_name, request_id).await??;
    Ok(attachment(result))
}

// --- GET /test_curl ---
pub async fn relay_form(State(state): State<SharedState>) -> Html<String> {
    Html(pages::relay_form(&state.config.allowed_extensions))
}

// --- POST /test_curl ---
// Sends the named local file through `PUT /convert_from_curl` over HTTP and
// stores the result. A non-200 answer is reported as plain text with status
// 200; failing to get an answer at all is a 502/504.
pub async fn relay(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<RelayForm>,
) -> Result<Response, ApiError> {
    let base_url = match &state.config.relay_base_url {
        Some(base_url) => base_url.clone(),
        None => {
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    ApiError::BadRequest("Missing Host header to relay to.".to_string())
                })?;
            format!("http://{}", host)
        }
    };

    let job = RelayJob::new(
        &form.source_file_path,
        &form.source_file_name,
        &form.output_file_path,
        &form.output_file_name,
    );
    debug!("Relay job: {:?}, base_url={}", job, base_url);

    match state.relay.relay(&base_url, &job).await {
        Ok(outcome) => Ok(Html(pages::relay_success(&outcome)).into_response()),
        Err(RelayError::UpstreamStatus(code)) => Ok((
            StatusCode::OK,
            format!("Test failed. Response status code:{}.", code),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

// Decode and encode are CPU bound; keep them off the async workers.
async fn convert_blocking(
    converter: &ConversionService,
    data: Bytes,
    file_name: String,
    request_id: Uuid,
) -> Result<Result<ConversionResult, ConversionError>, ApiError> {
    let converter = converter.clone();
    tokio::task::spawn_blocking(move || convert_in_span(&converter, &data, &file_name, request_id))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Image conversion task failed: {}", e)))
}

// Pipeline log lines carry the request id through the span.
fn convert_in_span(
    converter: &ConversionService,
    data: &[u8],
    file_name: &str,
    request_id: Uuid,
) -> Result<ConversionResult, ConversionError> {
    info_span!("convert", %request_id).in_scope(|| converter.convert(data, file_name))
}

fn attachment(result: ConversionResult) -> Response {
    (
        [(header::CONTENT_TYPE, result.format.to_mime_type())],
        TypedHeader(AttachmentDisposition(result.file_name)),
        result.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::test_prelude::{encode_sample, rgb_sample};
    use image::ImageFormat;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_conversion_logs_carry_request_id() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(Level::INFO)
            .finish();

        let converter = ConversionService::new(Arc::new(ServiceConfig::default()));
        let png = encode_sample(&rgb_sample(4, 4), ImageFormat::Png);
        let request_id = Uuid::new_v4();

        tracing::subscriber::with_default(subscriber, || {
            convert_in_span(&converter, &png, "a.png", request_id).unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("Converted a.png to grayscale"))
            .unwrap();
        assert!(line.contains(&format!("request_id={request_id}")), "{line}");
    }
}
