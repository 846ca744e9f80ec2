use axum::http;
use headers::{Header, HeaderName, HeaderValue};

/// `Content-Disposition: attachment; filename=<name>`
///
/// The name is sent unquoted; decoding also accepts a quoted name and a
/// trailing `;`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttachmentDisposition(pub String);

impl Header for AttachmentDisposition {
    fn name() -> &'static HeaderName {
        &http::header::CONTENT_DISPOSITION
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        let value = value.to_str().map_err(|_| headers::Error::invalid())?;

        let mut params = value.split(';').map(str::trim);
        let disposition = params.next().unwrap_or_default();
        if !disposition.eq_ignore_ascii_case("attachment") {
            return Err(headers::Error::invalid());
        }

        params
            .find_map(|param| {
                let (key, name) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("filename")
                    .then(|| name.trim().trim_matches('"').to_string())
            })
            .map(AttachmentDisposition)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E>(&self, values: &mut E)
    where
        E: Extend<HeaderValue>,
    {
        match HeaderValue::from_str(&format!("attachment; filename={}", self.0)) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(e) => tracing::warn!(
                "Dropping Content-Disposition for file name {:?}: {}",
                self.0,
                e
            ),
        }
    }
}
