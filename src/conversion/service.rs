use image::ImageFormat;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ConversionError, codec, filename, grayscale};
use crate::config::ServiceConfig;

/// Output of a successful conversion, handed back to the transport layer.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    /// Sanitized client filename, used for the download name.
    pub file_name: String,
    /// Format detected from the input bytes; the output is written in it.
    pub format: ImageFormat,
}

/// Runs one request through validate -> decode -> grayscale -> encode.
///
/// Holds only the shared read-only configuration, so cloning is cheap and
/// every call works on its own buffers.
#[derive(Debug, Clone)]
pub struct ConversionService {
    config: Arc<ServiceConfig>,
}

impl ConversionService {
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }

    /// Sanitizes `client_filename` and checks it against the allow-list.
    pub fn check_file_name(&self, client_filename: &str) -> Result<String, ConversionError> {
        let file_name = filename::normalize(client_filename);
        if !filename::has_allowed_extension(&file_name, &self.config.allowed_extensions) {
            debug!(
                "Rejected file name {:?} (sanitized: {:?})",
                client_filename, file_name
            );
            return Err(ConversionError::UnsupportedExtension {
                file_name,
                allowed: self.config.allowed_extensions,
            });
        }
        Ok(file_name)
    }

    pub fn convert(
        &self,
        bytes: &[u8],
        client_filename: &str,
    ) -> Result<ConversionResult, ConversionError> {
        if bytes.is_empty() {
            return Err(ConversionError::NoFile);
        }

        let file_name = self.check_file_name(client_filename)?;

        let document = codec::decode(bytes)?;
        let (width, height, format) = (document.width(), document.height(), document.format);
        if filename::extension(&file_name)
            .and_then(ImageFormat::from_extension)
            .is_some_and(|named| named != format)
        {
            info!(
                "File {} is named as another format; keeping detected format {:?}",
                file_name, format
            );
        }

        let gray = grayscale::apply(document);
        let bytes = codec::encode(&gray)?;

        info!(
            "Converted {} to grayscale: {}x{} {:?}, {} bytes",
            file_name,
            width,
            height,
            format,
            bytes.len()
        );

        let result = ConversionResult {
            bytes,
            file_name,
            format,
        };

        if self.config.persist_converted {
            self.persist(&result);
        }

        Ok(result)
    }

    // Failures are logged only; the conversion response does not depend on them.
    fn persist(&self, result: &ConversionResult) {
        let dir = &self.config.upload_dir;
        let path = dir.join(&result.file_name);

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Failed to create upload directory {}: {}", dir.display(), e);
            return;
        }

        match std::fs::write(&path, &result.bytes) {
            Ok(()) => debug!("Saved converted image to {}", path.display()),
            Err(e) => warn!("Failed to save converted image to {}: {}", path.display(), e),
        }
    }
}
