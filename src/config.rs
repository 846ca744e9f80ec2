// Immutable service configuration, built once in `main` and shared by reference.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// Maximum allowed size for a request body (multipart upload or raw PUT)
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024; // 16MB

pub const DEFAULT_UPLOAD_DIR: &str = "static";

pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// File extensions a client may name its upload with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedExtensions(&'static [&'static str]);

impl AllowedExtensions {
    pub const fn new(extensions: &'static [&'static str]) -> Self {
        Self(extensions)
    }

    /// Case-sensitive membership test.
    pub fn contains(&self, extension: &str) -> bool {
        self.0.contains(&extension)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> {
        self.0.iter().copied()
    }
}

impl Default for AllowedExtensions {
    fn default() -> Self {
        Self::new(&["svg", "png", "jpg", "jpeg", "gif"])
    }
}

impl fmt::Display for AllowedExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, extension) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(extension)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub allowed_extensions: AllowedExtensions,
    pub max_body_bytes: usize,
    /// Also write every converted image into `upload_dir`.
    pub persist_converted: bool,
    pub upload_dir: PathBuf,
    /// Base URL the relay test client sends its PUT to. Falls back to the
    /// incoming request's `Host` when unset.
    pub relay_base_url: Option<String>,
    pub relay_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: AllowedExtensions::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            persist_converted: false,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            relay_base_url: None,
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }
}
