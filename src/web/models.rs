// Form payloads accepted by the web server

use serde::Deserialize;

/// `POST /test_curl` form body
#[derive(Deserialize, Debug, Clone)]
pub struct RelayForm {
    pub source_file_path: String,
    pub source_file_name: String,
    pub output_file_path: String,
    pub output_file_name: String,
}

// Multipart field carrying the upload on `POST /convert_from_html_form`
pub const UPLOAD_FIELD: &str = "data_file";
