// HTML pages for the browser-facing routes

use crate::config::AllowedExtensions;
use crate::relay::RelayOutcome;

pub const UPLOAD_FORM: &str = r#"<html>
    <body>
        <h1>Convert a image to grayscale demo</h1>
        <br>
        <form action="/convert_from_html_form" method="POST" enctype="multipart/form-data">
            <input type="file" id="ctrl_1" name="data_file" />
            <input type="submit" value="Convert"/>
        </form>
    </body>
</html>
"#;

pub const NO_FILE: &str = r#"<html>
    <body>
        <p>No file!</p>
        <a href='/'>Try again>>> </a>
    </body>
</html>
"#;

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn unsupported_extension(file_name: &str, allowed: &AllowedExtensions) -> String {
    format!(
        r#"<html>
    <body>
        <p>This file extension is not supported: {}</p>
        <p>Use extension: {}</p>
        <a href='/'>Try again>>> </a>
    </body>
</html>
"#,
        escape(file_name),
        allowed
    )
}

pub fn decode_failed(file_name: &str) -> String {
    format!(
        r#"<html>
    <body>
        <p>This file could not be read as an image: {}</p>
        <a href='/'>Try again>>> </a>
    </body>
</html>
"#,
        escape(file_name)
    )
}

pub fn relay_form(allowed: &AllowedExtensions) -> String {
    format!(
        r#"<html>
    <body>
        <h1>Test convert with curl</h1>
        <p>The following extensions are available: {}.</p>
        <p>Fill in the fields on the form and click the button 'Go test'</p>
        <br>
        <form method="POST">
            <label for="input_1">Enter the path to the source file</label><br>
            <input type="text" name="source_file_path" id="input_1"
                placeholder="/home/user/dir/" required/><br>
            <br>
            <label for="input_2">Enter the name of source file</label><br>
            <input type="text" name="source_file_name" id="input_2"
                placeholder="source_image.jpg" required/><br>
            <br>
            <label for="input_3">Enter the path to save the edited file</label><br>
            <input type="text" name="output_file_path" id="input_3"
                placeholder="/home/user/dir/" required/><br>
            <br>
            <label for="input_4">Enter the name of edited file</label><br>
            <input type="text" name="output_file_name" id="input_4"
                placeholder="edited_image.jpg" required/><br>
            <br>
            <input type="submit" value="Go test"/>
        </form>
    </body>
</html>
"#,
        allowed
    )
}

pub fn relay_success(outcome: &RelayOutcome) -> String {
    format!(
        r#"<html>
    <body>
        <p>This is response from <strong>{}</strong></p>
        <p>Response code: <strong>{}</strong></p>
        <p>Original file location: <strong>{}</strong></p>
        <p>Converted file location: <strong>{}</strong></p>
        <p>Converted file size: <strong>{} bytes</strong></p>
        <p>Download name sent by the server: <strong>{}</strong></p>
    </body>
</html>
"#,
        escape(&outcome.endpoint),
        outcome.status,
        escape(&outcome.source.display().to_string()),
        escape(&outcome.output.display().to_string()),
        outcome.bytes_written,
        escape(outcome.upstream_file_name.as_deref().unwrap_or("-"))
    )
}
