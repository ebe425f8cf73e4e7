//! RFC 2822 message assembly for the mail API's `raw` field.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random multipart boundary, fresh for every message.
pub fn new_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("boundary_{}", token)
}

/// Build a multipart/alternative message with a single HTML part.
///
/// The body goes out as 8bit UTF-8; header values have CR/LF removed so a
/// recipient or subject cannot inject extra headers.
pub fn build_message(from: &str, to: &str, subject: &str, html: &str, boundary: &str) -> String {
    [
        format!("From: {}", header_value(from)),
        format!("To: {}", header_value(to)),
        format!("Subject: {}", header_value(subject)),
        "MIME-Version: 1.0".to_string(),
        format!("Content-Type: multipart/alternative; boundary=\"{}\"", boundary),
        String::new(),
        format!("--{}", boundary),
        "Content-Type: text/html; charset=UTF-8".to_string(),
        "Content-Transfer-Encoding: 8bit".to_string(),
        String::new(),
        html.to_string(),
        String::new(),
        format!("--{}--", boundary),
    ]
    .join("\r\n")
}

/// Encode the message as base64url without padding over its UTF-8 bytes.
pub fn encode_raw(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

fn header_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}
