use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Encodes raw chunk bytes as standard base64.
///
/// The output carries no protocol metadata — only the encoded payload, ready
/// to embed in a JSON request body.
pub fn encode_chunk(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Strips a `data:<mime>;base64,` prefix from a browser-produced data URL.
///
/// Returns the input unchanged when no such prefix is present.
pub fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(";base64,") {
        Some((head, payload)) if head.starts_with("data:") => payload,
        _ => encoded,
    }
}
