//! Charset handling for fetched pages

use crate::error::FetchError;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decode an HTML body to UTF-8
///
/// Tries, in order: byte-order mark, the `charset` parameter of the
/// `Content-Type` header, then statistical detection.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, FetchError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(enc, _)| enc)
        .or_else(|| {
            content_type
                .and_then(charset_param)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchError::Decode {
            encoding: used.name().to_string(),
        });
    }
    tracing::debug!(encoding = used.name(), "Decoded response body");
    Ok(text.into_owned())
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}
