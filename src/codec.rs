//! Text encodings shared by the store, the durable slot and the HTTP layer.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Local};

const BYTES_PER_MB: f64 = 1_048_576.0;
const SIZE_SUFFIX: &str = " MB";
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

pub fn encode_contents(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_contents(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .context("Failed to decode base64 file contents")
}

/// Inline `data:` URI usable directly as an image source.
pub fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    let media_type = if media_type.is_empty() {
        FALLBACK_MEDIA_TYPE
    } else {
        media_type
    };
    format!("data:{};base64,{}", media_type, encode_contents(bytes))
}

pub fn size_label(byte_len: usize) -> String {
    format!("{:.2}{}", byte_len as f64 / BYTES_PER_MB, SIZE_SUFFIX)
}

pub fn parse_size_label(label: &str) -> Option<f64> {
    label.trim_end_matches(SIZE_SUFFIX).trim().parse().ok()
}

/// Strips the final extension group: `"a.b.png"` becomes `"a.b"`. A trailing
/// dot, or a "extension" containing a path separator, is left alone.
pub fn display_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) => {
            let ext = &file_name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                file_name.to_string()
            } else {
                file_name[..dot].to_string()
            }
        }
        None => file_name.to_string(),
    }
}

pub fn upload_date(at: DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_label_two_decimals() {
        assert_eq!(size_label(0), "0.00 MB");
        assert_eq!(size_label(1_048_576), "1.00 MB");
        assert_eq!(size_label(1_572_864), "1.50 MB");
        assert_eq!(size_label(5_000), "0.00 MB");
    }

    #[test]
    fn parse_size_label_reads_number_back() {
        assert_eq!(parse_size_label("2.50 MB"), Some(2.5));
        assert_eq!(parse_size_label("garbage"), None);
    }

    #[test]
    fn display_name_strips_only_last_group() {
        assert_eq!(display_name("diploma.png"), "diploma");
        assert_eq!(display_name("aws.cert.2024.pdf"), "aws.cert.2024");
        assert_eq!(display_name("README"), "README");
        assert_eq!(display_name("trailing."), "trailing.");
        assert_eq!(display_name(".hidden"), "");
        assert_eq!(display_name("dir.v2/file"), "dir.v2/file");
    }

    #[test]
    fn data_uri_embeds_media_type() {
        assert_eq!(data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
        assert_eq!(data_uri("", b""), "data:application/octet-stream;base64,");
    }

    #[test]
    fn decode_rejects_invalid_text() {
        assert!(decode_contents("not base64!!").is_err());
        assert_eq!(decode_contents(&encode_contents(&[0, 255, 7])).unwrap(), vec![0, 255, 7]);
    }
}
