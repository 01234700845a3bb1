//! Mapping of reqwest and HTTP status failures onto [`ApiError`].

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::ports::ApiError;

const DETAIL_FIELDS: [&str; 3] = ["detail", "message", "error"];

pub(super) fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(error.to_string())
    } else if error.is_decode() {
        ApiError::decode(error.to_string())
    } else {
        ApiError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let message = server_detail(body).unwrap_or_else(|| {
        let preview = body_preview(body);
        if preview.is_empty() {
            format!("status {}", status.as_u16())
        } else {
            format!("status {}: {preview}", status.as_u16())
        }
    });

    match status {
        StatusCode::NOT_FOUND => ApiError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::timeout(message),
        _ => ApiError::rejected(status.as_u16(), message),
    }
}

pub(super) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|error| ApiError::decode(format!("invalid {what} payload: {error}")))
}

/// First string among the conventional error fields of a JSON error body.
fn server_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    DETAIL_FIELDS.iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
            .map(str::to_owned)
    })
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use crate::domain::Area;
    use rstest::rstest;

    #[rstest]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Timeout")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::conflict(StatusCode::CONFLICT, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Rejected")]
    fn maps_http_statuses_to_api_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"detail\":\"area ocupada\"}");
        let matched = match expected {
            "NotFound" => matches!(error, ApiError::NotFound { .. }),
            "Timeout" => matches!(error, ApiError::Timeout { .. }),
            "Rejected" => matches!(error, ApiError::Rejected { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[rstest]
    #[case(br#"{"detail":"nombre requerido"}"#.as_slice(), "nombre requerido")]
    #[case(br#"{"message":" duplicado "}"#.as_slice(), "duplicado")]
    #[case(br#"{"error":"sin permiso","detail":""}"#.as_slice(), "sin permiso")]
    fn rejected_errors_carry_the_server_detail(#[case] body: &[u8], #[case] expected: &str) {
        let error = map_status_error(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(error, ApiError::rejected(422_u16, expected));
    }

    #[rstest]
    fn non_json_bodies_fall_back_to_a_compact_preview() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"<html>\n  upstream   down\n</html>");
        assert_eq!(
            error,
            ApiError::rejected(502_u16, "status 502: <html> upstream down </html>")
        );
    }

    #[rstest]
    fn empty_bodies_report_the_status_only() {
        let error = map_status_error(StatusCode::SERVICE_UNAVAILABLE, b"");
        assert_eq!(error, ApiError::rejected(503_u16, "status 503"));
    }

    #[rstest]
    fn long_previews_are_truncated() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[rstest]
    fn decode_reports_the_payload_kind() {
        let error = decode::<Vec<Area>>(b"{\"not\":\"a list\"}", "area list")
            .expect_err("object is not a list");
        assert!(matches!(error, ApiError::Decode { ref message } if message.contains("area list")));
    }
}
