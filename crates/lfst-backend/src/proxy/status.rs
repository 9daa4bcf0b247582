use hyper::StatusCode;
use lfst_protocol::TransferError;

/// Canonical reason phrase for `code`, or `"Unknown Status"`.
pub fn status_text(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown Status")
}

/// Classify a non-success status of the internal API.
pub fn status_to_error(code: u16) -> TransferError {
    match code {
        400 => TransferError::ParseError(status_text(code).to_string()),
        401 => TransferError::Unauthorized,
        403 => TransferError::Forbidden,
        404 => TransferError::NotFound,
        409 => TransferError::Conflict,
        _ => TransferError::RemoteStatus {
            code,
            text: status_text(code).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lfst_protocol::ErrorKind;

    #[test]
    fn protocol_statuses() {
        assert_eq!(status_to_error(400).kind(), ErrorKind::ParseError);
        assert_eq!(status_to_error(401).kind(), ErrorKind::Unauthorized);
        assert_eq!(status_to_error(403).kind(), ErrorKind::Forbidden);
        assert_eq!(status_to_error(404).kind(), ErrorKind::NotFound);
        assert_eq!(status_to_error(409).kind(), ErrorKind::Conflict);
    }

    #[test]
    fn other_statuses_carry_code_and_text() {
        match status_to_error(500) {
            TransferError::RemoteStatus { code, text } => {
                assert_eq!(code, 500);
                assert_eq!(text, "Internal Server Error");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(status_to_error(422).kind(), ErrorKind::Internal);
        assert_eq!(status_to_error(599).status().code, 599);
        assert_eq!(status_text(599), "Unknown Status");
    }
}
