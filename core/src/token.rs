//! Ticket token minting and the scannable payload codec.
//!
//! The payload is the one bit-exact contract with the outside world: a JSON
//! object with the fields `eventId`, `userId`, and `token`, rendered into the
//! QR artifact and scanned back as an untrusted byte string. Decoding fails
//! closed — malformed input never yields a partially populated payload.

use crate::types::{AttendeeId, EventId, TicketToken};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Decoding failure for a scanned payload.
///
/// Scanners surface any variant as "invalid code, try again"; the distinction
/// exists for logs.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a JSON object of the expected shape
    #[error("payload is not a valid scan record: {0}")]
    Syntax(#[from] serde_json::Error),
    /// A required field is absent or not a usable identifier
    #[error("payload has no usable `{0}` field")]
    Field(&'static str),
}

/// Decoded content of a scannable artifact.
///
/// `token` is kept as the raw presented string: pending reservations render
/// QR codes with an empty token, and forged input may carry anything at all.
/// Comparison against an issued [`TicketToken`] is exact string equality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanPayload {
    /// Event the artifact claims entry to
    #[serde(rename = "eventId")]
    pub event_id: EventId,
    /// Attendee the artifact claims to belong to
    #[serde(rename = "userId")]
    pub attendee_id: AttendeeId,
    /// Presented credential string; empty when the artifact carried none
    pub token: String,
}

/// Wire shape before validation. Unknown extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(rename = "eventId", default)]
    event_id: Option<String>,
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Mints entry credentials and converts them to and from scan payloads.
///
/// Stateless and side-effect free; safe to share or construct at will.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenIssuer;

impl TokenIssuer {
    /// Creates a new `TokenIssuer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Mints a fresh unguessable token
    #[must_use]
    pub fn issue(&self) -> TicketToken {
        TicketToken::new()
    }

    /// Produces the exact bytes placed into the scannable artifact
    #[must_use]
    #[allow(clippy::expect_used)] // serializing three string fields cannot fail
    pub fn encode(&self, event_id: EventId, attendee_id: AttendeeId, token: &TicketToken) -> Vec<u8> {
        let payload = ScanPayload {
            event_id,
            attendee_id,
            token: token.to_string(),
        };
        serde_json::to_vec(&payload).expect("scan payload serialization is infallible")
    }

    /// Decodes a scanned byte string.
    ///
    /// `eventId` and `userId` must be present and parse as identifiers; the
    /// `token` field may be absent or empty (it decodes to the empty string,
    /// which never matches an issued token). Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for anything else; never a partial payload.
    pub fn decode(&self, raw: &[u8]) -> Result<ScanPayload, DecodeError> {
        let parsed: RawPayload = serde_json::from_slice(raw)?;

        let event_id = parse_id(parsed.event_id, "eventId")?;
        let attendee_id = parse_id(parsed.user_id, "userId")?;

        Ok(ScanPayload {
            event_id: EventId::from_uuid(event_id),
            attendee_id: AttendeeId::from_uuid(attendee_id),
            token: parsed.token.unwrap_or_default(),
        })
    }
}

fn parse_id(field: Option<String>, name: &'static str) -> Result<Uuid, DecodeError> {
    field
        .as_deref()
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or(DecodeError::Field(name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_issued_tokens() {
        let issuer = TokenIssuer::new();
        let event_id = EventId::new();
        let attendee_id = AttendeeId::new();
        let token = issuer.issue();

        let bytes = issuer.encode(event_id, attendee_id, &token);
        let payload = issuer.decode(&bytes).unwrap();

        assert_eq!(payload.event_id, event_id);
        assert_eq!(payload.attendee_id, attendee_id);
        assert!(token.matches(&payload.token));
    }

    #[test]
    fn issued_tokens_are_distinct() {
        let issuer = TokenIssuer::new();
        assert_ne!(issuer.issue(), issuer.issue());
    }

    #[test]
    fn rejects_non_json_bytes() {
        let issuer = TokenIssuer::new();
        assert!(matches!(
            issuer.decode(b"not a payload"),
            Err(DecodeError::Syntax(_))
        ));
        assert!(matches!(issuer.decode(b""), Err(DecodeError::Syntax(_))));
    }

    #[test]
    fn rejects_missing_or_garbled_identifiers() {
        let issuer = TokenIssuer::new();

        let missing_event = format!(r#"{{"userId":"{}","token":""}}"#, Uuid::new_v4());
        assert!(matches!(
            issuer.decode(missing_event.as_bytes()),
            Err(DecodeError::Field("eventId"))
        ));

        let garbled_user = format!(r#"{{"eventId":"{}","userId":"zzz","token":""}}"#, Uuid::new_v4());
        assert!(matches!(
            issuer.decode(garbled_user.as_bytes()),
            Err(DecodeError::Field("userId"))
        ));
    }

    #[test]
    fn tolerates_absent_or_empty_token() {
        let issuer = TokenIssuer::new();
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let empty = format!(r#"{{"eventId":"{event_id}","userId":"{user_id}","token":""}}"#);
        let payload = issuer.decode(empty.as_bytes()).unwrap();
        assert_eq!(payload.token, "");

        let omitted = format!(r#"{{"eventId":"{event_id}","userId":"{user_id}"}}"#);
        let payload = issuer.decode(omitted.as_bytes()).unwrap();
        assert_eq!(payload.token, "");
    }

    #[test]
    fn ignores_unknown_extra_fields() {
        let issuer = TokenIssuer::new();
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let token = TicketToken::new();

        let padded = format!(
            r#"{{"eventId":"{event_id}","userId":"{user_id}","token":"{token}","venue":"hall-b","seq":42}}"#
        );
        let payload = issuer.decode(padded.as_bytes()).unwrap();
        assert!(token.matches(&payload.token));
    }
}
