use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Crew, Record};

/// Length of a registration code.
pub const CODE_LENGTH: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a fresh registration code: six uppercase alphanumerics.
pub fn generate_registration_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalize user-entered codes: surrounding whitespace dropped, uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// The payload encoded into a join QR code.
///
/// Canonical keys are `starshipId`, `crewId` and `code`. Older clients
/// emitted the short `{s, c, t}` form, which is still accepted on parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    #[serde(alias = "s")]
    pub starship_id: String,
    #[serde(alias = "c")]
    pub crew_id: String,
    #[serde(alias = "t")]
    pub code: String,
}

impl QrPayload {
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// A freshly issued registration code, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    pub crew_id: String,
    pub code: String,
    /// Epoch milliseconds after which the code is rejected.
    pub expiry: i64,
    /// JSON string to render as a QR code.
    pub qr: String,
}

/// Request to join a starship with a registration code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCodeInput {
    pub starship_id: String,
    /// The crew record the code was issued for. When absent the whole
    /// household is searched for the code.
    #[serde(default)]
    pub crew_id: Option<String>,
    pub code: String,
}

impl From<QrPayload> for RedeemCodeInput {
    fn from(payload: QrPayload) -> Self {
        RedeemCodeInput {
            starship_id: payload.starship_id,
            crew_id: Some(payload.crew_id),
            code: payload.code,
        }
    }
}

/// Result of a recruitment: the placeholder record and its code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitResult {
    pub crew: Record<Crew>,
    pub registration: IssuedCode,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    pub starship_id: String,
    pub crew: Record<Crew>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn codes_are_six_uppercase_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = generate_registration_code(&mut rng);
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn qr_payload_uses_canonical_keys() {
        let payload = QrPayload {
            starship_id: "S1".to_string(),
            crew_id: "K1".to_string(),
            code: "AB12CD".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&payload.encode()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"starshipId": "S1", "crewId": "K1", "code": "AB12CD"})
        );
    }

    #[test]
    fn qr_payload_accepts_legacy_short_keys() {
        let payload = QrPayload::parse(r#"{"s":"S1","c":"K1","t":"AB12CD"}"#).unwrap();
        assert_eq!(payload.starship_id, "S1");
        assert_eq!(payload.crew_id, "K1");
        assert_eq!(payload.code, "AB12CD");

        assert!(QrPayload::parse("AB12CD").is_none());
    }

    #[test]
    fn normalizes_typed_codes() {
        assert_eq!(normalize_code("  ab12cd "), "AB12CD");
    }
}
