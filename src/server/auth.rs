use hmac::{ Hmac, Mac };
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing ts/sig")]
    MissingCredentials,
    #[error("timestamp out of range")]
    TimestampOutOfRange,
    #[error("bad signature")]
    BadSignature,
    #[error("invalid server key")]
    InvalidKey,
}

/// Hex HMAC-SHA256 of `ts` under `secret`, as clients must send it in `sig`.
pub fn sign_timestamp(secret: &str, ts: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidKey)?;
    mac.update(ts.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the `ts`/`sig` query parameters of a handshake request.
pub fn verify_handshake_query(
    secret: &str,
    query: &str,
    now: i64,
    window_secs: i64
) -> Result<(), AuthError> {
    let params: HashMap<String, String> = form_urlencoded
        ::parse(query.as_bytes())
        .into_owned()
        .collect();

    let ts = params.get("ts").or_else(|| params.get("X-Api-Ts"));
    let sig = params.get("sig").or_else(|| params.get("X-Api-Sign"));

    let (Some(ts), Some(sig)) = (ts, sig) else {
        return Err(AuthError::MissingCredentials);
    };

    let ts_i: i64 = ts.parse().map_err(|_| AuthError::TimestampOutOfRange)?;
    if now.abs_diff(ts_i) > window_secs.max(0) as u64 {
        return Err(AuthError::TimestampOutOfRange);
    }

    let provided = hex::decode(sig).map_err(|_| AuthError::BadSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidKey)?;
    mac.update(ts.as_bytes());
    mac.verify_slice(&provided).map_err(|_| AuthError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "s3cret";
    const NOW: i64 = 1_700_000_000;

    fn query_for(ts: i64) -> String {
        let sig = sign_timestamp(SECRET, &ts.to_string()).unwrap();
        format!("ts={}&sig={}", ts, sig)
    }

    #[test]
    fn accepts_fresh_signature() {
        assert_eq!(verify_handshake_query(SECRET, &query_for(NOW - 10), NOW, 300), Ok(()));
    }

    #[test]
    fn accepts_alternate_parameter_names() {
        let sig = sign_timestamp(SECRET, &NOW.to_string()).unwrap();
        let query = format!("X-Api-Ts={}&X-Api-Sign={}", NOW, sig);
        assert_eq!(verify_handshake_query(SECRET, &query, NOW, 300), Ok(()));
    }

    #[test]
    fn rejects_stale_timestamp() {
        assert_eq!(
            verify_handshake_query(SECRET, &query_for(NOW - 301), NOW, 300),
            Err(AuthError::TimestampOutOfRange)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let sig = sign_timestamp("other", &NOW.to_string()).unwrap();
        let query = format!("ts={}&sig={}", NOW, sig);
        assert_eq!(verify_handshake_query(SECRET, &query, NOW, 300), Err(AuthError::BadSignature));
    }

    #[test]
    fn rejects_missing_params() {
        assert_eq!(
            verify_handshake_query(SECRET, "ts=1", NOW, 300),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(verify_handshake_query(SECRET, "", NOW, 300), Err(AuthError::MissingCredentials));
    }

    #[test]
    fn extreme_timestamps_are_out_of_range() {
        for ts in [i64::MIN, i64::MAX] {
            let query = format!("ts={}&sig=00", ts);
            assert_eq!(
                verify_handshake_query(SECRET, &query, NOW, 300),
                Err(AuthError::TimestampOutOfRange)
            );
        }
    }

    #[test]
    fn rejects_non_hex_signature() {
        let query = format!("ts={}&sig=zz", NOW);
        assert_eq!(verify_handshake_query(SECRET, &query, NOW, 300), Err(AuthError::BadSignature));
    }
}
