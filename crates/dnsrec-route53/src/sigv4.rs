//! AWS Signature Version 4 request signing
//!
//! Route 53 is signed as service `route53`. Signing takes the request's
//! method, path, query, headers and body, and yields the headers to add:
//! `x-amz-date`, `x-amz-security-token` for temporary credentials, and
//! `authorization`.

use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// The parts of a request covered by the signature
#[derive(Debug, Clone, Copy)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a [(String, String)],
    /// Headers to sign; `host` must be among them
    pub headers: &'a [(String, String)],
    pub payload: &'a [u8],
}

/// Sign `request` for `region`/`service` at `now`
///
/// Returns the headers to send in addition to `request.headers`.
pub fn sign(
    credentials: &Credentials,
    region: &str,
    service: &str,
    request: &SigningRequest<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<(String, String)>, InvalidLength> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut added = vec![("x-amz-date".to_string(), amz_date.clone())];
    if let Some(token) = &credentials.session_token {
        added.push(("x-amz-security-token".to_string(), token.clone()));
    }

    let headers: Vec<(String, String)> = request.headers.iter().chain(&added).cloned().collect();
    let (canonical, signed_headers) = canonical_request(request, &headers);

    let scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical.as_bytes()))
    );
    let key = signing_key(&credentials.secret_access_key, &date, region, service)?;
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

    added.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        ),
    ));
    Ok(added)
}

/// Canonical request text and the `SignedHeaders` list
fn canonical_request(request: &SigningRequest<'_>, headers: &[(String, String)]) -> (String, String) {
    let mut headers: Vec<(String, String)> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        canonical_uri(request.path),
        canonical_query(request.query),
        canonical_headers,
        signed_headers,
        hex::encode(Sha256::digest(request.payload)),
    );
    (canonical, signed_headers)
}

fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Query string in canonical form: encoded, sorted by key then value
///
/// The same string is used on the wire so the two never disagree.
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(key, value)| (uri_encode(key), uri_encode(value)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode everything but RFC 3986 unreserved characters
fn uri_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte))
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, InvalidLength> {
    let key = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let key = hmac(&key, region.as_bytes())?;
    let key = hmac(&key, service.as_bytes())?;
    hmac(&key, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Published AWS example: IAM ListUsers, 2015-08-30T12:36:00Z
    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    #[test]
    fn derives_published_signing_key() {
        let key = signing_key(SECRET, "20150830", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn signs_published_example_request() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET, None);
        let query = vec![
            ("Version".to_string(), "2010-05-08".to_string()),
            ("Action".to_string(), "ListUsers".to_string()),
        ];
        let headers = vec![
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded; charset=utf-8".to_string(),
            ),
            ("Host".to_string(), "iam.amazonaws.com".to_string()),
        ];
        let request = SigningRequest {
            method: "GET",
            path: "/",
            query: &query,
            headers: &headers,
            payload: b"",
        };

        let added = sign(&credentials, "us-east-1", "iam", &request, example_time()).unwrap();

        assert_eq!(added[0], ("x-amz-date".to_string(), "20150830T123600Z".to_string()));
        assert_eq!(
            added[1].1,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
    }

    #[test]
    fn session_token_is_signed() {
        let credentials = Credentials::new("AKIDEXAMPLE", SECRET, Some("token/+=".to_string()));
        let headers = vec![("host".to_string(), "route53.amazonaws.com".to_string())];
        let request = SigningRequest {
            method: "GET",
            path: "/2013-04-01/hostedzone",
            query: &[],
            headers: &headers,
            payload: b"",
        };

        let added = sign(&credentials, "us-east-1", "route53", &request, example_time()).unwrap();

        assert_eq!(added[1], ("x-amz-security-token".to_string(), "token/+=".to_string()));
        assert!(added[2].1.contains("SignedHeaders=host;x-amz-date;x-amz-security-token,"));
    }

    #[test]
    fn query_is_encoded_and_sorted() {
        let query = vec![
            ("type".to_string(), "TXT".to_string()),
            ("name".to_string(), "*.example.com.".to_string()),
            ("identifier".to_string(), "a b/c".to_string()),
        ];
        assert_eq!(
            canonical_query(&query),
            "identifier=a%20b%2Fc&name=%2A.example.com.&type=TXT"
        );
        assert_eq!(canonical_uri("/2013-04-01/hostedzone/Z1/rrset"), "/2013-04-01/hostedzone/Z1/rrset");
        assert_eq!(canonical_uri(""), "/");
    }
}
