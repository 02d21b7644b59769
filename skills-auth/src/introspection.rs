//! Introspection request layout and response parsing.
//!
//! Providers disagree on almost everything: Google's tokeninfo wants a GET
//! with `access_token` and answers with string-typed numbers and no `active`
//! flag, RFC 7662 servers want a POST form with `token` and answer with an
//! `active` boolean and an absolute `exp`. The types here describe where the
//! token goes and where each claim lives, so a single verifier can talk to
//! both.

use crate::error::VerificationError;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// How the token is sent to the introspection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrospectionMethod {
    /// Token in the query string of a GET request
    Get,
    /// Token in an `application/x-www-form-urlencoded` POST body
    Post,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown introspection method '{0}', expected 'get' or 'post'")]
pub struct UnknownMethod(pub String);

impl IntrospectionMethod {
    /// Conventional token parameter: `access_token` for GET, `token` for POST
    pub fn default_token_param(&self) -> &'static str {
        match self {
            IntrospectionMethod::Get => "access_token",
            IntrospectionMethod::Post => "token",
        }
    }
}

impl FromStr for IntrospectionMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            m if m.eq_ignore_ascii_case("get") => Ok(IntrospectionMethod::Get),
            m if m.eq_ignore_ascii_case("post") => Ok(IntrospectionMethod::Post),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionRequest {
    pub method: IntrospectionMethod,
    /// Name of the parameter carrying the token
    pub token_param: String,
}

impl IntrospectionRequest {
    /// GET `?<param>=<token>` (tokeninfo style)
    pub fn query(token_param: impl Into<String>) -> Self {
        Self {
            method: IntrospectionMethod::Get,
            token_param: token_param.into(),
        }
    }

    /// POST form `<param>=<token>` (RFC 7662 style)
    pub fn form(token_param: impl Into<String>) -> Self {
        Self {
            method: IntrospectionMethod::Post,
            token_param: token_param.into(),
        }
    }
}

impl IntrospectionRequest {
    /// Request layout from an optional method and an optional parameter name.
    ///
    /// Unset parts fall back to GET and the method's conventional parameter.
    pub fn configured(
        method: Option<IntrospectionMethod>,
        token_param: Option<&str>,
    ) -> Self {
        let method = method.unwrap_or(IntrospectionMethod::Get);
        Self {
            method,
            token_param: token_param
                .unwrap_or_else(|| method.default_token_param())
                .to_string(),
        }
    }
}

impl Default for IntrospectionRequest {
    fn default() -> Self {
        Self::query("access_token")
    }
}

/// Where the token lifetime is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryClaim {
    /// Seconds remaining (e.g. `expires_in`); zero or negative means expired
    Relative(String),
    /// Unix timestamp in seconds (e.g. `exp`)
    Absolute(String),
}

impl ExpiryClaim {
    fn name(&self) -> &str {
        match self {
            ExpiryClaim::Relative(name) | ExpiryClaim::Absolute(name) => name,
        }
    }
}

/// Claim names used to read an introspection response.
///
/// List-valued entries are tried in order and the first claim present wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimMapping {
    pub active: String,
    pub scope: String,
    pub client_id: Vec<String>,
    pub subject: Vec<String>,
    pub expiry: Vec<ExpiryClaim>,
}

impl Default for ClaimMapping {
    fn default() -> Self {
        Self {
            active: "active".to_string(),
            scope: "scope".to_string(),
            client_id: vec!["aud".to_string(), "azp".to_string(), "client_id".to_string()],
            subject: vec!["email".to_string(), "sub".to_string()],
            expiry: vec![
                ExpiryClaim::Relative("expires_in".to_string()),
                ExpiryClaim::Absolute("exp".to_string()),
            ],
        }
    }
}

/// Subject reported when none of the subject claims is present
pub const UNKNOWN_SUBJECT: &str = "unknown";

/// The parts of a provider answer the verifier cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionResponse {
    /// `false` only when the provider explicitly said so
    pub active: bool,
    /// Raw space-delimited scope string
    pub scope: String,
    /// Unix seconds; `None` when the provider reported no lifetime
    pub expires_at: Option<i64>,
    /// Audience or client identifiers the token was issued for
    pub audience: Vec<String>,
    pub subject: Option<String>,
}

impl IntrospectionResponse {
    /// Parse a raw response body.
    ///
    /// `now` (unix seconds) anchors relative lifetimes. Anything that is not
    /// a JSON object, or a claim of the wrong type, makes the token invalid.
    pub fn parse(body: &[u8], claims: &ClaimMapping, now: i64) -> Result<Self, VerificationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| invalid(format!("introspection response is not JSON: {e}")))?;
        match value {
            Value::Object(data) => Self::from_claims(&data, claims, now),
            _ => Err(invalid("introspection response is not a JSON object")),
        }
    }

    /// Read a response that was already decoded into a JSON object
    pub fn from_claims(
        data: &Map<String, Value>,
        claims: &ClaimMapping,
        now: i64,
    ) -> Result<Self, VerificationError> {
        let active = match present(data, &claims.active) {
            None => true,
            Some(Value::Bool(active)) => *active,
            Some(Value::String(s)) if s == "true" => true,
            Some(Value::String(s)) if s == "false" => false,
            Some(other) => {
                return Err(invalid(format!(
                    "claim '{}' is not a boolean: {other}",
                    claims.active
                )))
            }
        };

        let scope = match present(data, &claims.scope) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        invalid(format!("claim '{}' contains a non-string scope", claims.scope))
                    })
                })
                .collect::<Result<Vec<&str>, _>>()?
                .join(" "),
            Some(other) => {
                return Err(invalid(format!(
                    "claim '{}' is not a scope string: {other}",
                    claims.scope
                )))
            }
        };

        let mut expires_at = None;
        if let Some((claim, value)) = claims
            .expiry
            .iter()
            .find_map(|claim| present(data, claim.name()).map(|value| (claim, value)))
        {
            let seconds = integer(value)
                .ok_or_else(|| invalid(format!("claim '{}' is not an integer", claim.name())))?;
            expires_at = Some(match claim {
                ExpiryClaim::Relative(_) => now.saturating_add(seconds),
                ExpiryClaim::Absolute(_) => seconds,
            });
        }

        let mut audience = Vec::new();
        if let Some((name, value)) = first_present(data, &claims.client_id) {
            audience = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(String::from)
                            .ok_or_else(|| invalid(format!("claim '{name}' contains a non-string value")))
                    })
                    .collect::<Result<Vec<String>, _>>()?,
                other => return Err(invalid(format!("claim '{name}' is not a string: {other}"))),
            };
        }

        let subject = first_present(data, &claims.subject).and_then(|(_, value)| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(Self {
            active,
            scope,
            expires_at,
            audience,
            subject,
        })
    }

    /// Split the scope string into canonical scope tokens, keeping order
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self.scope.split_whitespace() {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        scopes
    }
}

fn invalid(reason: impl Into<String>) -> VerificationError {
    VerificationError::TokenInvalid(reason.into())
}

/// A claim counts as present unless it is missing, null or an empty string
fn present<'a>(data: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match data.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    }
}

fn first_present<'a, 'n>(
    data: &'a Map<String, Value>,
    names: &'n [String],
) -> Option<(&'n str, &'a Value)> {
    names
        .iter()
        .find_map(|name| present(data, name).map(|value| (name.as_str(), value)))
}

/// Providers send lifetimes as numbers or as numeric strings
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_method_parsing() {
        assert_eq!("POST".parse(), Ok(IntrospectionMethod::Post));
        assert_eq!(" get ".parse(), Ok(IntrospectionMethod::Get));
        assert_eq!(
            "put".parse::<IntrospectionMethod>(),
            Err(UnknownMethod("put".to_string()))
        );
    }

    #[test]
    fn test_configured_request_defaults() {
        assert_eq!(IntrospectionRequest::configured(None, None), IntrospectionRequest::default());
        assert_eq!(
            IntrospectionRequest::configured(Some(IntrospectionMethod::Post), None),
            IntrospectionRequest::form("token")
        );
        assert_eq!(
            IntrospectionRequest::configured(Some(IntrospectionMethod::Post), Some("access_token")),
            IntrospectionRequest::form("access_token")
        );
        assert_eq!(
            IntrospectionRequest::configured(None, Some("id_token")),
            IntrospectionRequest::query("id_token")
        );
    }

    fn parse(value: serde_json::Value) -> Result<IntrospectionResponse, VerificationError> {
        let body = serde_json::to_vec(&value).expect("serializable");
        IntrospectionResponse::parse(&body, &ClaimMapping::default(), NOW)
    }

    #[test]
    fn test_parse_google_tokeninfo() {
        let response = parse(json!({
            "azp": "client-1",
            "aud": "client-1",
            "sub": "1234567890",
            "scope": "openid https://www.googleapis.com/auth/userinfo.email",
            "exp": "1700003600",
            "expires_in": "3599",
            "email": "user@example.com",
            "email_verified": "true",
            "access_type": "online"
        }))
        .expect("valid response");

        assert!(response.active);
        assert_eq!(response.audience, vec!["client-1"]);
        assert_eq!(response.subject.as_deref(), Some("user@example.com"));
        assert_eq!(response.expires_at, Some(NOW + 3599));
        assert_eq!(
            response.scopes(),
            vec!["openid", "https://www.googleapis.com/auth/userinfo.email"]
        );
    }

    #[test]
    fn test_parse_rfc7662_response() {
        let response = parse(json!({
            "active": true,
            "client_id": "client-1",
            "scope": "read write",
            "sub": "user-9",
            "exp": NOW + 60
        }))
        .expect("valid response");

        assert!(response.active);
        assert_eq!(response.audience, vec!["client-1"]);
        assert_eq!(response.subject.as_deref(), Some("user-9"));
        assert_eq!(response.expires_at, Some(NOW + 60));
    }

    #[test]
    fn test_inactive_flag() {
        let response = parse(json!({ "active": false })).expect("valid response");
        assert!(!response.active);

        let response = parse(json!({ "active": "false" })).expect("valid response");
        assert!(!response.active);
    }

    #[test]
    fn test_missing_active_flag_means_active() {
        let response = parse(json!({ "scope": "openid" })).expect("valid response");
        assert!(response.active);
        assert_eq!(response.expires_at, None);
        assert!(response.audience.is_empty());
        assert_eq!(response.subject, None);
    }

    #[test]
    fn test_unparseable_bodies_are_invalid() {
        let claims = ClaimMapping::default();
        for body in [&b"not json"[..], &b"[1, 2]"[..], &b"\"text\""[..], &b""[..]] {
            let err = IntrospectionResponse::parse(body, &claims, NOW).unwrap_err();
            assert!(matches!(err, VerificationError::TokenInvalid(_)), "{body:?}");
        }
    }

    #[test]
    fn test_wrongly_typed_claims_are_invalid() {
        for value in [
            json!({ "active": 1 }),
            json!({ "scope": 42 }),
            json!({ "scope": ["read", 1] }),
            json!({ "expires_in": "soon" }),
            json!({ "aud": { "id": "x" } }),
        ] {
            let err = parse(value.clone()).unwrap_err();
            assert!(matches!(err, VerificationError::TokenInvalid(_)), "{value}");
        }
    }

    #[test]
    fn test_relative_expiry_takes_precedence() {
        let response = parse(json!({ "expires_in": 0, "exp": NOW + 100 })).expect("valid response");
        assert_eq!(response.expires_at, Some(NOW));

        let response = parse(json!({ "expires_in": "-100" })).expect("valid response");
        assert_eq!(response.expires_at, Some(NOW - 100));
    }

    #[test]
    fn test_audience_fallback_and_arrays() {
        let response = parse(json!({ "azp": "client-2" })).expect("valid response");
        assert_eq!(response.audience, vec!["client-2"]);

        let response = parse(json!({ "aud": "", "azp": "client-2" })).expect("valid response");
        assert_eq!(response.audience, vec!["client-2"]);

        let response = parse(json!({ "aud": ["a", "b"] })).expect("valid response");
        assert_eq!(response.audience, vec!["a", "b"]);
    }

    #[test]
    fn test_scope_array_and_duplicates() {
        let response = parse(json!({ "scope": ["read", "write", "read"] })).expect("valid response");
        assert_eq!(response.scope, "read write read");
        assert_eq!(response.scopes(), vec!["read", "write"]);
    }

    #[test]
    fn test_custom_claim_mapping() {
        let claims = ClaimMapping {
            active: "valid".to_string(),
            scope: "scp".to_string(),
            client_id: vec!["app".to_string()],
            subject: vec!["username".to_string(), "sub".to_string()],
            expiry: vec![ExpiryClaim::Absolute("valid_until".to_string())],
        };
        let body = serde_json::to_vec(&json!({
            "valid": true,
            "scp": "read write",
            "app": "client-3",
            "username": "testuser",
            "sub": "ignored",
            "valid_until": NOW + 5
        }))
        .expect("serializable");

        let response = IntrospectionResponse::parse(&body, &claims, NOW).expect("valid response");
        assert_eq!(response.scopes(), vec!["read", "write"]);
        assert_eq!(response.audience, vec!["client-3"]);
        assert_eq!(response.subject.as_deref(), Some("testuser"));
        assert_eq!(response.expires_at, Some(NOW + 5));
    }

    #[test]
    fn test_numeric_subject() {
        let response = parse(json!({ "sub": 42 })).expect("valid response");
        assert_eq!(response.subject.as_deref(), Some("42"));
    }
}
