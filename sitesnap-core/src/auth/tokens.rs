//! Action-scoped anti-forgery tokens.
//!
//! A token has the form `<nonce>.<expires>.<mac>` where `nonce` is a v4 UUID,
//! `expires` is a unix timestamp in seconds and `mac` is the URL-safe base64 of
//! HMAC-SHA256 over action, principal name, nonce and expiry. Tokens verified with
//! [`TokenService::verify`] are consumed and cannot be replayed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{SnapError, SnapResult};
use crate::export::DynClock;

use super::policy::Principal;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAction {
    /// Direct form submission of the export.
    ExportCsv,
    /// Programmatic export request.
    ExportAjax,
    /// Tab links on the dashboard.
    SelectTab,
}

impl TokenAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAction::ExportCsv => "export_csv",
            TokenAction::ExportAjax => "export_ajax",
            TokenAction::SelectTab => "select_tab",
        }
    }
}

impl std::fmt::Display for TokenAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "export_csv" => Ok(TokenAction::ExportCsv),
            "export_ajax" => Ok(TokenAction::ExportAjax),
            "select_tab" => Ok(TokenAction::SelectTab),
            other => Err(format!(
                "Unknown token action '{}'. Valid options: export_csv, export_ajax, select_tab",
                other
            )),
        }
    }
}

struct ParsedToken<'a> {
    nonce: Uuid,
    expires: i64,
    mac: &'a str,
}

/// Issues and verifies anti-forgery tokens.
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
    clock: DynClock,
    consumed: Mutex<HashMap<Uuid, i64>>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration, clock: DynClock) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            clock,
            consumed: Mutex::new(HashMap::new()),
        }
    }

    /// A service keyed with a random per-process secret.
    pub fn ephemeral(ttl: Duration, clock: DynClock) -> Self {
        let mut secret = Vec::with_capacity(32);
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        secret.extend_from_slice(Uuid::new_v4().as_bytes());
        Self::new(secret, ttl, clock)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, action: TokenAction, principal: &Principal) -> String {
        let nonce = Uuid::new_v4();
        let expires = (self.clock.now() + self.ttl).timestamp();
        let mac = self.sign(action, &principal.name, nonce, expires);
        format!("{}.{}.{}", nonce.simple(), expires, mac)
    }

    /// Validate without consuming. Used where a token legitimately repeats,
    /// such as navigation links.
    pub fn check(
        &self,
        token: Option<&str>,
        action: TokenAction,
        principal: &Principal,
    ) -> SnapResult<()> {
        let parsed = self.validate(token, action, principal)?;
        if self.is_consumed(parsed.nonce)? {
            return Err(SnapError::invalid_token(action, "token already used"));
        }
        Ok(())
    }

    /// Validate and consume. A second call with the same token fails.
    pub fn verify(
        &self,
        token: Option<&str>,
        action: TokenAction,
        principal: &Principal,
    ) -> SnapResult<()> {
        let parsed = self.validate(token, action, principal)?;
        let now = self.clock.now().timestamp();

        let mut consumed = self
            .consumed
            .lock()
            .map_err(|_| SnapError::Internal("token ledger lock poisoned".to_string()))?;
        consumed.retain(|_, expires| *expires >= now);

        if consumed.insert(parsed.nonce, parsed.expires).is_some() {
            warn!(action = %action, principal = %principal.name, "Rejected replayed token");
            return Err(SnapError::invalid_token(action, "token already used"));
        }

        debug!(action = %action, principal = %principal.name, "Token verified");
        Ok(())
    }

    fn is_consumed(&self, nonce: Uuid) -> SnapResult<bool> {
        let consumed = self
            .consumed
            .lock()
            .map_err(|_| SnapError::Internal("token ledger lock poisoned".to_string()))?;
        Ok(consumed.contains_key(&nonce))
    }

    fn validate<'a>(
        &self,
        token: Option<&'a str>,
        action: TokenAction,
        principal: &Principal,
    ) -> SnapResult<ParsedToken<'a>> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SnapError::invalid_token(action, "token missing"))?;

        let parsed =
            parse_token(token).ok_or_else(|| SnapError::invalid_token(action, "malformed token"))?;

        let expected = self.sign(action, &principal.name, parsed.nonce, parsed.expires);
        if !constant_time_eq(&expected, parsed.mac) {
            return Err(SnapError::invalid_token(action, "signature mismatch"));
        }

        if self.clock.now().timestamp() > parsed.expires {
            return Err(SnapError::invalid_token(action, "token expired"));
        }

        Ok(parsed)
    }

    fn sign(&self, action: TokenAction, principal: &str, nonce: Uuid, expires: i64) -> String {
        // new_from_slice accepts keys of any length for HMAC.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(action.as_str().as_bytes());
        mac.update(b"|");
        mac.update(principal.as_bytes());
        mac.update(b"|");
        mac.update(nonce.as_bytes());
        mac.update(b"|");
        mac.update(expires.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
    let mut parts = token.splitn(3, '.');
    let nonce = Uuid::parse_str(parts.next()?).ok()?;
    let expires = parts.next()?.parse::<i64>().ok()?;
    let mac = parts.next()?;
    if mac.is_empty() {
        return None;
    }
    Some(ParsedToken {
        nonce,
        expires,
        mac,
    })
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Expiry of a token, if it parses. Used for display only.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    parse_token(token).and_then(|p| DateTime::from_timestamp(p.expires, 0))
}
