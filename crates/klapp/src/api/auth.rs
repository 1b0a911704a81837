//! KLAPP password-grant authentication
//!
//! Acquires and caches the bearer token used by the message endpoints.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;
use std::sync::Mutex;
use ureq::Agent;

use super::wire::{AuthRequest, AuthResponse};
use super::KlappError;
use crate::config::Account;

/// Credential and token management for the KLAPP API.
///
/// The token is held in memory only. A renewal overwrites the previous
/// token; a failed renewal leaves the old one in place, so the next
/// attempt starts from the credentials again.
pub struct KlappAuth {
    account: Account,
    auth_url: String,
    token: Mutex<Option<String>>,
}

impl KlappAuth {
    /// Create a new KlappAuth instance for the given account
    pub fn new(account: Account, base_url: &str) -> Self {
        Self {
            account,
            auth_url: format!("{}/v2/authenticate", base_url),
            token: Mutex::new(None),
        }
    }

    /// Return the cached token, authenticating first if none is held
    pub fn ensure(&self, agent: &Agent) -> Result<String, KlappError> {
        if let Some(token) = self.token.lock().unwrap().clone() {
            return Ok(token);
        }
        self.authenticate(agent)
    }

    /// Exchange the account credentials for a fresh token.
    ///
    /// A 401 means the credentials were rejected; any other non-200
    /// status or transport failure is a connection problem. A 200
    /// without a usable `refresh_token` is treated as an auth failure.
    pub fn authenticate(&self, agent: &Agent) -> Result<String, KlappError> {
        let mut response = agent
            .post(&self.auth_url)
            .send_json(AuthRequest::new(&self.account))
            .map_err(KlappError::from_transport)?;

        match response.status().as_u16() {
            200 => {}
            401 => return Err(KlappError::auth("invalid credentials")),
            status => return Err(KlappError::connection(format!("HTTP {status}"))),
        }

        let body: AuthResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| KlappError::connection(format!("invalid authentication response: {e}")))?;

        let token = match body.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(KlappError::auth("no token in response")),
        };

        debug!("acquired fresh API token for {}", self.account.email);
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(token)
    }

    /// Whether a token is currently held
    pub fn has_token(&self) -> bool {
        self.token.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_auth_holds_no_token() {
        let auth = KlappAuth::new(Account::new("a@b.se", "pw"), "http://127.0.0.1:1");
        assert!(!auth.has_token());
    }

    #[test]
    fn test_auth_url_is_derived_from_base() {
        let auth = KlappAuth::new(Account::new("a@b.se", "pw"), "https://api.klapp.mobi");
        assert_eq!(auth.auth_url, "https://api.klapp.mobi/v2/authenticate");
    }
}
