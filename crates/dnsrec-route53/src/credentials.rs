//! Credential resolution for the HTTP client
//!
//! Explicit settings win. Otherwise the usual AWS sources are consulted, in
//! order:
//!
//! 1. `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`
//!    (skipped when a profile is configured)
//! 2. The shared credentials file (`AWS_SHARED_CREDENTIALS_FILE`, or
//!    `~/.aws/credentials`) under the configured profile, `AWS_PROFILE`, or
//!    `default`
//!
//! Instance metadata, SSO and credential processes are not consulted.

use std::fmt;
use std::path::{Path, PathBuf};

use dnsrec_core::config::Route53Settings;
use dnsrec_core::{Error, Result};

/// Signing credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,

    /// ⚠️ NEVER log this value
    pub secret_access_key: String,

    /// ⚠️ NEVER log this value
    pub session_token: Option<String>,
}

// Custom Debug implementation that hides the secret key and session token
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Resolve credentials for `settings` from the process environment
    pub fn resolve(settings: &Route53Settings) -> Result<Self> {
        Self::resolve_with(
            settings,
            |key| std::env::var(key).ok(),
            |path| std::fs::read_to_string(path).ok(),
        )
    }

    /// Resolve credentials reading variables from `env` and files with
    /// `read_file`
    pub fn resolve_with<E, F>(settings: &Route53Settings, env: E, read_file: F) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        F: Fn(&Path) -> Option<String>,
    {
        if let (Some(key_id), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key) {
            tracing::debug!("using configured Route 53 credentials");
            return Ok(Self::new(key_id.clone(), secret.clone(), settings.session_token.clone()));
        }

        if settings.profile.is_none()
            && let (Some(key_id), Some(secret)) =
                (env("AWS_ACCESS_KEY_ID"), env("AWS_SECRET_ACCESS_KEY"))
        {
            tracing::debug!("using Route 53 credentials from the environment");
            return Ok(Self::new(key_id, secret, env("AWS_SESSION_TOKEN")));
        }

        let profile = settings
            .profile
            .clone()
            .or_else(|| env("AWS_PROFILE"))
            .unwrap_or_else(|| "default".to_string());
        let path = credentials_file(&env).ok_or_else(|| {
            Error::config("no Route 53 credentials: no key pair configured and no home directory")
        })?;
        let contents = read_file(&path).ok_or_else(|| {
            Error::config(format!(
                "no Route 53 credentials: no key pair configured and {} is not readable",
                path.display()
            ))
        })?;

        let credentials = parse_profile(&contents, &profile).ok_or_else(|| {
            Error::config(format!(
                "no Route 53 credentials for profile '{}' in {}",
                profile,
                path.display()
            ))
        })?;
        tracing::debug!(profile = %profile, "using Route 53 credentials from shared file");
        Ok(credentials)
    }
}

fn credentials_file<E>(env: &E) -> Option<PathBuf>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(path) = env("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }
    env("HOME")
        .or_else(|| env("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".aws").join("credentials"))
}

/// Read the keys of `profile` from a shared credentials file
fn parse_profile(contents: &str, profile: &str) -> Option<Credentials> {
    let mut in_profile = false;
    let mut key_id = None;
    let mut secret = None;
    let mut token = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => key_id = Some(value),
            "aws_secret_access_key" => secret = Some(value),
            "aws_session_token" => token = Some(value),
            _ => {}
        }
    }

    Some(Credentials::new(key_id?, secret?, token))
}
