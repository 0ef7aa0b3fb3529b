use crate::endpoints;
use serde::{Deserialize, Deserializer};
use std::{
    fmt::{self, Debug, Display},
    num::NonZeroU32,
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use url::Url;

#[derive(Clone)]
pub struct LoginDetails {
    pub url: Url,
    pub username: String,
    pub password: String,
}

impl LoginDetails {
    pub fn new(url: Url, username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginDetails {
            url,
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Debug for LoginDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginDetails")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Error, Debug)]
#[error("unknown MFA preference: {0}")]
pub struct MfaPreferenceParseError(String);

/// Whether the handshake drives the MFA frame itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum MfaPreference {
    #[default]
    Auto,
    /// The caller satisfies MFA out of band; the credential response is expected to carry the assertion.
    Deferred,
}

impl FromStr for MfaPreference {
    type Err = MfaPreferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(MfaPreference::Auto),
            "deferred" => Ok(MfaPreference::Deferred),
            _ => Err(MfaPreferenceParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for MfaPreference {
    type Error = MfaPreferenceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for MfaPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MfaPreference::Auto => write!(f, "Auto"),
            MfaPreference::Deferred => write!(f, "Deferred"),
        }
    }
}

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Pacing of the MFA status loop. `max_attempts` of `None` waits for as long as the approval takes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    #[serde(rename = "interval_secs", deserialize_with = "duration_from_secs")]
    pub interval: Duration,
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

fn duration_from_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub mfa: MfaPreference,
    pub sp_entity_id: String,
    pub skip_verify: bool,
    /// Scheme used to reach the MFA frame host. Only test deployments serve it over plain http.
    pub frame_scheme: String,
    pub poll: PollPolicy,
}

impl Default for AccountConfig {
    fn default() -> Self {
        AccountConfig {
            mfa: MfaPreference::default(),
            sp_entity_id: endpoints::DEFAULT_SP_ENTITY_ID.to_string(),
            skip_verify: false,
            frame_scheme: "https".to_string(),
            poll: PollPolicy::default(),
        }
    }
}

impl AccountConfig {
    pub fn with_mfa(mut self, mfa: MfaPreference) -> Self {
        self.mfa = mfa;
        self
    }

    pub fn with_sp_entity_id(mut self, sp_entity_id: impl Into<String>) -> Self {
        self.sp_entity_id = sp_entity_id.into();
        self
    }

    pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
        self.skip_verify = skip_verify;
        self
    }

    pub fn with_frame_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.frame_scheme = scheme.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_attempts: Option<NonZeroU32>) -> Self {
        self.poll.max_attempts = max_attempts;
        self
    }
}
