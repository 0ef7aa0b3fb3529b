use crate::{
    config::{AccountConfig, PollPolicy},
    endpoints, markup,
    prompt::{PromptError, Prompter},
    tokens::ChallengeTokens,
    transport::{FormRequest, Transport, TransportError},
};
use futures::{stream, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Deserialize};
use std::{fmt, pin::pin};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

const FACTOR_PROMPT: &str = "Select a DUO MFA Option";
const PASSCODE_PROMPT: &str = "Enter passcode";

#[derive(Error, Debug)]
pub enum MfaError {
    #[error("error initiating MFA frame session")]
    FrameInit(#[source] TransportError),
    #[error("unable to locate MFA session id in frame response")]
    SessionIdNotFound,
    #[error("error selecting MFA factor")]
    Prompt(#[from] PromptError),
    #[error("error submitting MFA factor")]
    FactorSubmit(#[source] TransportError),
    #[error("error polling MFA status")]
    StatusPoll(#[source] TransportError),
    #[error("error retrieving MFA result")]
    ResultFetch(#[source] TransportError),
    #[error("invalid MFA frame url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("error authenticating mfa device: {0}")]
    DeviceAuthFailed(String),
    #[error("unable to get response.cookie from MFA result")]
    ResultCookieMissing,
    #[error("MFA approval still pending after {0} status checks")]
    PollLimitExceeded(u32),
}

#[derive(Clone, PartialEq, Eq)]
pub enum FactorChoice {
    Push,
    Call,
    Passcode(String),
}

impl FactorChoice {
    /// Labels offered to the prompter. The frame expects the label itself as the factor name.
    pub const OPTIONS: [&'static str; 3] = ["Duo Push", "Phone Call", "Passcode"];

    pub fn label(&self) -> &'static str {
        match self {
            FactorChoice::Push => Self::OPTIONS[0],
            FactorChoice::Call => Self::OPTIONS[1],
            FactorChoice::Passcode(_) => Self::OPTIONS[2],
        }
    }
}

impl fmt::Debug for FactorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct MfaSession {
    pub sid: String,
    pub host: String,
}

impl MfaSession {
    fn request(&self, url: Url, txid: &str) -> FormRequest {
        FormRequest::new(url).field("sid", &self.sid).field("txid", txid)
    }
}

impl fmt::Debug for MfaSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfaSession").field("host", &self.host).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Pending,
    Success(String),
    Failure,
}

impl PollOutcome {
    pub fn from_status(status: &StatusResponse) -> Self {
        match status.result.as_deref() {
            Some("SUCCESS") => PollOutcome::Success(status.result_url.clone().unwrap_or_default()),
            Some("FAILURE") => PollOutcome::Failure,
            _ => PollOutcome::Pending,
        }
    }
}

/// Signed proof of the approved MFA transaction, handed back to the gateway once.
#[derive(Clone, PartialEq, Eq)]
pub struct ResultCookie(String);

impl ResultCookie {
    pub fn into_sig_response(self, app_sig: &str) -> String {
        format!("{}:{}", self.0, app_sig)
    }
}

impl fmt::Debug for ResultCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResultCookie(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    stat: Option<String>,
    #[serde(default)]
    message: Option<String>,
    response: Option<T>,
}

impl<T: DeserializeOwned + Default> Envelope<T> {
    /// A body that is not a frame envelope reads as an empty one, leaving each step to judge what is missing.
    fn decode(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|error| {
            warn!(%error, "MFA frame answered with an undecodable body");
            Self::default()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PromptResponse {
    txid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusResponse {
    pub result: Option<String>,
    pub result_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResultResponse {
    cookie: Option<String>,
}

pub struct MfaDriver<'a, T, P> {
    transport: &'a T,
    prompter: &'a P,
    scheme: &'a str,
    poll: &'a PollPolicy,
}

impl<'a, T: Transport, P: Prompter> MfaDriver<'a, T, P> {
    pub fn new(transport: &'a T, prompter: &'a P, config: &'a AccountConfig) -> Self {
        Self {
            transport,
            prompter,
            scheme: &config.frame_scheme,
            poll: &config.poll,
        }
    }

    /// Runs the frame conversation to completion and returns the cookie proving approval.
    pub async fn verify(&self, tokens: &ChallengeTokens, parent: &Url) -> Result<ResultCookie, MfaError> {
        let session = self.init_session(tokens, parent).await?;
        let factor = self.choose_factor()?;
        let txid = self.submit_factor(&session, &factor).await?;
        let result_path = self.poll_until_terminal(&session, &txid).await?;
        self.fetch_result(&session, &txid, &result_path).await
    }

    fn frame_url(&self, host: &str, path: &str) -> Result<Url, MfaError> {
        Ok(format!("{}://{}{}", self.scheme, host, path).parse()?)
    }

    pub async fn init_session(&self, tokens: &ChallengeTokens, parent: &Url) -> Result<MfaSession, MfaError> {
        let mut url = self.frame_url(&tokens.mfa_host, endpoints::FRAME_AUTH)?;
        url.query_pairs_mut().append_pair("tx", &tokens.transaction_sig);

        let request = FormRequest::new(url)
            .field("parent", parent.as_str())
            .field("java_version", "")
            .field("flash_version", "")
            .field("screen_resolution_width", endpoints::SCREEN_WIDTH)
            .field("screen_resolution_height", endpoints::SCREEN_HEIGHT)
            .field("color_depth", endpoints::COLOR_DEPTH);

        let page = self.transport.send(request).await.map_err(MfaError::FrameInit)?;
        // attribute entities are decoded once by the parser; no second unescape
        let document = markup::parse(&page.body);
        let sid = markup::input_value(&document, "sid")
            .filter(|sid| !sid.is_empty())
            .ok_or(MfaError::SessionIdNotFound)?;

        debug!(host = %tokens.mfa_host, "MFA frame session started");
        Ok(MfaSession {
            sid,
            host: tokens.mfa_host.clone(),
        })
    }

    pub fn choose_factor(&self) -> Result<FactorChoice, MfaError> {
        let options = FactorChoice::OPTIONS;
        let choice = self.prompter.choose(FACTOR_PROMPT, &options)?;

        let factor = match choice {
            0 => FactorChoice::Push,
            1 => FactorChoice::Call,
            2 => {
                let code = self.prompter.require_string(PASSCODE_PROMPT)?;
                if code.trim().is_empty() {
                    return Err(PromptError::EmptyInput(PASSCODE_PROMPT.to_string()).into());
                }
                FactorChoice::Passcode(code)
            }
            _ => {
                return Err(PromptError::InvalidChoice {
                    choice,
                    options: options.len(),
                }
                .into())
            }
        };
        Ok(factor)
    }

    /// Returns the txid of the started verification.
    pub async fn submit_factor(&self, session: &MfaSession, factor: &FactorChoice) -> Result<String, MfaError> {
        let url = self.frame_url(&session.host, endpoints::FRAME_PROMPT)?;
        let mut request = FormRequest::new(url)
            .field("sid", &session.sid)
            .field("device", endpoints::MFA_DEVICE)
            .field("factor", factor.label())
            .field("out_of_date", "false");
        if let FactorChoice::Passcode(code) = factor {
            request = request.field("passcode", code);
        }

        let page = self.transport.send(request).await.map_err(MfaError::FactorSubmit)?;
        let envelope = Envelope::<PromptResponse>::decode(&page.body);

        if envelope.stat.as_deref() != Some("OK") {
            let reason = envelope
                .message
                .unwrap_or_else(|| format!("frame answered stat {:?}", envelope.stat));
            return Err(MfaError::DeviceAuthFailed(reason));
        }

        let txid = envelope
            .response
            .and_then(|response| response.txid)
            .filter(|txid| !txid.is_empty())
            .ok_or_else(|| MfaError::DeviceAuthFailed("no transaction id issued".to_string()))?;

        info!(factor = ?factor, "MFA verification started");
        Ok(txid)
    }

    async fn check_status(&self, session: &MfaSession, txid: &str) -> Result<PollOutcome, MfaError> {
        let url = self.frame_url(&session.host, endpoints::FRAME_STATUS)?;
        let page = self
            .transport
            .send(session.request(url, txid))
            .await
            .map_err(MfaError::StatusPoll)?;
        let envelope = Envelope::<StatusResponse>::decode(&page.body);
        let status = envelope.response.unwrap_or_default();

        if let Some(text) = status.status.as_deref() {
            info!("{}", text);
        }
        Ok(PollOutcome::from_status(&status))
    }

    /// Polls until the frame reports a terminal result and returns the result path.
    pub async fn poll_until_terminal(&self, session: &MfaSession, txid: &str) -> Result<String, MfaError> {
        let statuses = stream::try_unfold(0u32, move |checked| async move {
            if checked > 0 {
                tokio::time::sleep(self.poll.interval).await;
            }
            let outcome = self.check_status(session, txid).await?;
            Ok::<_, MfaError>(Some((outcome, checked + 1)))
        });
        let limit = self.poll.max_attempts.map_or(usize::MAX, |n| n.get() as usize);
        let mut statuses = pin!(statuses.take(limit));

        let mut checked = 0u32;
        while let Some(outcome) = statuses.try_next().await? {
            checked += 1;
            match outcome {
                PollOutcome::Success(path) => return Ok(path),
                PollOutcome::Failure => {
                    return Err(MfaError::DeviceAuthFailed("failed to authenticate device".to_string()))
                }
                PollOutcome::Pending => debug!(checked, "MFA approval pending"),
            }
        }
        Err(MfaError::PollLimitExceeded(checked))
    }

    pub async fn fetch_result(
        &self,
        session: &MfaSession,
        txid: &str,
        result_path: &str,
    ) -> Result<ResultCookie, MfaError> {
        if result_path.is_empty() {
            return Err(MfaError::ResultCookieMissing);
        }
        let url = self.frame_url(&session.host, result_path)?;
        let page = self
            .transport
            .send(session.request(url, txid))
            .await
            .map_err(MfaError::ResultFetch)?;
        let envelope = Envelope::<ResultResponse>::decode(&page.body);

        envelope
            .response
            .and_then(|response| response.cookie)
            .filter(|cookie| !cookie.is_empty())
            .map(ResultCookie)
            .ok_or(MfaError::ResultCookieMissing)
    }
}
