use crate::{
    assertion::{self, AssertionError, SamlAssertion},
    config::{AccountConfig, LoginDetails, MfaPreference},
    endpoints,
    form::{self, FormError},
    mfa::{MfaDriver, MfaError},
    prompt::Prompter,
    tokens::{self, TokenError},
    transport::{FormRequest, Page, Transport, TransportError},
};
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument, Span};
use url::Url;

#[derive(Error, Debug)]
pub enum HandshakeError {
    #[error("invalid gateway url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("error retrieving form")]
    InitialFetch(#[source] TransportError),
    #[error("error building authentication request")]
    Form(#[from] FormError),
    #[error("error retrieving login form results")]
    CredentialSubmit(#[source] TransportError),
    #[error("error reading MFA challenge")]
    Tokens(#[from] TokenError),
    #[error("error verifying MFA")]
    Mfa(#[from] MfaError),
    #[error("error retrieving verify response")]
    Callback(#[source] TransportError),
    #[error("error extracting SAMLResponse blob from final gateway response")]
    Assertion(#[from] AssertionError),
}

/// Failure taxonomy callers can branch on without matching the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    MissingSubmitUrl,
    ChallengeTokensNotFound,
    MalformedSignature,
    SessionIdNotFound,
    ResultCookieMissing,
    AssertionNotFound,
    MfaDeviceAuthFailed,
    Prompt,
    PollLimitExceeded,
}

impl HandshakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HandshakeError::InvalidUrl(_)
            | HandshakeError::InitialFetch(_)
            | HandshakeError::CredentialSubmit(_)
            | HandshakeError::Callback(_) => ErrorKind::Transport,
            HandshakeError::Form(FormError::MissingSubmitUrl) => ErrorKind::MissingSubmitUrl,
            HandshakeError::Tokens(TokenError::MalformedSignature(_)) => ErrorKind::MalformedSignature,
            HandshakeError::Tokens(_) => ErrorKind::ChallengeTokensNotFound,
            HandshakeError::Mfa(e) => e.kind(),
            HandshakeError::Assertion(AssertionError::AssertionNotFound) => ErrorKind::AssertionNotFound,
        }
    }
}

impl MfaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MfaError::FrameInit(_)
            | MfaError::FactorSubmit(_)
            | MfaError::StatusPoll(_)
            | MfaError::ResultFetch(_) => ErrorKind::Transport,
            MfaError::InvalidUrl(_) => ErrorKind::ChallengeTokensNotFound,
            MfaError::SessionIdNotFound => ErrorKind::SessionIdNotFound,
            MfaError::Prompt(_) => ErrorKind::Prompt,
            MfaError::DeviceAuthFailed(_) => ErrorKind::MfaDeviceAuthFailed,
            MfaError::ResultCookieMissing => ErrorKind::ResultCookieMissing,
            MfaError::PollLimitExceeded(_) => ErrorKind::PollLimitExceeded,
        }
    }
}

/// Signs a user in through the gateway and returns the SAML assertion it issues.
///
/// The transport must not be shared with another handshake running at the same time: its cookie
/// jar carries the MFA frame session.
pub struct Handshake<T, P> {
    transport: T,
    prompter: P,
    config: AccountConfig,
    span: Option<Span>,
}

impl<T: Transport, P: Prompter> Handshake<T, P> {
    pub fn new(transport: T, prompter: P, config: AccountConfig) -> Self {
        Self {
            transport,
            prompter,
            config,
            span: None,
        }
    }

    /// Records every handshake event under `span` instead of a fresh `handshake` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub async fn authenticate(&self, login: &LoginDetails) -> Result<SamlAssertion, HandshakeError> {
        let span = self
            .span
            .clone()
            .unwrap_or_else(|| info_span!("handshake", gateway = %login.url));
        self.run(login).instrument(span).await
    }

    async fn run(&self, login: &LoginDetails) -> Result<SamlAssertion, HandshakeError> {
        let sso_url = self.sso_url(&login.url)?;
        info!(url = %sso_url, "retrieving gateway login form");
        let page = self
            .transport
            .get(sso_url)
            .await
            .map_err(HandshakeError::InitialFetch)?;

        let submission = form::extract_form(&page, login)?;
        debug!(
            url = %submission.target,
            fields = submission.fields.len(),
            declared_actions = ?submission.declared_actions,
            "submitting credentials"
        );
        let mut working = self
            .transport
            .send(submission.into_request(&page))
            .await
            .map_err(HandshakeError::CredentialSubmit)?;

        match self.config.mfa {
            MfaPreference::Auto => working = self.verify_mfa(&login.url, &working).await?,
            MfaPreference::Deferred => debug!("MFA left to the caller"),
        }

        let assertion = assertion::extract_assertion(&working)?;
        info!(bytes = assertion.as_str().len(), "SAML assertion retrieved");
        Ok(assertion)
    }

    fn sso_url(&self, gateway: &Url) -> Result<Url, HandshakeError> {
        let mut url: Url = format!("{}{}", gateway.as_str().trim_end_matches('/'), endpoints::SSO_SERVICE).parse()?;
        url.query_pairs_mut()
            .append_pair(endpoints::SP_ENTITY_ID_PARAM, &self.config.sp_entity_id);
        Ok(url)
    }

    async fn verify_mfa(&self, gateway: &Url, page: &Page) -> Result<Page, HandshakeError> {
        let tokens = tokens::extract_tokens(&page.body)?;
        let parent = tokens.callback_url(gateway)?;
        info!(host = %tokens.mfa_host, "gateway requested MFA");

        let driver = MfaDriver::new(&self.transport, &self.prompter, &self.config);
        let cookie = driver.verify(&tokens, &parent).await?;

        let request = FormRequest::new(parent)
            .field(endpoints::FIELD_EVENT, endpoints::EVENT_PROCEED)
            .field(endpoints::FIELD_SIG_RESPONSE, cookie.into_sig_response(&tokens.app_sig));
        self.transport.send(request).await.map_err(HandshakeError::Callback)
    }
}
