//! Client side of the Duo Access Gateway sign-in: credential form, Duo frame MFA, SAML assertion.
//!
//! [`Handshake::authenticate`] runs the whole exchange over a caller supplied [`Transport`], asking a
//! [`Prompter`] which MFA factor to use.

pub mod assertion;
pub mod config;
mod endpoints;
pub mod form;
pub mod handshake;
mod markup;
pub mod mfa;
pub mod prompt;
pub mod tokens;
pub mod transport;

#[cfg(test)]
mod testing;

pub use crate::{
    assertion::SamlAssertion,
    config::{AccountConfig, LoginDetails, MfaPreference, PollPolicy},
    endpoints::DEFAULT_SP_ENTITY_ID,
    handshake::{ErrorKind, Handshake, HandshakeError},
    prompt::{PromptError, Prompter},
    transport::{FormRequest, Page, ReqwestTransport, Transport, TransportError},
};
