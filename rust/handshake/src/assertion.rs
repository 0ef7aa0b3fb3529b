use crate::{endpoints, markup, transport::Page};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AssertionError {
    #[error("unable to locate SAMLResponse in gateway response")]
    AssertionNotFound,
}

/// Base64 encoded SAML response, exactly as the gateway posted it.
#[derive(Clone, PartialEq, Eq)]
pub struct SamlAssertion(String);

impl SamlAssertion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SamlAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SamlAssertion(<{} bytes>)", self.0.len())
    }
}

pub fn extract_assertion(page: &Page) -> Result<SamlAssertion, AssertionError> {
    let document = markup::parse(&page.body);
    markup::input_value(&document, endpoints::FIELD_SAML_RESPONSE)
        .filter(|value| !value.is_empty())
        .map(SamlAssertion)
        .ok_or(AssertionError::AssertionNotFound)
}
