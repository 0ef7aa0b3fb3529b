use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct AssertionOutput {
    #[serde(rename = "SAMLResponse")]
    saml_response: String,
}

impl From<String> for AssertionOutput {
    fn from(saml_response: String) -> Self {
        Self { saml_response }
    }
}
