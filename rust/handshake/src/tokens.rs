use crate::{endpoints, markup};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum TokenError {
    #[error("MFA challenge attribute {0} not found")]
    ChallengeTokensNotFound(&'static str),
    #[error("malformed signature request: expected 2 parts, found {0}")]
    MalformedSignature(usize),
    #[error("cannot build callback url from post action {0:?}")]
    InvalidPostAction(String),
}

/// The two halves of a `sig-request` value, `TX:APP`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignaturePair {
    pub transaction: String,
    pub app: String,
}

impl FromStr for SignaturePair {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = &s.split(':').collect::<Vec<_>>()[..];

        let [transaction, app] = parts else {
            return Err(TokenError::MalformedSignature(parts.len()));
        };
        if transaction.is_empty() || app.is_empty() {
            return Err(TokenError::MalformedSignature(parts.len()));
        }

        Ok(SignaturePair {
            transaction: transaction.to_string(),
            app: app.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeTokens {
    pub mfa_host: String,
    pub post_action: String,
    pub transaction_sig: String,
    pub app_sig: String,
}

impl ChallengeTokens {
    /// The gateway endpoint the frame reports back to: the gateway base with the post action appended.
    pub fn callback_url(&self, gateway: &Url) -> Result<Url, TokenError> {
        let base = gateway.as_str();
        let base = if self.post_action.starts_with('/') {
            base.trim_end_matches('/')
        } else {
            base
        };

        format!("{}{}", base, self.post_action)
            .parse()
            .map_err(|_| TokenError::InvalidPostAction(self.post_action.clone()))
    }
}

pub fn extract_tokens(fragment: &str) -> Result<ChallengeTokens, TokenError> {
    let document = markup::parse(fragment);
    let find = |attribute: &'static str| {
        markup::first_attribute(&document, attribute)
            .filter(|value| !value.is_empty())
            .ok_or(TokenError::ChallengeTokensNotFound(attribute))
    };

    let mfa_host = find(endpoints::ATTR_HOST)?;
    let sig_request = find(endpoints::ATTR_SIG_REQUEST)?;
    let post_action = find(endpoints::ATTR_POST_ACTION)?;

    let SignaturePair { transaction, app } = sig_request.parse()?;

    Ok(ChallengeTokens {
        mfa_host,
        post_action,
        transaction_sig: transaction,
        app_sig: app,
    })
}

#[cfg(test)]
mod tests {
    use super::{extract_tokens, ChallengeTokens, SignaturePair, TokenError};

    const HOST: &str = r#"data-host="api-1234.duosecurity.com""#;
    const SIG: &str = r#"data-sig-request="TX|dXNlcg==|abc:APP|dXNlcg==|def""#;
    const ACTION: &str = r#"data-post-action="/dag/module.php/duosecurity/getduo.php""#;

    fn fragment(attributes: &[&str]) -> String {
        format!(
            r#"<html><body><iframe id="duo_iframe" {}></iframe></body></html>"#,
            attributes.join(" ")
        )
    }

    #[test]
    fn test_extract_tokens() {
        let tokens = extract_tokens(&fragment(&[HOST, SIG, ACTION])).unwrap();
        assert_eq!(
            tokens,
            ChallengeTokens {
                mfa_host: "api-1234.duosecurity.com".to_string(),
                post_action: "/dag/module.php/duosecurity/getduo.php".to_string(),
                transaction_sig: "TX|dXNlcg==|abc".to_string(),
                app_sig: "APP|dXNlcg==|def".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_attribute() {
        assert_eq!(
            extract_tokens(&fragment(&[SIG, ACTION])),
            Err(TokenError::ChallengeTokensNotFound("data-host"))
        );
        assert_eq!(
            extract_tokens(&fragment(&[HOST, ACTION])),
            Err(TokenError::ChallengeTokensNotFound("data-sig-request"))
        );
        assert_eq!(
            extract_tokens(&fragment(&[HOST, SIG])),
            Err(TokenError::ChallengeTokensNotFound("data-post-action"))
        );
    }

    #[test]
    fn test_empty_attribute_is_missing() {
        assert_eq!(
            extract_tokens(&fragment(&[r#"data-host="""#, SIG, ACTION])),
            Err(TokenError::ChallengeTokensNotFound("data-host"))
        );
    }

    #[test]
    fn test_malformed_signature() {
        let unsplit = r#"data-sig-request="TX|abc""#;
        assert_eq!(
            extract_tokens(&fragment(&[HOST, unsplit, ACTION])),
            Err(TokenError::MalformedSignature(1))
        );
        assert_eq!("a:b:c".parse::<SignaturePair>(), Err(TokenError::MalformedSignature(3)));
        assert_eq!("a:".parse::<SignaturePair>(), Err(TokenError::MalformedSignature(2)));
    }

    #[test]
    fn test_callback_url() {
        let tokens = extract_tokens(&fragment(&[HOST, SIG, ACTION])).unwrap();

        let with_slash = tokens.callback_url(&"https://gw.example.com/".parse().unwrap()).unwrap();
        assert_eq!(
            with_slash.as_str(),
            "https://gw.example.com/dag/module.php/duosecurity/getduo.php"
        );

        let with_path = tokens.callback_url(&"https://sso.example.com/gateway".parse().unwrap()).unwrap();
        assert_eq!(
            with_path.as_str(),
            "https://sso.example.com/gateway/dag/module.php/duosecurity/getduo.php"
        );
    }
}
