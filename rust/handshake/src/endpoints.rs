use const_format::concatcp;

mod prefix {
    pub(super) const GATEWAY: &str = "/dag";
    pub(super) const FRAME: &str = "/frame";
}

pub(crate) const SSO_SERVICE: &str = concatcp!(prefix::GATEWAY, "/", "saml2/idp/SSOService.php");
pub(crate) const SP_ENTITY_ID_PARAM: &str = "spentityid";

pub(crate) const FRAME_AUTH: &str = concatcp!(prefix::FRAME, "/", "web/v1/auth");
pub(crate) const FRAME_PROMPT: &str = concatcp!(prefix::FRAME, "/", "prompt");
pub(crate) const FRAME_STATUS: &str = concatcp!(prefix::FRAME, "/", "status");

/// Service-provider id the gateway deployment issues assertions for.
pub const DEFAULT_SP_ENTITY_ID: &str = "DI8ESCQGSFOJRBUQSBVI";

pub(crate) const FIELD_EVENT_PROCEED: &str = "_eventId_proceed";
pub(crate) const FIELD_EVENT: &str = "_eventId";
pub(crate) const EVENT_PROCEED: &str = "proceed";
pub(crate) const FIELD_SIG_RESPONSE: &str = "sig_response";
pub(crate) const FIELD_SAML_RESPONSE: &str = "SAMLResponse";

pub(crate) const ATTR_HOST: &str = "data-host";
pub(crate) const ATTR_SIG_REQUEST: &str = "data-sig-request";
pub(crate) const ATTR_POST_ACTION: &str = "data-post-action";

pub(crate) const MFA_DEVICE: &str = "phone1";

// browser fingerprint the frame expects on session init
pub(crate) const SCREEN_WIDTH: &str = "3008";
pub(crate) const SCREEN_HEIGHT: &str = "1692";
pub(crate) const COLOR_DEPTH: &str = "24";
