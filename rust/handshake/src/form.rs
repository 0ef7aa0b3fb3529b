use crate::{
    config::LoginDetails,
    endpoints, markup,
    transport::{FormRequest, Page},
};
use scraper::ElementRef;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("unable to locate IDP authentication form submit URL")]
    MissingSubmitUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Identity,
    Secret,
    Passthrough,
}

impl FieldRole {
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("user") || name.contains("email") {
            FieldRole::Identity
        } else if name.contains("pass") {
            FieldRole::Secret
        } else {
            FieldRole::Passthrough
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub target: Url,
    pub fields: Vec<(String, String)>,
    /// `action` attributes the page declared. Kept for diagnostics only.
    pub declared_actions: Vec<String>,
}

impl FormSubmission {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }

    /// Builds the POST, pinned to the scheme, host and port `fetched` was served from.
    pub fn into_request(self, fetched: &Page) -> FormRequest {
        let url = match &fetched.location {
            Some(origin) => pin_origin(self.target, origin),
            None => self.target,
        };
        FormRequest { url, fields: self.fields }
    }
}

fn pin_origin(mut url: Url, origin: &Url) -> Url {
    // setters only refuse cannot-be-a-base urls, which a fetched page never has
    let _ = url.set_scheme(origin.scheme());
    let _ = url.set_host(origin.host_str());
    let _ = url.set_port(origin.port());
    url
}

pub fn extract_form(page: &Page, login: &LoginDetails) -> Result<FormSubmission, FormError> {
    let target = page.location.clone().ok_or(FormError::MissingSubmitUrl)?;
    let document = markup::parse(&page.body);

    let mut fields: Vec<_> = markup::elements(&document, "input")
        .filter_map(|input| field_value(input, login))
        .collect();
    fields.push((endpoints::FIELD_EVENT_PROCEED.to_string(), String::new()));

    let declared_actions = markup::elements(&document, "form")
        .filter_map(|form| form.value().attr("action"))
        .map(str::to_owned)
        .collect();

    Ok(FormSubmission {
        target,
        fields,
        declared_actions,
    })
}

fn field_value(input: ElementRef<'_>, login: &LoginDetails) -> Option<(String, String)> {
    let name = input.value().attr("name")?;
    if name == endpoints::FIELD_EVENT_PROCEED {
        return None;
    }

    let value = match FieldRole::classify(name) {
        FieldRole::Identity => login.username.clone(),
        FieldRole::Secret => login.password.clone(),
        FieldRole::Passthrough => input.value().attr("value")?.to_string(),
    };
    Some((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::{extract_form, FieldRole, FormError};
    use crate::{config::LoginDetails, transport::Page};
    use url::Url;

    fn login() -> LoginDetails {
        LoginDetails::new("https://gw.example.com".parse().unwrap(), "alice", "s3cret")
    }

    fn login_page(body: &str) -> Page {
        Page::new("https://gw.example.com/dag/module.php/login?AuthState=xyz".parse().unwrap(), body)
    }

    #[test]
    fn test_classify_field_names() {
        assert_eq!(FieldRole::classify("j_username"), FieldRole::Identity);
        assert_eq!(FieldRole::classify("EMAIL"), FieldRole::Identity);
        assert_eq!(FieldRole::classify("Passwd"), FieldRole::Secret);
        assert_eq!(FieldRole::classify("csrf_token"), FieldRole::Passthrough);
    }

    #[test]
    fn test_login_form_with_hidden_field() {
        let page = login_page(
            r#"<form method="post">
                <input type="text" name="username">
                <input type="password" name="password">
                <input type="hidden" name="csrf" value="abc123">
            </form>"#,
        );

        let form = extract_form(&page, &login()).unwrap();

        assert_eq!(form.get("username"), Some("alice"));
        assert_eq!(form.get("password"), Some("s3cret"));
        assert_eq!(form.get("csrf"), Some("abc123"));
        assert_eq!(form.get("_eventId_proceed"), Some(""));
        assert_eq!(form.fields.len(), 4);
    }

    #[test]
    fn test_unnamed_and_unvalued_inputs_are_skipped() {
        let page = login_page(
            r#"<form>
                <input type="text" value="no-name">
                <input type="checkbox" name="remember">
                <input type="hidden" name="state" value="">
                <input type="submit" value="Log in">
            </form>"#,
        );

        let form = extract_form(&page, &login()).unwrap();

        assert!(form.fields.iter().all(|(_, v)| v != "no-name" && v != "Log in"));
        assert_eq!(form.get("remember"), None);
        assert_eq!(form.get("state"), Some(""));
        assert_eq!(form.fields.len(), 2);
    }

    #[test]
    fn test_event_proceed_added_exactly_once() {
        for inputs in [0, 1, 7] {
            let body = (0..inputs)
                .map(|i| format!(r#"<input name="f{i}" value="v{i}">"#))
                .collect::<String>();
            let form = extract_form(&login_page(&body), &login()).unwrap();
            let proceeds = form.fields.iter().filter(|(k, _)| k == "_eventId_proceed").count();
            assert_eq!(proceeds, 1, "with {} inputs", inputs);
        }

        let page = login_page(r#"<input type="submit" name="_eventId_proceed" value="Login">"#);
        let form = extract_form(&page, &login()).unwrap();
        assert_eq!(form.fields, vec![("_eventId_proceed".to_string(), String::new())]);
    }

    #[test]
    fn test_declared_action_does_not_override_location() {
        let page = login_page(r#"<form action="https://elsewhere.example.org/post"><input name="user"></form>"#);

        let form = extract_form(&page, &login()).unwrap();

        assert_eq!(form.target, page.location.clone().unwrap());
        assert_eq!(form.declared_actions, vec!["https://elsewhere.example.org/post".to_string()]);
    }

    #[test]
    fn test_missing_location() {
        let page = Page::detached(r#"<input name="username">"#);
        let result = extract_form(&page, &login());
        assert!(matches!(result, Err(FormError::MissingSubmitUrl)));
    }

    #[test]
    fn test_request_pinned_to_fetched_origin() {
        let page = login_page(r#"<input name="username">"#);
        let mut form = extract_form(&page, &login()).unwrap();
        form.target = "http://gw.internal:8080/dag/module.php/login?AuthState=xyz".parse().unwrap();

        let request = form.into_request(&page);

        let expected: Url = "https://gw.example.com/dag/module.php/login?AuthState=xyz".parse().unwrap();
        assert_eq!(request.url, expected);
        assert_eq!(request.get("username"), Some("alice"));
    }
}
