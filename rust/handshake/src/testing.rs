use crate::{
    prompt::{PromptError, Prompter},
    transport::{FormRequest, Page, Transport, TransportError},
};
use anyhow::anyhow;
use std::{cell::RefCell, collections::VecDeque};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Recorded {
    Get(Url),
    Post(FormRequest),
}

impl Recorded {
    pub(crate) fn url(&self) -> &Url {
        match self {
            Recorded::Get(url) => url,
            Recorded::Post(request) => &request.url,
        }
    }

    pub(crate) fn form(&self) -> Option<&FormRequest> {
        match self {
            Recorded::Get(_) => None,
            Recorded::Post(request) => Some(request),
        }
    }
}

/// Answers requests from a fixed script, in order, and records what was asked.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: RefCell<VecDeque<Result<Page, TransportError>>>,
    requests: RefCell<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then_page(self, page: Page) -> Self {
        self.script.borrow_mut().push_back(Ok(page));
        self
    }

    pub(crate) fn then_body(self, body: &str) -> Self {
        self.then_page(Page::detached(body))
    }

    pub(crate) fn then_fail(self, reason: &str) -> Self {
        self.script.borrow_mut().push_back(Err(anyhow!(reason.to_string()).into()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url().path().to_string()).collect()
    }

    fn answer(&self, recorded: Recorded) -> Result<Page, TransportError> {
        let url = recorded.url().clone();
        self.requests.borrow_mut().push(recorded);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("script exhausted at {}", url).into()))
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: Url) -> Result<Page, TransportError> {
        self.answer(Recorded::Get(url))
    }

    async fn send(&self, request: FormRequest) -> Result<Page, TransportError> {
        self.answer(Recorded::Post(request))
    }
}

pub(crate) struct ScriptedPrompter {
    choice: usize,
    answer: String,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub(crate) fn choosing(choice: usize) -> Self {
        ScriptedPrompter {
            choice,
            answer: String::new(),
            asked: RefCell::new(vec![]),
        }
    }

    pub(crate) fn answering(mut self, answer: &str) -> Self {
        self.answer = answer.to_string();
        self
    }

    pub(crate) fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&self, prompt: &str, _options: &[&str]) -> Result<usize, PromptError> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self.choice)
    }

    fn require_string(&self, prompt: &str) -> Result<String, PromptError> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}
