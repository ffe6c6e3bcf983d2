//! In-memory fakes shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::datatracker::{Document, Event, EventId, EventPage, EventSource, FetchError, PageMeta};
use crate::publish::{Connector, PostError, StatusPoster};

pub const GROUP_DOC: &str = "/api/v1/doc/document/draft-ietf-tls-example/";

/// Link used for page `n` (1-based, page 1 is the latest).
pub fn page_link(n: usize) -> String {
    format!("/api/v1/doc/docevent/?offset={}", (n - 1) * 3)
}

pub fn event(id: EventId, kind: &str) -> Event {
    Event {
        id,
        kind: kind.to_string(),
        description: String::new(),
        document_ref: GROUP_DOC.to_string(),
    }
}

/// A feed made of fixed pages, each given newest-first.
#[derive(Default)]
pub struct FakeFeed {
    pages: Vec<Vec<Event>>,
    documents: HashMap<String, Document>,
    failing_pages: Vec<usize>,
    fail_documents: bool,
    pub page_requests: AtomicUsize,
    pub document_requests: AtomicUsize,
}

impl FakeFeed {
    /// Pages of ids, newest-first within and across pages.
    pub fn with_ids(pages: &[&[EventId]], kind: &str) -> Self {
        let pages = pages
            .iter()
            .map(|ids| ids.iter().map(|&id| event(id, kind)).collect())
            .collect();
        Self::with_pages(pages)
    }

    pub fn with_pages(pages: Vec<Vec<Event>>) -> Self {
        let mut feed = Self {
            pages,
            ..Self::default()
        };
        feed.documents.insert(
            GROUP_DOC.to_string(),
            Document {
                name: "draft-ietf-tls-example".to_string(),
                title: "Example Protocol".to_string(),
                rev: None,
            },
        );
        feed
    }

    pub fn with_document(mut self, reference: &str, document: Document) -> Self {
        self.documents.insert(reference.to_string(), document);
        self
    }

    /// Make fetching page `n` (1-based) fail.
    pub fn failing_page(mut self, n: usize) -> Self {
        self.failing_pages.push(n);
        self
    }

    pub fn failing_documents(mut self) -> Self {
        self.fail_documents = true;
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    fn serve(&self, n: usize) -> Result<EventPage, FetchError> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        if self.failing_pages.contains(&n) {
            return Err(unavailable(&page_link(n)));
        }
        let objects = self.pages.get(n - 1).cloned().unwrap_or_default();
        let next = (n < self.pages.len()).then(|| page_link(n + 1));
        Ok(EventPage {
            objects,
            meta: PageMeta { next },
        })
    }
}

fn unavailable(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[async_trait]
impl EventSource for FakeFeed {
    async fn latest_page(&self) -> Result<EventPage, FetchError> {
        self.serve(1)
    }

    async fn page(&self, link: &str) -> Result<EventPage, FetchError> {
        let n = (1..=self.pages.len() + 1)
            .find(|&n| page_link(n) == link)
            .ok_or_else(|| unavailable(link))?;
        self.serve(n)
    }

    async fn document(&self, reference: &str) -> Result<Document, FetchError> {
        self.document_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_documents {
            return Err(unavailable(reference));
        }
        self.documents
            .get(reference)
            .cloned()
            .ok_or_else(|| unavailable(reference))
    }
}

/// Scripted responses for a fake publishing session.
///
/// Each post pops the next scripted result; once the script runs out every
/// post succeeds. Every attempted message is recorded.
#[derive(Clone, Default)]
pub struct ScriptedPoster {
    script: Arc<Mutex<VecDeque<Result<(), PostError>>>>,
    pub attempts: Arc<Mutex<Vec<String>>>,
    pub connects: Arc<AtomicUsize>,
}

impl ScriptedPoster {
    pub fn new(script: Vec<Result<(), PostError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

pub fn api_error(code: u32) -> PostError {
    PostError::Api {
        status: StatusCode::FORBIDDEN,
        code: Some(code),
        message: format!("error {code}"),
    }
}

#[async_trait]
impl StatusPoster for ScriptedPoster {
    async fn post_status(&self, text: &str) -> Result<(), PostError> {
        self.attempts.lock().unwrap().push(text.to_string());
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

impl Connector for ScriptedPoster {
    type Session = Self;

    fn connect(&self) -> Result<Self::Session, PostError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}
