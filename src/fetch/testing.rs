//! In-memory gateway for unit tests

use crate::fetch::{FetchFailure, FetchFailureKind, FetchGateway, FetchOutcome, HttpResponse, Method};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone)]
enum Scripted {
    Response(HttpResponse),
    Failure(FetchFailureKind),
}

/// Answers requests from a fixed script; unknown URLs get a 404
#[derive(Default)]
pub struct ScriptedGateway {
    any_method: HashMap<String, Scripted>,
    by_method: HashMap<(String, Method), Scripted>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: Mutex<Vec<(Method, String)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, response: HttpResponse) -> Self {
        self.any_method
            .insert(url.to_string(), Scripted::Response(response));
        self
    }

    pub fn respond_to(mut self, method: Method, url: &str, response: HttpResponse) -> Self {
        self.by_method
            .insert((url.to_string(), method), Scripted::Response(response));
        self
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.respond(
            url,
            HttpResponse::new(200)
                .with_header("content-type", "text/html; charset=utf-8")
                .with_body(html),
        )
    }

    pub fn text(self, url: &str, body: &str) -> Self {
        self.respond(
            url,
            HttpResponse::new(200)
                .with_header("content-type", "text/plain")
                .with_body(body),
        )
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.respond(url, HttpResponse::new(status))
    }

    pub fn redirect(self, url: &str, status: u16, location: &str) -> Self {
        self.respond(url, HttpResponse::new(status).with_header("location", location))
    }

    pub fn fail(mut self, url: &str, kind: FetchFailureKind) -> Self {
        self.any_method
            .insert(url.to_string(), Scripted::Failure(kind));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, u)| u == url)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchGateway for ScriptedGateway {
    async fn fetch(&self, url: &str, method: Method, _timeout: Duration) -> FetchOutcome {
        self.log.lock().unwrap().push((method, url.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .by_method
            .get(&(url.to_string(), method))
            .or_else(|| self.any_method.get(url))
            .cloned();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Scripted::Response(mut response)) => {
                if method == Method::Head {
                    response.body.clear();
                }
                Ok(response)
            }
            Some(Scripted::Failure(kind)) => Err(FetchFailure::new(url, kind, "scripted failure")),
            None => Ok(HttpResponse::new(404)),
        }
    }
}
