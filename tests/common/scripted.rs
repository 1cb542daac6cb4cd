//! Scripted request sender
//!
//! Answers requests by method and URL fragment, in registration order, and
//! records every request it receives. Unscripted requests get a 404.

#![allow(dead_code)]

use async_trait::async_trait;
use circleci_weigh_in::infra::{HttpRequest, HttpResponse, Method, RequestSender, TransportError};
use serde_json::Value;
use std::sync::{Arc, Mutex};

struct Route {
    method: Method,
    fragment: String,
    response: Result<HttpResponse, TransportError>,
}

/// Fake GitHub and CircleCI
#[derive(Default)]
pub struct ScriptedSender {
    routes: Mutex<Vec<Route>>,
    sent: Mutex<Vec<HttpRequest>>,
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

impl ScriptedSender {
    /// Sender without routes
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn route(self: Arc<Self>, method: Method, fragment: &str, response: Result<HttpResponse, TransportError>) -> Arc<Self> {
        self.routes.lock().unwrap().push(Route {
            method,
            fragment: fragment.to_string(),
            response,
        });
        self
    }

    /// Answer GETs whose URL contains `fragment` with a JSON body
    pub fn on_get(self: Arc<Self>, fragment: &str, status: u16, body: Value) -> Arc<Self> {
        self.on_get_text(fragment, status, &body.to_string())
    }

    /// Answer GETs whose URL contains `fragment` with a raw body
    pub fn on_get_text(self: Arc<Self>, fragment: &str, status: u16, body: &str) -> Arc<Self> {
        let response = Ok(HttpResponse {
            status,
            status_text: status_text(status).to_string(),
            body: body.to_string(),
        });
        self.route(Method::Get, fragment, response)
    }

    /// Answer POSTs whose URL contains `fragment`
    pub fn on_post(self: Arc<Self>, fragment: &str, status: u16, body: Value) -> Arc<Self> {
        let response = Ok(HttpResponse {
            status,
            status_text: status_text(status).to_string(),
            body: body.to_string(),
        });
        self.route(Method::Post, fragment, response)
    }

    /// Fail GETs whose URL contains `fragment` at the transport level
    pub fn fail_get(self: Arc<Self>, fragment: &str, reason: &str) -> Arc<Self> {
        self.route(Method::Get, fragment, Err(TransportError(reason.to_string())))
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Requests whose URL contains `fragment`
    pub fn requests_to(&self, fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.contains(fragment))
            .collect()
    }

    /// Decoded bodies of the POSTed commit statuses, in order
    pub fn posted_statuses(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == Method::Post && request.url.contains("/statuses/"))
            .filter_map(|request| request.body)
            .map(|body| serde_json::from_str(&body).unwrap())
            .collect()
    }
}

#[async_trait]
impl RequestSender for ScriptedSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());

        let routes = self.routes.lock().unwrap();
        let route = routes
            .iter()
            .find(|route| route.method == request.method && request.url.contains(&route.fragment));

        match route {
            Some(route) => route.response.clone(),
            None => Ok(HttpResponse {
                status: 404,
                status_text: status_text(404).to_string(),
                body: String::new(),
            }),
        }
    }
}
