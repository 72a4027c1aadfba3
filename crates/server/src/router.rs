//! Method + regex path dispatcher.
//!
//! Routes are registered once through [`RouterBuilder`] and frozen into a [`PathRouter`].
//! Dispatch walks the table in registration order and hands the request to the first
//! entry whose method matches and whose pattern matches the whole path. The walk is
//! linear in the number of routes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::Response,
};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::envelope;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A request handler stored in the route table.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request) -> HandlerFuture {
        Box::pin(self(request))
    }
}

/// Capture groups of the matched route, in pattern order. Unmatched optional groups are
/// stored as empty strings so indexes stay stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathParams(Vec<String>);

impl PathParams {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Params injected by the router for `request`, if it was dispatched through one.
    pub fn of(request: &Request) -> Option<&PathParams> {
        request.extensions().get::<PathParams>()
    }
}

#[derive(Debug, Error)]
#[error("route pattern `{pattern}` for {method} does not compile: {source}")]
pub struct RouteError {
    pub method: Method,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

pub struct RouteEntry {
    method: Method,
    pattern: String,
    matcher: Regex,
    handler: Arc<dyn Handler>,
}

impl RouteEntry {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The pattern as registered, before anchoring.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn captures(&self, path: &str) -> Option<PathParams> {
        let captures = self.matcher.captures(path)?;
        let values = captures
            .iter()
            .skip(1)
            .map(|group| group.map(|group| group.as_str().to_string()).unwrap_or_default())
            .collect();
        Some(PathParams(values))
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<RouteEntry>,
}

impl RouterBuilder {
    /// Appends a route. The pattern must match the entire request path.
    pub fn route(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
    ) -> Result<Self, RouteError> {
        let matcher = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| RouteError {
            method: method.clone(),
            pattern: pattern.to_string(),
            source,
        })?;

        self.routes.push(RouteEntry {
            method,
            pattern: pattern.to_string(),
            matcher,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    pub fn build(self) -> PathRouter {
        PathRouter { routes: self.routes.into() }
    }
}

/// Immutable route table. Cloning shares the table.
#[derive(Clone, Debug)]
pub struct PathRouter {
    routes: Arc<[RouteEntry]>,
}

impl PathRouter {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub fn registered_routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub async fn dispatch(&self, mut request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let span = info_span!(
            "http.request",
            correlation_id = %Uuid::new_v4(),
            method = %method,
            path = %path
        );

        for entry in self.routes.iter() {
            if entry.method != method {
                continue;
            }
            let Some(params) = entry.captures(&path) else {
                continue;
            };

            span.in_scope(|| {
                debug!(
                    event_name = "http.route.matched",
                    pattern = %entry.pattern,
                    params = ?params,
                    "route matched"
                );
            });
            request.extensions_mut().insert(params);
            return entry.handler.call(request).instrument(span).await;
        }

        span.in_scope(|| {
            debug!(event_name = "http.route.unmatched", "no route matched request");
        });
        envelope::failure(StatusCode::NOT_FOUND, format!("no route matches {method} {path}"))
    }
}

/// Wraps the route table in an axum app. axum only supplies the HTTP plumbing; every
/// request lands in the fallback and is routed by [`PathRouter::dispatch`].
pub fn app(router: PathRouter) -> axum::Router {
    axum::Router::new().fallback(serve).with_state(router)
}

async fn serve(State(router): State<PathRouter>, request: Request) -> Response {
    router.dispatch(request).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{self, Method, StatusCode},
        response::{IntoResponse, Response},
    };
    use serde_json::Value;
    use std::future::Ready;

    use super::{PathParams, PathRouter};

    fn request(method: Method, uri: &str) -> Request {
        http::Request::builder().method(method).uri(uri).body(Body::empty()).expect("request")
    }

    fn echo(label: &'static str) -> impl Fn(Request) -> Ready<Response> + Send + Sync {
        move |request: Request| {
            let params = PathParams::of(&request).cloned().unwrap_or_default();
            let body = format!("{label}:{}", params.first().unwrap_or("-"));
            std::future::ready(body.into_response())
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn first_registered_match_wins_for_overlapping_patterns() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/([a-z0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .route(Method::GET, "/api/products/search", echo("search"))
            .expect("pattern compiles")
            .build();

        let response = router.dispatch(request(Method::GET, "/api/products/search")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "by-id:search");
    }

    #[tokio::test]
    async fn registration_order_decides_when_specific_route_comes_first() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/search", echo("search"))
            .expect("pattern compiles")
            .route(Method::GET, "/api/products/([a-z0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .build();

        let search = router.dispatch(request(Method::GET, "/api/products/search?q=tv")).await;
        let by_id = router.dispatch(request(Method::GET, "/api/products/181")).await;

        assert_eq!(body_text(search).await, "search:-");
        assert_eq!(body_text(by_id).await, "by-id:181");
    }

    #[tokio::test]
    async fn captures_are_injected_in_pattern_order() {
        let router = PathRouter::builder()
            .route(Method::GET, "/a/([0-9]+)/b/([a-z]+)", |request: Request| async move {
                let params = PathParams::of(&request).cloned().unwrap_or_default();
                let first = params.get(0).unwrap_or("");
                let second = params.get(1).unwrap_or("");
                format!("{}|{first}|{second}", params.len()).into_response()
            })
            .expect("pattern compiles")
            .build();

        let response = router.dispatch(request(Method::GET, "/a/42/b/xyz")).await;

        assert_eq!(body_text(response).await, "2|42|xyz");
    }

    #[tokio::test]
    async fn pattern_must_match_entire_path() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/([0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .build();

        let trailing = router.dispatch(request(Method::GET, "/api/products/12/extra")).await;
        let prefixed = router.dispatch(request(Method::GET, "/v2/api/products/12")).await;

        assert_eq!(trailing.status(), StatusCode::NOT_FOUND);
        assert_eq!(prefixed.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unmatched_request_gets_json_404_with_message() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/([0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .build();

        let response = router.dispatch(request(Method::GET, "/nowhere")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload: Value = serde_json::from_str(&body_text(response).await).expect("json body");
        let message = payload["error"].as_str().expect("error string");
        assert!(!message.is_empty());
        assert!(message.contains("/nowhere"));
        assert!(payload.get("resources").is_none());
    }

    #[tokio::test]
    async fn method_mismatch_is_treated_as_no_match() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/([0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .build();

        let response = router.dispatch(request(Method::POST, "/api/products/181")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_pattern_fails_at_registration() {
        let error = PathRouter::builder()
            .route(Method::GET, "/api/products/([0-9]+", echo("broken"))
            .expect_err("unbalanced group must not compile");

        assert_eq!(error.pattern, "/api/products/([0-9]+");
        assert!(error.to_string().contains("does not compile"));
    }

    #[test]
    fn registered_routes_preserve_order_and_patterns() {
        let router = PathRouter::builder()
            .route(Method::GET, "/api/products/([0-9]+)", echo("by-id"))
            .expect("pattern compiles")
            .route(Method::GET, "/api/products/search", echo("search"))
            .expect("pattern compiles")
            .build();

        let patterns: Vec<&str> =
            router.registered_routes().iter().map(|entry| entry.pattern()).collect();
        assert_eq!(patterns, vec!["/api/products/([0-9]+)", "/api/products/search"]);
        assert!(router.registered_routes().iter().all(|entry| *entry.method() == Method::GET));
    }
}
