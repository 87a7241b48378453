//! Actor extractor: attributes management calls to a caller.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use assethub_service::RequestContext;

/// Header carrying the caller's actor id.
pub const ACTOR_HEADER: &str = "x-actor";

/// Request context built from the `X-Actor` header.
///
/// The header is optional; a missing or blank value yields an anonymous
/// context. Identity is not verified here.
#[derive(Debug, Clone)]
pub struct Actor(pub RequestContext);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Actor(RequestContext::new(actor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("X-Actor", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let Actor(ctx) = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_actor_header() {
        assert_eq!(extract(Some(" ana ")).await.actor(), Some("ana"));
        assert_eq!(extract(Some("  ")).await.actor(), None);
        assert_eq!(extract(None).await.actor(), None);
    }
}
