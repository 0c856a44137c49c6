//! API middleware

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use core_kernel::{Actor, RequestContext};

use crate::error::ApiError;
use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and inserts the resulting [`Actor`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            warn!("Missing or invalid Authorization header");
            return Err(ApiError::Unauthorized);
        }
    };

    let actor = crate::auth::validate_token(token, &state.config.jwt_secret)
        .and_then(|claims| Actor::try_from(&claims))
        .map_err(|e| {
            warn!(error = %e, "Token validation failed");
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Captures client IP, user agent and arrival time as a [`RequestContext`]
///
/// The first `X-Forwarded-For` hop wins over the socket peer address.
pub async fn request_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let mut context = RequestContext::at(Utc::now());
    if let Some(ip) = forwarded_for(request.headers()).or(peer) {
        context = context.with_ip(ip);
    }
    if let Some(agent) = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
    {
        context = context.with_user_agent(agent);
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Access log middleware
pub async fn access_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user = request
        .extensions()
        .get::<Actor>()
        .map(|a| a.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    info!(
        method = %method,
        uri = %uri,
        user = %user,
        status = %response.status().as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(forwarded_for(&headers), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_for_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(forwarded_for(&headers), None);
        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }
}
