//! Current-user identification.
//!
//! Every request acts as the single configured user. The user id travels in
//! a `userId` cookie; the middleware re-issues it whenever the incoming cookie
//! is missing or stale and exposes the id to handlers as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use super::state::AppState;
use crate::models::UserId;

pub const USER_COOKIE: &str = "userId";

/// Id of the user the request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

/// Read a cookie value from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

pub async fn identify_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let current = state.current_user;
    let cookie_matches = cookie_value(request.headers(), USER_COOKIE)
        .and_then(|raw| raw.parse::<UserId>().ok())
        == Some(current);

    request.extensions_mut().insert(CurrentUser(current));
    let mut response = next.run(request).await;

    if !cookie_matches {
        let cookie = format!("{}={}; Path=/; HttpOnly", USER_COOKIE, current);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode user cookie"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; userId=abc ; other=1"),
        );
        assert_eq!(cookie_value(&headers, USER_COOKIE), Some("abc"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_without_header() {
        assert_eq!(cookie_value(&HeaderMap::new(), USER_COOKIE), None);
    }
}
