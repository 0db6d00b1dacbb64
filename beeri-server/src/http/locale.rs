//! Per-request locale negotiation
//!
//! The `locale` cookie wins over `Accept-Language`; Hebrew otherwise.
//! Handlers can read the negotiated [`Locale`] from request extensions.
//! Error bodies are rendered in Hebrew and re-rendered here for Russian.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use beeri_core::Locale;

use super::error::ErrorReport;

pub const LOCALE_COOKIE: &str = "locale";

pub fn negotiate(headers: &HeaderMap) -> Locale {
    let jar = CookieJar::from_headers(headers);
    let cookie = jar.get(LOCALE_COOKIE).map(|c| c.value());
    let accept = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
    Locale::negotiate(cookie, accept)
}

pub async fn localize(mut request: Request, next: Next) -> Response {
    let locale = negotiate(request.headers());
    request.extensions_mut().insert(locale);

    let response = next.run(request).await;
    if locale == Locale::default() {
        return response;
    }

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    let body = report.body(locale).to_string();
    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn cookie_beats_accept_language() {
        let h = headers(&[(COOKIE, "theme=dark; locale=ru"), (ACCEPT_LANGUAGE, "he-IL")]);
        assert_eq!(negotiate(&h), Locale::Ru);
    }

    #[test]
    fn falls_back_to_header_then_hebrew() {
        assert_eq!(negotiate(&headers(&[(ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9")])), Locale::Ru);
        assert_eq!(negotiate(&headers(&[(ACCEPT_LANGUAGE, "en-US")])), Locale::He);
        assert_eq!(negotiate(&HeaderMap::new()), Locale::He);
    }
}
