use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};

pub const FLASH_COOKIE: &str = "flash";

/// One-shot notifications carried between requests in a cookie.
///
/// Extract it in a handler, then return it as part of the response so the
/// cookie is rewritten: messages added here show up on the next render, and
/// messages drained here are gone afterwards.
#[derive(Debug)]
pub struct Flash {
    jar: CookieJar,
    messages: Vec<String>,
    changed: bool,
}

impl Flash {
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        self.changed = true;
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        if !self.messages.is_empty() {
            self.changed = true;
        }
        std::mem::take(&mut self.messages)
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let messages = jar.get(FLASH_COOKIE).map(|c| decode(c.value())).unwrap_or_default();
        Ok(Self { jar, messages, changed: false })
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let jar = if !self.changed {
            self.jar
        } else if self.messages.is_empty() {
            self.jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
        } else {
            let cookie = Cookie::build((FLASH_COOKIE, encode(&self.messages)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(time::Duration::minutes(10));
            self.jar.add(cookie)
        };
        jar.into_response_parts(res)
    }
}

fn encode(messages: &[String]) -> String {
    let json = serde_json::to_string(messages).unwrap_or_else(|_| "[]".to_string());
    urlencoding::encode(&json).into_owned()
}

fn decode(value: &str) -> Vec<String> {
    urlencoding::decode(value)
        .ok()
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}
