pub mod contacts;
pub mod session;

use std::convert::Infallible;

use anyhow::Error;
use askama::Template;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::ACCEPT, request::Parts, StatusCode},
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use once_cell::sync::Lazy;
use serde::Serialize;
use url::Url;

use crate::store::ContactStore;
use session::{session_layer, Sessions};

#[derive(Clone, Copy, FromRef)]
pub struct AppState {
    pub store: &'static ContactStore,
    pub sessions: &'static Sessions,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(contacts::index))
        .route(
            "/add_contact",
            get(contacts::add_contact_page).post(contacts::add_contact),
        )
        .route("/edit_contact/:category/:name", get(contacts::edit_contact))
        .route(
            "/update_contact/:category/:name",
            post(contacts::update_contact),
        )
        .route("/contact/:name", get(contacts::contact))
        .route("/categories/:category", get(contacts::category))
        .route(
            "/delete_contact/:category/:name",
            get(contacts::delete_contact).post(contacts::delete_contact),
        )
        .route(
            "/delete_category/:category",
            get(contacts::delete_category).post(contacts::delete_category),
        )
        .layer(from_fn_with_state(state, session_layer))
        .with_state(state)
}

/// Builds an absolute path from percent-encoded segments.
pub fn path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    static BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").unwrap());

    let mut url = BASE.clone();

    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }

    url.path().to_owned()
}

#[derive(Debug, Clone, Copy)]
pub enum Accept {
    Unspecified,
    Html,
    Json,
}

impl Accept {
    pub fn into_response<P>(self, page: P) -> Response
    where
        P: Template + Serialize,
    {
        match self {
            Accept::Unspecified | Accept::Html => match page.render() {
                Ok(page) => Html(page).into_response(),
                Err(err) => ServerError::from(err).into_response(),
            },
            Accept::Json => Json(page).into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Accept
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(accept) = parts
            .headers
            .get(ACCEPT)
            .and_then(|header| header.to_str().ok())
        {
            if accept.contains("text/html") {
                return Ok(Self::Html);
            } else if accept.contains("application/json") {
                return Ok(Self::Json);
            }
        }

        Ok(Self::Unspecified)
    }
}

pub struct ServerError(Error);

impl<E> From<E> for ServerError
where
    Error: From<E>,
{
    fn from(err: E) -> Self {
        Self(Error::from(err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to handle request: {:#}", self.0);

        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_path_segments() {
        assert_eq!(path(["categories", "Friends"]), "/categories/Friends");
        assert_eq!(
            path(["delete_contact", "Close Friends", "Bob/Alice"]),
            "/delete_contact/Close%20Friends/Bob%2FAlice"
        );
        assert_eq!(path(["add_contact"]), "/add_contact");
    }
}
