use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::contact::{ContactForm, EditContext};

const COOKIE_NAME: &str = "session";

/// Short-lived per-browser state carried across redirects.
#[derive(Default)]
pub struct Sessions {
    sessions: Mutex<HashMap<Uuid, SessionData>>,
}

struct SessionData {
    last_access: Instant,
    flashes: Vec<Flash>,
    form: Option<ContactForm>,
    original: Option<EditContext>,
}

impl SessionData {
    fn new() -> Self {
        Self {
            last_access: Instant::now(),
            flashes: Vec::new(),
            form: None,
            original: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl Sessions {
    /// Returns the id of a live session, or a fresh id if `id` is unknown.
    ///
    /// Fresh ids are not stored until something is written to them.
    fn resume(&self, id: Option<Uuid>) -> (Uuid, bool) {
        if let Some(id) = id {
            if let Some(data) = self.sessions.lock().get_mut(&id) {
                data.last_access = Instant::now();

                return (id, false);
            }
        }

        (Uuid::new_v4(), true)
    }

    fn contains(&self, id: Uuid) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    /// Drops sessions which were not accessed for longer than `lifetime`.
    pub fn expire(&self, lifetime: Duration) -> usize {
        let mut sessions = self.sessions.lock();

        let len = sessions.len();

        sessions.retain(|_id, data| data.last_access.elapsed() <= lifetime);

        len - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F, T>(&self, id: Uuid, f: F) -> T
    where
        F: FnOnce(&mut SessionData) -> T,
    {
        let mut sessions = self.sessions.lock();

        f(sessions.entry(id).or_insert_with(SessionData::new))
    }

    fn inspect<F, T>(&self, id: Uuid, f: F) -> Option<T>
    where
        F: FnOnce(&mut SessionData) -> T,
    {
        self.sessions.lock().get_mut(&id).map(f)
    }
}

/// Attaches a session to every request and issues a cookie once a new one was written to.
pub async fn session_layer<B>(
    State(sessions): State<&'static Sessions>,
    mut req: Request<B>,
    next: Next<B>,
) -> Response {
    let (id, created) = sessions.resume(cookie_session_id(req.headers().get_all(COOKIE)));

    req.extensions_mut().insert(Session { id, sessions });

    let mut resp = next.run(req).await;

    if created && sessions.contains(id) {
        tracing::debug!("Started session {}", id);

        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, id);

        if let Ok(val) = HeaderValue::from_str(&cookie) {
            resp.headers_mut().append(SET_COOKIE, val);
        }
    }

    resp
}

fn cookie_session_id<'a, I>(headers: I) -> Option<Uuid>
where
    I: IntoIterator<Item = &'a HeaderValue>,
{
    headers
        .into_iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(COOKIE_NAME)?.strip_prefix('='))
        .find_map(|val| Uuid::parse_str(val).ok())
}

#[derive(Clone, Copy)]
pub struct Session {
    id: Uuid,
    sessions: &'static Sessions,
}

impl Session {
    pub fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        let message = message.into();

        self.sessions.update(self.id, |data| {
            data.flashes.push(Flash { kind, message });
        });
    }

    pub fn take_flashes(&self) -> Vec<Flash> {
        self.sessions
            .inspect(self.id, |data| std::mem::take(&mut data.flashes))
            .unwrap_or_default()
    }

    pub fn remember_form(&self, form: ContactForm) {
        self.sessions.update(self.id, |data| data.form = Some(form));
    }

    pub fn take_form(&self) -> Option<ContactForm> {
        self.sessions
            .inspect(self.id, |data| data.form.take())
            .flatten()
    }

    pub fn begin_edit(&self, original: EditContext) {
        self.sessions
            .update(self.id, |data| data.original = Some(original));
    }

    pub fn pending_edit(&self) -> Option<EditContext> {
        self.sessions
            .inspect(self.id, |data| data.original.clone())
            .flatten()
    }

    pub fn take_edit(&self) -> Option<EditContext> {
        self.sessions
            .inspect(self.id, |data| data.original.take())
            .flatten()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .copied()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Session layer missing"))
    }
}
