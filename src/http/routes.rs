//! External route groups.
//!
//! Authentication and messaging handlers live outside this crate. They are
//! supplied as finished routers and mounted behind the dispatcher, so every
//! handler can take the connection handle via `Extension`.

use axum::Router;

pub const AUTH_PREFIX: &str = "/api/auth";
pub const MESSAGES_PREFIX: &str = "/api/messages";

/// The delegated route groups. Unset groups are simply not mounted.
#[derive(Default)]
pub struct RouteGroups {
    pub auth: Option<Router>,
    pub messages: Option<Router>,
}

impl RouteGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `router` under `/api/auth`.
    pub fn with_auth(mut self, router: Router) -> Self {
        self.auth = Some(router);
        self
    }

    /// Mount `router` under `/api/messages`.
    pub fn with_messages(mut self, router: Router) -> Self {
        self.messages = Some(router);
        self
    }

    /// Nest the configured groups into `router`.
    pub(crate) fn mount(self, mut router: Router) -> Router {
        if let Some(auth) = self.auth {
            router = router.nest(AUTH_PREFIX, auth);
        }
        if let Some(messages) = self.messages {
            router = router.nest(MESSAGES_PREFIX, messages);
        }
        router
    }
}
