//! Resolution of the "current actor" behind a request.
//!
//! Authenticated requests act as their user. Anonymous requests act through a
//! surrogate key kept in session state under [`PURCHASE_SESSION_KEY`]; the key
//! is minted lazily, only when an anonymous visitor first mutates something.

use std::fmt;

use potion::HtmlError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    database::schema::Id, jwt::SessionData, PURCHASE_SESSION_KEY, SESSION_KEY_MAX_LEN,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accepts a key read back from session state. Empty or oversized values are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= SESSION_KEY_MAX_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Set-Cookie` value persisting this key for the rest of the browser session.
    pub fn cookie(&self) -> String {
        format!(
            "{PURCHASE_SESSION_KEY}={}; Path=/; HttpOnly; SameSite=Lax",
            self.0
        )
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Actor {
    User(Id),
    Anonymous(SessionKey),
}

impl Actor {
    pub fn user_id(&self) -> Option<Id> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Anonymous(_) => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestIdentity {
    pub session: Option<SessionData>,
    pub purchase_key: Option<SessionKey>,
}

impl RequestIdentity {
    pub fn new(session: Option<SessionData>, purchase_key: Option<SessionKey>) -> Self {
        Self {
            session,
            purchase_key,
        }
    }

    pub fn authenticated(session: SessionData) -> Self {
        Self::new(Some(session), None)
    }

    pub fn anonymous(purchase_key: Option<SessionKey>) -> Self {
        Self::new(None, purchase_key)
    }

    /// Actor of a read-only operation. Never mints a key.
    pub fn reader(&self) -> Option<Actor> {
        match (&self.session, &self.purchase_key) {
            (Some(session), _) => Some(Actor::User(session.user_id)),
            (None, Some(key)) => Some(Actor::Anonymous(key.to_owned())),
            (None, None) => None,
        }
    }

    /// Actor of a mutation. An anonymous visitor without a key gets a new one,
    /// returned alongside so the caller can write it to session state.
    pub fn writer(&self) -> (Actor, Option<SessionKey>) {
        if let Some(actor) = self.reader() {
            return (actor, None);
        }

        let key = SessionKey::generate();
        log::trace!("> Issued anonymous session key {key}");
        (Actor::Anonymous(key.to_owned()), Some(key))
    }

    pub fn user(&self) -> Result<&SessionData, potion::Error> {
        self.session
            .as_ref()
            .ok_or_else(|| HtmlError::InvalidSession.new("Login required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn session() -> SessionData {
        SessionData {
            user_id: 3,
            username: "sarah".to_string(),
            role: UserRole::User,
            is_admin: false,
        }
    }

    #[test]
    fn authenticated_requests_resolve_to_their_user() {
        let identity = RequestIdentity::new(Some(session()), SessionKey::parse("abc"));

        assert_eq!(identity.writer(), (Actor::User(3), None));
        assert_eq!(identity.reader(), Some(Actor::User(3)));
    }

    #[test]
    fn anonymous_reads_without_a_key_have_no_actor() {
        assert_eq!(RequestIdentity::default().reader(), None);
    }

    #[test]
    fn anonymous_mutations_mint_a_key_once() {
        let (actor, issued) = RequestIdentity::default().writer();
        let key = issued.unwrap();

        assert_eq!(actor, Actor::Anonymous(key.clone()));
        assert_eq!(key.as_str().len(), 32);

        let again = RequestIdentity::anonymous(Some(key.clone())).writer();
        assert_eq!(again, (Actor::Anonymous(key), None));
    }

    #[test]
    fn generated_keys_do_not_collide() {
        assert_ne!(SessionKey::generate(), SessionKey::generate());
    }

    #[test]
    fn malformed_keys_are_ignored() {
        assert!(SessionKey::parse("").is_none());
        assert!(SessionKey::parse("a;b").is_none());
        assert!(SessionKey::parse(&"a".repeat(SESSION_KEY_MAX_LEN + 1)).is_none());
        assert_eq!(
            SessionKey::parse(" 5f0c-ab ").map(|k| k.to_string()),
            Some("5f0c-ab".to_string())
        );
    }

    #[test]
    fn user_requires_a_session() {
        assert!(RequestIdentity::default().user().is_err());
        assert_eq!(
            RequestIdentity::authenticated(session()).user().map(|s| s.user_id).ok(),
            Some(3)
        );
    }
}
