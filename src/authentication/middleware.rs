use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use super::{
    identity::{RequestIdentity, SessionKey},
    jwt::{verify_jwt_session, SessionData},
};
use crate::{PURCHASE_SESSION_KEY, SESSION_COOKIE};

/// Extracts the request identity. Invalid or expired session tokens degrade to anonymous.
pub fn with_identity(
    secret: Arc<[u8]>,
) -> impl Filter<Extract = (RequestIdentity,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::cookie::optional::<String>(PURCHASE_SESSION_KEY))
        .map(move |session: Option<String>, purchase: Option<String>| {
            let session = session.and_then(|token| match verify_jwt_session(&token, &secret) {
                Ok(data) => Some(SessionData::from(data)),
                Err(_) => {
                    log::debug!("> Ignoring invalid session cookie");
                    None
                }
            });

            RequestIdentity::new(session, purchase.as_deref().and_then(SessionKey::parse))
        })
}
