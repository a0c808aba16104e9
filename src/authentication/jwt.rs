use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use potion::HtmlError;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::schema::{Id, User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, role: UserRole, lifetime_hours: i64) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(lifetime_hours)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), potion::Error> {
        if !action.authenticate(self) {
            return Err(
                HtmlError::Unauthorized.new("You don't have permission to perform this action")
            );
        }
        Ok(())
    }

    /// Authors may touch their own rows; everything else needs `elevated`.
    pub fn authenticate_owner(
        &self,
        owner_id: Id,
        own: ActionType,
        elevated: ActionType,
    ) -> Result<(), potion::Error> {
        self.authenticate(own)?;
        if owner_id == self.user_id || elevated.authenticate(self) {
            return Ok(());
        }
        Err(HtmlError::Unauthorized.default())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

impl From<&User> for SessionData {
    fn from(user: &User) -> Self {
        SessionData {
            user_id: user.id,
            username: user.username.to_owned(),
            is_admin: user.role == UserRole::Admin,
            role: user.role.to_owned(),
        }
    }
}

fn signing_key(secret: &[u8]) -> Result<Hmac<Sha256>, potion::Error> {
    Hmac::new_from_slice(secret)
        .map_err(|_| HtmlError::InternalServerError.new("Invalid session signing key"))
}

pub fn generate_jwt_session(
    user: &User,
    secret: &[u8],
    lifetime_hours: i64,
) -> Result<String, potion::Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(
        user.id,
        user.username.to_owned(),
        user.role.to_owned(),
        lifetime_hours,
    );

    claims
        .sign_with_key(&key)
        .map_err(|_| HtmlError::InternalServerError.new("Failed to sign session"))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, potion::Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| HtmlError::InvalidSession.new("Invalid Session; Invalid token"))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(HtmlError::InvalidSession.new("Invalid session; Token expired"));
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            username: "sarah".to_string(),
            email: "connor@skynet.com".to_string(),
            first_name: "Sarah".to_string(),
            last_name: "Connor".to_string(),
            password: String::new(),
            role,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn sessions_round_trip_with_the_same_secret() {
        let token = generate_jwt_session(&user(UserRole::Admin), b"secret", 1).unwrap();
        let session: SessionData = verify_jwt_session(&token, b"secret").unwrap().into();

        assert_eq!(session.user_id, 7);
        assert!(session.is_admin);
        assert!(verify_jwt_session(&token, b"other").is_err());
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let token = generate_jwt_session(&user(UserRole::User), b"secret", -1).unwrap();

        assert!(verify_jwt_session(&token, b"secret").is_err());
    }
}
