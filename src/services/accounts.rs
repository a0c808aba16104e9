use potion::HtmlError;

use crate::{
    config::Config,
    cryptography::{hash_password, verify_password},
    database::store::RelationStore,
    form::Form,
    identity::SessionKey,
    jwt::generate_jwt_session,
    schema::{Id, NewUser, User, UserRole},
    SESSION_COOKIE,
};

/// Moves an anonymous shop list onto `user_id`. Runs once, at signup.
pub async fn merge_cart<S: RelationStore + ?Sized>(
    key: &SessionKey,
    user_id: Id,
    store: &S,
) -> Result<u64, potion::Error> {
    let moved = store.transfer_purchases(key, user_id).await?;
    log::info!("Transferred {moved} shop list entries to user {user_id}");
    Ok(moved)
}

/// Creates an account from the signup form and takes over the visitor's shop list.
pub async fn signup<S: RelationStore + ?Sized>(
    form: &Form,
    purchase_key: Option<&SessionKey>,
    store: &S,
) -> Result<User, potion::Error> {
    let data = form.signup()?;
    let password = hash_password(&data.password)
        .map_err(|_| HtmlError::InternalServerError.new("Failed to hash password"))?;

    let user = store
        .create_user(&NewUser {
            username: data.username,
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            password,
            role: UserRole::User,
        })
        .await?
        .ok_or_else(|| HtmlError::InvalidRequest.new("Username or email already taken"))?;

    if let Some(key) = purchase_key {
        merge_cart(key, user.id, store).await?;
    }

    Ok(user)
}

/// Returns a signed session token.
pub async fn login<S: RelationStore + ?Sized>(
    email: &str,
    password: &str,
    store: &S,
    config: &Config,
) -> Result<String, potion::Error> {
    let Some(user) = store.find_user_by_email(email.trim()).await? else {
        return Err(HtmlError::InvalidRequest.new("Invalid credentials"));
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_| HtmlError::InternalServerError.new("Failed to verify password"))?;
    if !authenticated {
        return Err(HtmlError::InvalidRequest.new("Invalid credentials"));
    }

    generate_jwt_session(&user, &config.jwt_secret, config.session_lifetime_hours)
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}
