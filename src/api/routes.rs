//! JSON action endpoints, the recipe listing and the shopping list export.

use std::{collections::HashMap, convert::Infallible, sync::Arc};

use redis::aio::MultiplexedConnection;
use serde_json::{json, Value};
use warp::{
    http::StatusCode,
    reply::{Reply, Response},
    Filter, Rejection,
};

use crate::{
    accounts::{login, session_cookie, signup},
    config::Config,
    database::store::RelationStore,
    error::TypeError,
    export::{export_shopping_list, ShoppingListRenderer},
    filter::{parse_page, parse_tags},
    form::Form,
    identity::RequestIdentity,
    ingredients::search_ingredients_cached,
    listing::list_recipes,
    middleware::with_identity,
    pagination::page_offset,
    schema::Id,
    toggle::{
        add_favorite, add_purchase, add_subscription, remove_favorite, remove_purchase,
        remove_subscription,
    },
    RECIPE_COUNT_PER_PAGE,
};

/// Shared state of the mounted routes.
pub struct AppContext<S: ?Sized> {
    pub config: Config,
    pub renderer: Arc<dyn ShoppingListRenderer>,
    pub cache: Option<MultiplexedConnection>,
    pub store: Arc<S>,
}

impl<S: ?Sized> AppContext<S> {
    pub fn new(config: Config, store: Arc<S>, renderer: Arc<dyn ShoppingListRenderer>) -> Self {
        Self {
            config,
            renderer,
            cache: None,
            store,
        }
    }

    pub fn with_cache(mut self, cache: MultiplexedConnection) -> Self {
        self.cache = Some(cache);
        self
    }
}

fn with_context<S: RelationStore + ?Sized + 'static>(
    ctx: Arc<AppContext<S>>,
) -> impl Filter<Extract = (Arc<AppContext<S>>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

/// Maps a `potion::Error` onto a JSON reply with the matching status code.
pub fn error_reply(err: potion::Error) -> Response {
    let status = u16::try_from(err.code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        log::error!("{status}: {:?}", err.info);
    }

    let body = json!({ "success": false, "error": err.info });
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn success_reply(success: bool) -> Response {
    warp::reply::json(&json!({ "success": success })).into_response()
}

fn finish(result: Result<Response, potion::Error>) -> Result<Response, Infallible> {
    Ok(result.unwrap_or_else(error_reply))
}

/// Accepts `{"id": 5}` as well as `{"id": "5"}`.
fn parse_id(body: &Value) -> Result<Id, potion::Error> {
    let id = match body.get("id") {
        Some(Value::Number(n)) => n.as_i64().and_then(|n| Id::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| TypeError::new("Invalid id").into())
}

/// Any non-empty value counts, `?download=0` included.
fn is_set(query: &HashMap<String, String>, key: &str) -> bool {
    query.get(key).is_some_and(|v| !v.is_empty())
}

pub fn routes<S: RelationStore + ?Sized + 'static>(
    ctx: AppContext<S>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let ctx = Arc::new(ctx);
    let identity = with_identity(ctx.config.jwt_secret.clone());

    let add_favorite_route = warp::post()
        .and(warp::path!("add-favorite"))
        .and(identity.clone())
        .and(warp::body::json())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity, body: Value, ctx: Arc<AppContext<S>>| async move {
                finish(
                    async {
                        let created = add_favorite(&identity, parse_id(&body)?, &*ctx.store).await?;
                        Ok::<_, potion::Error>(success_reply(created))
                    }
                    .await,
                )
            },
        );

    let remove_favorite_route = warp::delete()
        .and(warp::path!("remove-favorite" / Id))
        .and(identity.clone())
        .and(with_context(ctx.clone()))
        .and_then(
            |id: Id, identity: RequestIdentity, ctx: Arc<AppContext<S>>| async move {
                finish(
                    remove_favorite(&identity, id, &*ctx.store)
                        .await
                        .map(success_reply),
                )
            },
        );

    let add_subscription_route = warp::post()
        .and(warp::path!("add-subscription"))
        .and(identity.clone())
        .and(warp::body::json())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity, body: Value, ctx: Arc<AppContext<S>>| async move {
                finish(
                    async {
                        let created =
                            add_subscription(&identity, parse_id(&body)?, &*ctx.store).await?;
                        Ok::<_, potion::Error>(success_reply(created))
                    }
                    .await,
                )
            },
        );

    let remove_subscription_route = warp::delete()
        .and(warp::path!("remove-subscription" / Id))
        .and(identity.clone())
        .and(with_context(ctx.clone()))
        .and_then(
            |id: Id, identity: RequestIdentity, ctx: Arc<AppContext<S>>| async move {
                finish(
                    remove_subscription(&identity, id, &*ctx.store)
                        .await
                        .map(success_reply),
                )
            },
        );

    let add_purchase_route = warp::post()
        .and(warp::path!("add-purchase"))
        .and(identity.clone())
        .and(warp::body::json())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity, body: Value, ctx: Arc<AppContext<S>>| async move {
                finish(
                    async {
                        let outcome =
                            add_purchase(&identity, parse_id(&body)?, &*ctx.store).await?;
                        let reply = success_reply(outcome.created);

                        Ok::<_, potion::Error>(match outcome.issued {
                            Some(key) => {
                                warp::reply::with_header(reply, "set-cookie", key.cookie())
                                    .into_response()
                            }
                            None => reply,
                        })
                    }
                    .await,
                )
            },
        );

    let remove_purchase_route = warp::delete()
        .and(warp::path!("remove-purchase" / Id))
        .and(identity.clone())
        .and(with_context(ctx.clone()))
        .and_then(
            |id: Id, identity: RequestIdentity, ctx: Arc<AppContext<S>>| async move {
                finish(
                    remove_purchase(&identity, id, &*ctx.store)
                        .await
                        .map(success_reply),
                )
            },
        );

    let ingredients_route = warp::get()
        .and(warp::path!("ingredients"))
        .and(identity.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity,
             query: HashMap<String, String>,
             ctx: Arc<AppContext<S>>| async move {
                let prefix = query.get("query").map(String::as_str).unwrap_or_default();
                let mut cache = ctx.cache.clone();

                finish(
                    async {
                        identity.user()?;
                        let rows =
                            search_ingredients_cached(prefix, &*ctx.store, cache.as_mut()).await?;
                        Ok::<_, potion::Error>(warp::reply::json(&rows).into_response())
                    }
                    .await,
                )
            },
        );

    let recipes_route = warp::get()
        .and(warp::path!("recipes"))
        .and(warp::query::raw().or(warp::any().map(|| String::new())).unify())
        .and(with_context(ctx.clone()))
        .and_then(|query: String, ctx: Arc<AppContext<S>>| async move {
            let tags = parse_tags(&query);
            let offset = page_offset(parse_page(&query), RECIPE_COUNT_PER_PAGE);

            finish(
                list_recipes(&tags, offset, &*ctx.store)
                    .await
                    .map(|page| warp::reply::json(&page).into_response()),
            )
        });

    let export_route = warp::get()
        .and(warp::path!("shopping-list-export"))
        .and(identity.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity,
             query: HashMap<String, String>,
             ctx: Arc<AppContext<S>>| async move {
                let download = is_set(&query, "download");

                finish(
                    export_shopping_list(&identity, download, &*ctx.store, &*ctx.renderer)
                        .await
                        .map(|export| {
                            let disposition = export.content_disposition();
                            let reply = warp::reply::with_header(
                                export.bytes,
                                "content-type",
                                "application/pdf",
                            );
                            warp::reply::with_header(reply, "content-disposition", disposition)
                                .into_response()
                        }),
                )
            },
        );

    let signup_route = warp::post()
        .and(warp::path!("signup"))
        .and(identity.clone())
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_context(ctx.clone()))
        .and_then(
            |identity: RequestIdentity,
             fields: HashMap<String, String>,
             ctx: Arc<AppContext<S>>| async move {
                let form = Form::from_fields(fields);

                finish(
                    signup(&form, identity.purchase_key.as_ref(), &*ctx.store)
                        .await
                        .map(|_| {
                            warp::reply::with_status(
                                warp::reply::json(&json!({ "success": true })),
                                StatusCode::CREATED,
                            )
                            .into_response()
                        }),
                )
            },
        );

    let login_route = warp::post()
        .and(warp::path!("login"))
        .and(warp::body::form::<HashMap<String, String>>())
        .and(with_context(ctx))
        .and_then(
            |fields: HashMap<String, String>, ctx: Arc<AppContext<S>>| async move {
                let email = fields.get("email").map(String::as_str).unwrap_or_default();
                let password = fields.get("password").map(String::as_str).unwrap_or_default();

                finish(
                    login(email, password, &*ctx.store, &ctx.config)
                        .await
                        .map(|token| {
                            warp::reply::with_header(
                                success_reply(true),
                                "set-cookie",
                                session_cookie(&token),
                            )
                            .into_response()
                        }),
                )
            },
        );

    add_favorite_route
        .or(remove_favorite_route)
        .unify()
        .or(add_subscription_route)
        .unify()
        .or(remove_subscription_route)
        .unify()
        .or(add_purchase_route)
        .unify()
        .or(remove_purchase_route)
        .unify()
        .or(ingredients_route)
        .unify()
        .or(recipes_route)
        .unify()
        .or(export_route)
        .unify()
        .or(signup_route)
        .unify()
        .or(login_route)
        .unify()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        assert_eq!(parse_id(&json!({ "id": 5 })).ok(), Some(5));
        assert_eq!(parse_id(&json!({ "id": "12" })).ok(), Some(12));
        assert!(parse_id(&json!({ "id": "x" })).is_err());
        assert!(parse_id(&json!({})).is_err());
    }

    #[test]
    fn any_non_empty_flag_is_set() {
        let query = |value: &str| HashMap::from([("download".to_string(), value.to_string())]);

        assert!(is_set(&query("1"), "download"));
        assert!(is_set(&query("True"), "download"));
        assert!(is_set(&query("2"), "download"));
        assert!(!is_set(&query(""), "download"));
        assert!(!is_set(&HashMap::new(), "download"));
    }

    #[test]
    fn errors_keep_their_status() {
        let response = error_reply(crate::error::not_found("Not found"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
