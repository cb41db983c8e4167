use std::{convert::Infallible, sync::Arc};

use serde::de::DeserializeOwned;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::{
    constants::{DEFAULT_MEDIA_MOUNT, MAX_IMAGE_SIZE, MAX_JSON_BODY_SIZE},
    middleware::with_session,
    schema::{Attribute, Ingredient, RecordId, Tag},
    state::AppState,
    store::RecordStore,
};

use super::handlers;

fn with_state<S: RecordStore>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (Arc<AppState<S>>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(MAX_JSON_BODY_SIZE).and(warp::body::json())
}

/// `PUT` replaces, `PATCH` is partial.
fn put_or_patch() -> impl Filter<Extract = (bool,), Error = Rejection> + Clone {
    warp::put()
        .map(|| false)
        .or(warp::patch().map(|| true))
        .unify()
}

fn user_routes<S: RecordStore>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path!("user" / "create")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_user::<S>);

    let token = warp::path!("user" / "token")
        .and(warp::post())
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_token::<S>);

    let me = warp::path!("user" / "me")
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::retrieve_me::<S>);

    let update_me = warp::path!("user" / "me")
        .and(put_or_patch())
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::update_me::<S>);

    create.or(token).or(me).or(update_me)
}

fn attribute_routes<A: Attribute, S: RecordStore>(
    segment: &'static str,
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path(segment)
        .and(warp::path::end())
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::list_attributes::<A, S>);

    let create = warp::path(segment)
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and(with_state(state))
        .and_then(handlers::create_attribute::<A, S>);

    list.or(create)
}

fn recipe_routes<S: RecordStore>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(warp::query())
        .and(with_state(state.clone()))
        .and_then(handlers::list_recipes::<S>);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_recipe::<S>);

    let retrieve = warp::path!("recipes" / RecordId)
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::retrieve_recipe::<S>);

    let update = warp::path!("recipes" / RecordId)
        .and(put_or_patch())
        .and(with_session(state.signer.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_recipe::<S>);

    let delete = warp::path!("recipes" / RecordId)
        .and(warp::delete())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::delete_recipe::<S>);

    let upload = warp::path!("recipes" / RecordId / "upload-image")
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(warp::multipart::form().max_length(MAX_IMAGE_SIZE))
        .and(with_state(state))
        .and_then(handlers::upload_image::<S>);

    list.or(create)
        .or(retrieve)
        .or(update)
        .or(delete)
        .or(upload)
}

fn media_routes<S: RecordStore>(
    state: &AppState<S>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let mount = state
        .media
        .mount_point()
        .unwrap_or_else(|| DEFAULT_MEDIA_MOUNT.to_string());

    warp::path(mount)
        .and(warp::get())
        .and(warp::fs::dir(state.media.root().to_path_buf()))
}

/// Every endpoint of the service. Pair with [`crate::recover`] to turn
/// rejections into JSON responses.
pub fn routes<S: RecordStore>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    user_routes(state.clone())
        .or(attribute_routes::<Tag, S>("tags", state.clone()))
        .or(attribute_routes::<Ingredient, S>("ingredients", state.clone()))
        .or(recipe_routes(state.clone()))
        .or(media_routes(&state))
}
