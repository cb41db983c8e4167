use std::sync::Arc;

use futures_util::{TryFutureExt, TryStreamExt};
use log::warn;
use warp::{
    http::StatusCode,
    hyper::body::Buf,
    multipart::{FormData, Part},
    reject::Rejection,
    reply::{self, Reply},
};

use crate::{
    actions::{users, Scope},
    error::{ApiError, NON_FIELD_ERRORS},
    jwt::SessionData,
    schema::{Attribute, RecordId},
    state::AppState,
    store::RecordStore,
    transfer::{
        AttributePayload, AttributeQuery, AttributeView, RecipePayload, RecipeQuery, RecipeView,
        TokenPayload, TokenView, UserPayload, UserView,
    },
};

const IMAGE_FIELD: &str = "image";

pub async fn create_user<S: RecordStore>(
    payload: UserPayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let user = users::register_user(&state.store, payload).await?;

    Ok(reply::with_status(
        reply::json(&UserView::from(&user)),
        StatusCode::CREATED,
    ))
}

pub async fn create_token<S: RecordStore>(
    payload: TokenPayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let (email, password) = payload.into_credentials()?;
    let user = users::authenticate(&state.store, &email, &password).await?;
    let token = state.signer.generate(&user)?;

    Ok(reply::json(&TokenView { token }))
}

pub async fn retrieve_me<S: RecordStore>(
    session: SessionData,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let user = users::get_me(&state.store, &session).await?;

    Ok(reply::json(&UserView::from(&user)))
}

pub async fn update_me<S: RecordStore>(
    partial: bool,
    session: SessionData,
    payload: UserPayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let user = users::update_me(&state.store, &session, payload, partial).await?;

    Ok(reply::json(&UserView::from(&user)))
}

pub async fn list_attributes<A: Attribute, S: RecordStore>(
    session: SessionData,
    query: AttributeQuery,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let assigned_only = query.assigned_only()?;
    let rows: Vec<A> = Scope::new(&state.store, &session)
        .list_attributes(assigned_only)
        .await?;

    Ok(reply::json(
        &rows
            .iter()
            .map(AttributeView::from_attribute)
            .collect::<Vec<AttributeView>>(),
    ))
}

pub async fn create_attribute<A: Attribute, S: RecordStore>(
    session: SessionData,
    payload: AttributePayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let row: A = Scope::new(&state.store, &session)
        .create_attribute(payload)
        .await?;

    Ok(reply::with_status(
        reply::json(&AttributeView::from_attribute(&row)),
        StatusCode::CREATED,
    ))
}

pub async fn list_recipes<S: RecordStore>(
    session: SessionData,
    query: RecipeQuery,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let filter = query.into_filter()?;
    let recipes = Scope::new(&state.store, &session)
        .list_recipes(&filter)
        .await?;

    Ok(reply::json(
        &recipes.iter().map(RecipeView::from).collect::<Vec<RecipeView>>(),
    ))
}

pub async fn create_recipe<S: RecordStore>(
    session: SessionData,
    payload: RecipePayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let recipe = Scope::new(&state.store, &session)
        .create_recipe(payload)
        .await?;

    Ok(reply::with_status(
        reply::json(&RecipeView::from(&recipe)),
        StatusCode::CREATED,
    ))
}

pub async fn retrieve_recipe<S: RecordStore>(
    id: RecordId,
    session: SessionData,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let detail = Scope::new(&state.store, &session).recipe_detail(id).await?;

    Ok(reply::json(&detail))
}

pub async fn update_recipe<S: RecordStore>(
    id: RecordId,
    partial: bool,
    session: SessionData,
    payload: RecipePayload,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let recipe = Scope::new(&state.store, &session)
        .update_recipe(id, payload, partial)
        .await?;

    Ok(reply::json(&RecipeView::from(&recipe)))
}

pub async fn delete_recipe<S: RecordStore>(
    id: RecordId,
    session: SessionData,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    Scope::new(&state.store, &session).delete_recipe(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn malformed_upload(e: warp::Error) -> ApiError {
    warn!("Malformed multipart body: {e}");
    ApiError::validation(NON_FIELD_ERRORS, "Malformed multipart body.")
}

async fn read_part(part: Part) -> Result<Vec<u8>, ApiError> {
    part.stream()
        .try_fold(Vec::new(), |mut bytes, mut chunk| async move {
            while chunk.has_remaining() {
                let slice = chunk.chunk();
                let len = slice.len();
                bytes.extend_from_slice(slice);
                chunk.advance(len);
            }
            Ok::<_, warp::Error>(bytes)
        })
        .map_err(malformed_upload)
        .await
}

/// First file sent under the `image` field, with its client-side name.
async fn image_part(form: FormData) -> Result<(String, Vec<u8>), ApiError> {
    futures_util::pin_mut!(form);

    while let Some(part) = form.try_next().await.map_err(malformed_upload)? {
        if part.name() != IMAGE_FIELD {
            continue;
        }
        let filename = part.filename().unwrap_or(IMAGE_FIELD).to_string();
        let bytes = read_part(part).await?;

        return Ok((filename, bytes));
    }

    Err(ApiError::validation(IMAGE_FIELD, "No file was submitted."))
}

pub async fn upload_image<S: RecordStore>(
    id: RecordId,
    session: SessionData,
    form: FormData,
    state: Arc<AppState<S>>,
) -> Result<impl Reply, Rejection> {
    let scope = Scope::new(&state.store, &session);
    scope.get_recipe(id).await?;

    let (filename, bytes) = image_part(form).await?;
    let view = scope
        .upload_image(id, &filename, &bytes, &state.media)
        .await?;

    Ok(reply::json(&view))
}
