use std::{error::Error, sync::Arc};

use chrono::Duration;
use env_logger::Env;
use log::{error, info, warn};
use recipe_api::{
    actions::users::{create_superuser, normalize_email},
    config::{Config, Superuser},
    jwt::TokenSigner,
    memory::MemoryStore,
    postgres::PgStore,
    recover, routes,
    state::AppState,
    store::RecordStore,
    uploads::MediaStorage,
};
use warp::Filter;

async fn ensure_superuser<S: RecordStore>(
    store: &S,
    superuser: &Superuser,
) -> Result<(), Box<dyn Error>> {
    let email = normalize_email(&superuser.email);
    if store.find_user_by_email(&email).await?.is_some() {
        info!("Superuser {} already exists", superuser.email);
        return Ok(());
    }
    create_superuser(store, Some(&superuser.email), &superuser.password).await?;

    Ok(())
}

async fn serve<S: RecordStore>(store: S, config: Config) -> Result<(), Box<dyn Error>> {
    if let Some(superuser) = &config.superuser {
        ensure_superuser(&store, superuser).await?;
    }

    let signer = TokenSigner::new(
        config.jwt_secret.as_bytes(),
        Duration::hours(config.token_ttl_hours),
    )?;
    let media = MediaStorage::new(&config.media_root, &config.media_url);
    tokio::fs::create_dir_all(media.root()).await?;

    let state = Arc::new(AppState::new(store, signer, media));
    let api = routes(state)
        .with(warp::log("recipe_api"))
        .recover(recover);

    info!("Listening on http://{}", config.bind_addr);
    warp::serve(api).run(config.bind_addr).await;

    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;

    match config.database_url.clone() {
        Some(database_url) => {
            let store = PgStore::connect(&database_url).await?;
            store.migrate().await?;
            info!("Connected to database");

            serve(store, config).await
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory only");

            serve(MemoryStore::new(), config).await
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}
