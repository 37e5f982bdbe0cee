use nightlight::api::{self, AppState};
use nightlight::config::{AppConfig, database, statuses};
use nightlight::core::status;
use nightlight::crypto::PasswordCipher;
use nightlight::errors::Result;
use nightlight::storage::FsBlobStore;
use nightlight::story::{DisabledStoryPublisher, HttpStoryPublisher, StoryPublisher};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = AppConfig::from_env()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Connect and create the schema
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the status catalog
    let catalog = match &app_config.status_catalog {
        Some(path) => statuses::merge_catalog(statuses::load_catalog_file(path)?),
        None => statuses::builtin_statuses(),
    };
    status::seed_statuses(&db, &catalog)
        .await
        .inspect(|inserted| info!("Status catalog seeded, {} new statuses.", inserted))
        .inspect_err(|e| error!("Failed to seed statuses: {}", e))?;

    // 6. Wire up the story collaborators
    let publisher: Arc<dyn StoryPublisher> = match &app_config.story_gateway_url {
        Some(url) => Arc::new(HttpStoryPublisher::new(
            url.clone(),
            app_config.story_gateway_timeout,
        )?),
        None => {
            warn!("STORY_GATEWAY_URL not set, Instagram stories are disabled");
            Arc::new(DisabledStoryPublisher)
        }
    };
    let state = AppState {
        db: Arc::new(db),
        store: Arc::new(FsBlobStore::new(app_config.upload_folder.clone())),
        publisher,
        cipher: PasswordCipher::new(app_config.encryption_password.clone()),
        admin_api_key: app_config.admin_api_key.clone(),
    };

    // 7. Serve
    api::serve(&app_config, state).await
}
