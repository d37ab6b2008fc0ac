use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use euro_camp::config::{LoggingSettings, Settings, StorageBackend};
use euro_camp::routes::{self, AppState};
use euro_camp::services::{CampsiteStore, ImageKitClient, MemoryStore, PostgresStore};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

async fn build_store(settings: &Settings) -> io::Result<Arc<dyn CampsiteStore>> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let db = &settings.database;
            let store = PostgresStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("PostgreSQL connection error", e))?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
    }
}

fn build_image_client(settings: &Settings) -> io::Result<Option<Arc<ImageKitClient>>> {
    let Some(ik) = &settings.imagekit else {
        info!("Image hosting not configured; uploads will be skipped with a warning");
        return Ok(None);
    };

    let client = ImageKitClient::new(
        ik.upload_url.clone(),
        ik.private_key.clone(),
        ik.url_endpoint.clone(),
        ik.folder.clone(),
        ik.timeout(),
    )
    .map_err(|e| startup_error("Image host client error", e))?;

    info!("Image host client initialized ({})", client.url_endpoint());
    Ok(Some(Arc::new(client)))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting campsite directory service...");

    if settings.auth.jwt_secret.is_empty() {
        return Err(startup_error(
            "Configuration error",
            "auth.jwt_secret is empty (set CAMP__AUTH__JWT_SECRET)",
        ));
    }

    let store = build_store(&settings).await?;
    let images = build_image_client(&settings)?;

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    let app_state = AppState::new(settings, store, images);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
