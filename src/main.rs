use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use image_sources::application::FetchImageUseCase;
use image_sources::domain::entities::{
    FileOrigin, GeoPointLocation, Size, StorageFileLocation, StorageImageLocation, WebFileLocation,
};
use image_sources::domain::ports::{ContentCachePort, FileLoaderFactory};
use image_sources::domain::sources::{
    AnySource, GeoPointSource, LocalFileSource, StorageSource, WebCachedSource, WebUrlSource,
};
use image_sources::infrastructure::{
    AppConfig, CliArgs, Command, ConfigStorage, DiskContentCache, HttpLoaderFactory,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match ConfigStorage::new() {
        Ok(storage) => storage.load_config(args.config.as_deref())?,
        Err(e) => {
            warn!(error = %e, "No config directory, using defaults");
            AppConfig::default()
        }
    };
    config.merge_with_args(args);
    Ok(config)
}

fn shrink_box(width: Option<u32>, height: Option<u32>) -> Size {
    Size::new(width.unwrap_or(0), height.unwrap_or(0))
}

fn build_source(command: &Command, factory: Arc<dyn FileLoaderFactory>) -> Result<(AnySource, FileOrigin)> {
    let built = match command {
        Command::Url { url, width, height } => (
            WebUrlSource::new(url.clone(), shrink_box(*width, *height), factory).into(),
            FileOrigin::Url(url.clone()),
        ),
        Command::Web {
            url,
            access_hash,
            width,
            height,
        } => (
            WebCachedSource::with_box(
                WebFileLocation::new(url.clone(), *access_hash),
                shrink_box(*width, *height),
                0,
                factory,
            )
            .into(),
            FileOrigin::Url(url.clone()),
        ),
        Command::Storage {
            dc_id,
            volume_id,
            local_id,
            file_reference,
            size,
        } => {
            let reference = file_reference
                .as_deref()
                .map(hex::decode)
                .transpose()
                .wrap_err("file reference is not valid hex")?
                .unwrap_or_default();
            let file = StorageFileLocation::new(*dc_id, *volume_id, *local_id)
                .with_file_reference(reference);
            (
                StorageSource::new(StorageImageLocation::new(file, 0, 0), *size, factory).into(),
                FileOrigin::Unknown,
            )
        }
        Command::Geo {
            lat,
            lon,
            width,
            height,
            zoom,
            scale,
        } => (
            GeoPointSource::new(
                GeoPointLocation::new(*lat, *lon, *width, *height, *zoom, *scale),
                factory,
            )
            .into(),
            FileOrigin::Unknown,
        ),
        Command::File { path } => (LocalFileSource::from_path(path).into(), FileOrigin::Unknown),
        Command::ClearCache => return Err(eyre!("clear-cache does not fetch an image")),
    };
    Ok(built)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = image_sources::VERSION, "Starting image-sources");

    let cache = Arc::new(
        DiskContentCache::new(config.effective_cache_dir(), config.cache.max_size).await?,
    );

    if matches!(args.command, Command::ClearCache) {
        cache.clear().await?;
        println!("Cleared {}", cache.dir().display());
        return Ok(());
    }

    let factory = Arc::new(HttpLoaderFactory::from_current(
        &config.network,
        config.endpoints.clone(),
        cache.clone(),
    )?);
    let (mut source, origin) = build_source(&args.command, factory)?;

    let use_case = FetchImageUseCase::new(
        cache,
        Duration::from_secs(config.network.timeout_secs),
        Duration::from_millis(config.network.poll_interval_ms),
    );
    let outcome = use_case.execute(&mut source, &origin).await?;

    println!("{}: {outcome}", source.kind_name());
    Ok(())
}
