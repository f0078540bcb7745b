use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tandem_config::{
    Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions, StorageBackend,
};
use tandem_contracts::prelude::{
    CameraError, CameraProvider, ObjectStorage, PermissionState,
};
use tandem_core::infra::{
    FileCamera, FsObjectStorage, JsonFileProfileService, LogNotifier,
    MemoryObjectStorage, RestObjectStorage,
};
use tandem_core::login::post_login_route;
use tandem_core::{EditSession, FlowOutcome, SessionServices, SessionSettings};
use tandem_model::{CaptureOptions, CapturedImage, CropRegion, Platform};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tandemctl", about = "Edit a Tandem profile from the command line")]
struct Cli {
    /// Configuration file (defaults to tandem.toml or TANDEM_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dotenv file loaded before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    /// Profile document (JSON); overrides profile.store_path
    #[arg(long, global = true)]
    profile: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the profile document and where a sign-in would land
    Show,
    /// Replace the profile picture with an image file
    ChangePhoto(PhotoArgs),
    /// Append an image file to the gallery
    AddPhoto(PhotoArgs),
    /// Remove a gallery photo by URL
    DeletePhoto { url: String },
    /// Remove a study language by code
    DeleteLanguage { code: String },
    /// Set and save the about-me text
    About { text: String },
    /// Validate configuration and print the resolved values
    CheckConfig,
}

#[derive(Args)]
struct PhotoArgs {
    #[arg(long)]
    file: PathBuf,
    /// Crop region in pixels: x,y,width,height
    #[arg(long)]
    crop: Option<CropRegion>,
}

/// Camera for commands that never capture.
struct NoCamera;

#[async_trait]
impl CameraProvider for NoCamera {
    async fn request_permissions(&self) -> Result<PermissionState, CameraError> {
        Ok(PermissionState::Granted)
    }

    async fn get_photo(
        &self,
        _platform: Platform,
        _options: &CaptureOptions,
    ) -> Result<CapturedImage, CameraError> {
        Err(CameraError::Unavailable("no image file given".into()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.config.clone(),
            env_file: cli.env_file.clone(),
        })
        .load()
        .context("failed to load configuration")?;
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }

    if let Command::CheckConfig = cli.command {
        print_config(&config);
        return Ok(());
    }

    let profile_path = cli
        .profile
        .clone()
        .unwrap_or_else(|| config.profile.store_path.clone());
    let camera: Arc<dyn CameraProvider> = match &cli.command {
        Command::ChangePhoto(args) | Command::AddPhoto(args) => {
            Arc::new(FileCamera::new(&args.file).with_crop(args.crop))
        }
        _ => Arc::new(NoCamera),
    };

    let services = SessionServices {
        profiles: Arc::new(JsonFileProfileService::new(&profile_path)),
        storage: build_storage(&config)?,
        camera,
        notifier: Arc::new(LogNotifier),
    };
    let settings = SessionSettings {
        platform: config.capture.platform,
        capture: config.capture.options(),
        toast_duration: config.notifications.duration,
        toast_position: config.notifications.position,
    };
    let session = EditSession::new(services, settings);

    session
        .open()
        .await
        .with_context(|| format!("failed to open profile {}", profile_path.display()))?;

    let result = run(&session, cli.command).await;
    session.close().await;
    result
}

async fn run(session: &EditSession, command: Command) -> Result<()> {
    let outcome = match command {
        Command::Show => {
            let profile = session.profile().context("no profile document loaded")?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            println!("post-login route: {}", post_login_route(&profile));
            return Ok(());
        }
        Command::ChangePhoto(_) => session.change_photo().await?,
        Command::AddPhoto(_) => session.add_other_photo().await?,
        Command::DeletePhoto { url } => session.delete_other_photo(&url).await?,
        Command::DeleteLanguage { code } => session.delete_language(&code).await?,
        Command::About { text } => {
            session.input_about_me(text)?;
            session.save_about_me().await?
        }
        Command::CheckConfig => return Ok(()),
    };

    match outcome {
        FlowOutcome::Saved => {
            if let Some(profile) = session.profile() {
                println!("photo: {}", profile.photo);
                println!("other photos: {}", profile.other_photos.join(", "));
            }
        }
        FlowOutcome::NothingCaptured => {
            warn!("no image was captured; profile left unchanged")
        }
        FlowOutcome::Discarded | FlowOutcome::Refused => {
            info!(?outcome, "profile left unchanged")
        }
    }
    Ok(())
}

fn build_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    let storage = &config.storage;
    let built: Arc<dyn ObjectStorage> = match storage.backend {
        StorageBackend::Memory => {
            Arc::new(MemoryObjectStorage::new(&storage.public_base_url)?)
        }
        StorageBackend::Filesystem => Arc::new(FsObjectStorage::new(
            &storage.root,
            &storage.public_base_url,
        )?),
        StorageBackend::Rest => {
            let bucket = storage
                .bucket
                .clone()
                .context("storage.bucket is required for the rest backend")?;
            Arc::new(RestObjectStorage::new(
                &storage.endpoint,
                bucket,
                storage.auth_token.clone(),
            )?)
        }
    };
    info!(backend = %storage.backend, "storage ready");
    Ok(built)
}

fn print_config(config: &Config) {
    println!("config file:   {:?}", config.metadata.config_path);
    println!("env file used: {}", config.metadata.env_file_loaded);
    println!(
        "capture:       platform={} quality={} allow_editing={} source={}",
        config.capture.platform,
        config.capture.quality,
        config.capture.allow_editing,
        config.capture.source
    );
    println!(
        "toasts:        {} at {}",
        humanize(config.notifications.duration),
        config.notifications.position
    );
    println!("storage:       {:?}", config.storage);
    println!("profile:       {}", config.profile.store_path.display());
    println!("dev mode:      {}", config.dev_mode);
}

fn humanize(duration: std::time::Duration) -> String {
    format!("{}ms", duration.as_millis())
}
