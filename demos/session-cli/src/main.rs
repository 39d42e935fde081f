//! Command-line walkthrough of the TV session coordinator.
//!
//! Run with:
//! cargo run -p session-cli-demo -- --base-url http://192.168.1.20:3000 --storage-type localstorage
//!
//! See `--help` for the other flags.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tv_session_auth::{SessionManager, storage::FileStore};
use tv_session_core::{
    CapabilityDescriptor, LoginClient, LoginError, LoginResponse, NoticeChannel,
    StaticCapabilities,
};
use tv_session_remote::{
    LifecycleReport, RemoteControlStore, RemoteInputConfig, RemoteInputSetting, RemoteKey,
    StatusLine, VideoSource, VideoSourceConfig, VideoSourceSetting,
};

/// Scripted stand-in for the backend login call.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoginScript {
    #[value(name = "ok")]
    Accept,
    Decline,
    Fail,
}

#[async_trait]
impl LoginClient for LoginScript {
    async fn login(&self) -> Result<LoginResponse, LoginError> {
        match self {
            Self::Accept => Ok(LoginResponse::accepted()),
            Self::Decline => Ok(LoginResponse::declined()),
            Self::Fail => Err(LoginError::Transport("backend unreachable".into())),
        }
    }
}

/// Walk through a session status check against a scripted backend.
#[derive(Parser, Debug)]
#[command(name = "session-cli", version)]
struct Args {
    /// Backend base URL; omit for "no backend configured"
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// `StorageType` the backend reports
    #[arg(long, value_name = "TYPE")]
    storage_type: Option<String>,

    /// Scripted result of the implicit login
    #[arg(long, value_enum, default_value_t = LoginScript::Accept)]
    login: LoginScript,

    /// Log out after the status check
    #[arg(long)]
    logout: bool,

    /// Settings file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Report the remote-control server as running at URL
    #[arg(long, value_name = "URL")]
    remote_url: Option<String>,

    /// Flip the remote input switch
    #[arg(long)]
    toggle_remote: bool,

    /// Video sources offered by the backend, as KEY=NAME
    #[arg(long = "source", value_name = "KEY=NAME", value_parser = parse_source)]
    sources: Vec<VideoSource>,

    /// Press select this many times on the video source section
    #[arg(long, default_value = "0")]
    select_presses: usize,
}

fn parse_source(raw: &str) -> Result<VideoSource, String> {
    let (key, name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=NAME, got {raw:?}"))?;
    Ok(VideoSource::new(key, name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let path = args
        .store
        .or_else(FileStore::default_path)
        .context("no platform config directory, pass --store")?;
    tracing::info!(path = %path.display(), "Using settings file");
    let store = Arc::new(FileStore::new(path));

    let capabilities = Arc::new(StaticCapabilities::new());
    if let Some(storage_type) = &args.storage_type {
        capabilities.set_shared(Some(CapabilityDescriptor::with_storage_type(
            storage_type.as_str(),
        )));
    }

    let notices = NoticeChannel::new();
    let mut notice_rx = notices.subscribe();

    let manager = SessionManager::new(
        Arc::clone(&store),
        args.login,
        capabilities,
        Arc::new(notices),
    );

    let mut state_rx = manager.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(state) = state_rx.recv().await {
            tracing::info!(
                phase = ?state.phase,
                login_modal_visible = state.login_modal_visible,
                "Session state changed"
            );
        }
    });

    let outcome = manager.check_login_status(args.base_url.as_deref()).await;
    println!("status check: {outcome:?}");
    while let Ok(notice) = notice_rx.try_recv() {
        println!("notice [{:?}]: {}", notice.kind, notice.text);
    }

    if args.logout {
        manager.logout().await;
    }
    println!("{}", serde_json::to_string_pretty(&manager.state())?);

    let remote = RemoteControlStore::new();
    let reader = remote.reader();
    if let Some(url) = args.remote_url {
        remote.apply(LifecycleReport::Started { url });
    }

    let input = RemoteInputSetting::load(Arc::clone(&store), RemoteInputConfig::default()).await;
    if args.toggle_remote {
        input
            .toggle(|| tracing::info!("Remote input setting changed"))
            .await;
    }
    println!("remote input enabled: {}", input.is_enabled());
    for line in input.status_lines(&reader.snapshot()) {
        match line {
            StatusLine::Service { running } => {
                println!("  service: {}", if running { "running" } else { "stopped" });
            }
            StatusLine::Address(url) => println!("  address: {url}"),
            StatusLine::Error(error) => println!("  error: {error}"),
        }
    }

    let sources =
        VideoSourceSetting::load(Arc::clone(&store), VideoSourceConfig::default(), args.sources)
            .await;
    sources.focus_section();
    for _ in 0..args.select_presses {
        sources
            .handle_remote_event(RemoteKey::Select, || {
                tracing::info!("Video source selection changed");
            })
            .await;
    }
    for row in sources.tiles().chunks(tv_session_remote::sources::GRID_COLUMNS) {
        let cells: Vec<String> = row
            .iter()
            .map(|tile| {
                format!(
                    "{}{} [{}]",
                    if tile.focused { ">" } else { " " },
                    tile.name,
                    if tile.enabled { "on" } else { "off" }
                )
            })
            .collect();
        println!("  {}", cells.join("  "));
    }

    drop(manager);
    watcher.await?;
    Ok(())
}
