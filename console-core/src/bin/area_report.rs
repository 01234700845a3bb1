//! Print one rendered console frame for a work site as JSON.
//!
//! # Examples
//! ```sh
//! AREA_CONSOLE_API_BASE_URL=https://obras.example.test/api/ \
//!   cargo run -p console-core --bin area-report -- --obra 3 --role supervisor --user 10
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use console_core::ConsoleSettings;
use console_core::domain::{AreaConsole, AreaId, ConsolePorts, ObraId, Role, UserId, Viewer};
use console_core::outbound::http::HttpConsoleApi;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `area-report` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "area-report",
    about = "Load a work site's areas, cameras, reports, and users and print the rendered view",
    version
)]
struct CliArgs {
    /// Work site to open.
    #[arg(long = "obra", value_name = "id")]
    obra: i64,
    /// Viewer role: `coordinator` (or `coordinador`) or `supervisor`.
    #[arg(
        long = "role",
        value_name = "role",
        default_value = "coordinator",
        value_parser = parse_role
    )]
    role: Role,
    /// Viewer's user id; supervisors only see areas assigned to it.
    #[arg(long = "user", value_name = "id", default_value_t = 0)]
    user: i64,
    /// Case-insensitive search over area names and descriptions.
    #[arg(long = "search", value_name = "term", default_value = "")]
    search: String,
    /// Area to open in the detail view.
    #[arg(long = "area", value_name = "id")]
    area: Option<i64>,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "coordinator" | "coordinador" => Ok(Role::Coordinator),
        "supervisor" => Ok(Role::Supervisor),
        other => Err(format!("unknown role {other:?}")),
    }
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ConsoleSettings::load_from_iter([OsString::from("area-report")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let base_url = settings.base_url().map_err(io::Error::other)?;
    let timeout = settings.request_timeout().map_err(io::Error::other)?;
    let api = HttpConsoleApi::new(base_url, timeout, settings.user_agent())
        .map_err(|error| io::Error::other(format!("build HTTP client: {error}")))?;

    let console = AreaConsole::new(
        ConsolePorts::from_backend(Arc::new(api)),
        Arc::new(DefaultClock),
    );
    let id_obra = ObraId::new(args.obra);
    console.open_site(id_obra);
    let banners = console.sync().await;
    if !banners.is_empty() {
        info!(%id_obra, failed = banners.len(), "some collections failed to load");
    }

    if let Some(id) = args.area {
        console
            .navigation()
            .with(|nav| nav.select(AreaId::new(id)))
            .map_err(io::Error::other)?;
    }

    let viewer = Viewer {
        role: args.role,
        user_id: UserId::new(args.user),
    };
    let frame = console.render(viewer, &args.search);

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &frame).map_err(io::Error::other)?;
    writeln!(stdout)
}
