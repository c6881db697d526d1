//! Desktop host for trying widgets against the live API.
//!
//! Runs the HTTP host with a real upstream client. Widgets are driven with
//! plain HTTP calls and their images viewed in a browser.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_host --features web
//! ```
//!
//! Optionally start a widget right away with a stop and line filter:
//!
//! ```sh
//! cargo run --example desktop_host --features web -- 4111 U1,U4
//! ```
//!
//! Then open `http://localhost:8080/api/widgets/demo/image`.
//!
//! # Configuration
//!
//! Every setting can be overridden from the environment, e.g.
//! `DEPARTURES_WEB__PORT=3000` or `DEPARTURES_UPSTREAM__CACHE_TTL_MS=10000`.
//! Log levels follow `RUST_LOG` (default `info`).

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use rs_departures::hal::{MemorySurface, MonotonicClock, ReqwestTransport};
use rs_departures::services::{run_server, WebServerConfig};
use rs_departures::{Config, DepartureMonitor, UpstreamClient, WidgetSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;

    let transport =
        ReqwestTransport::new(&config.upstream).context("failed to build HTTP client")?;
    let client = UpstreamClient::new(transport, MonotonicClock::new(), &config.upstream)
        .context("invalid upstream configuration")?;
    let monitor = DepartureMonitor::new(client, MemorySurface::new(), config.monitor.clone());

    let mut args = std::env::args().skip(1);
    if let Some(rbl) = args.next() {
        let mut settings = WidgetSettings::for_stop(rbl);
        if let Some(filter) = args.next() {
            settings = settings.with_line_filter(&filter);
        }
        monitor.start_monitoring("demo", settings).await;
    }

    let web_config = WebServerConfig::from_config(&config.web);
    println!("=================================");
    println!("  rs-departures desktop host");
    println!("=================================");
    println!();
    println!("  Widgets: http://{}/api/widgets", web_config.addr);
    println!("  Cache:   http://{}/api/cache", web_config.addr);
    println!();
    println!("Press Ctrl+C to stop.");

    run_server(monitor, web_config)
        .await
        .context("web server failed")
}
