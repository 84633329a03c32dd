//! StaffWatch
//!
//! Live monitoring engine for game-server admin panels: per-session monitor
//! tasks diff successive panel polls into change notifications, and
//! refresher tasks keep the open live view edited in place. This binary
//! wires the engine to a console delivery adapter; a chat transport plugs
//! into the same `Delivery` trait.

mod config;
mod delivery;
mod engine;
mod logging;
mod monitor;
mod refresher;
mod render;
mod session;
mod snapshot;
mod supervisor;
#[cfg(test)]
mod testutil;
mod view;

use std::sync::Arc;

use clap::Parser;
use staffwatch_panel::{LoginRequest, PanelApi, PanelClient};
use staffwatch_protocol::{UserId, ViewKind, ViewParams};
use tracing::info;

use crate::config::Config;
use crate::delivery::ConsoleDelivery;
use crate::engine::{Engine, EngineError};
use crate::render::PanelRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let _logging = logging::init_logging()?;

    info!(
        component = "main",
        event = "server.starting",
        base_url = %config.base_url,
        "Starting StaffWatch"
    );

    let panel: Arc<dyn PanelApi> = Arc::new(PanelClient::with_timeout(
        config.base_url.clone(),
        config.request_timeout(),
    )?);
    let renderer = Arc::new(PanelRenderer::new(Arc::clone(&panel)));
    let delivery = Arc::new(ConsoleDelivery::new());
    let engine = Engine::new(panel, delivery, renderer, config.engine_config());

    // Single local operator session on the console channel.
    let user = UserId(0);
    let channel = 0;
    let request = LoginRequest {
        login: config.account.clone(),
        password: config.password.clone(),
        server_id: config.server.clone(),
        code: config.code.clone(),
    };

    match engine.login(user, channel, request).await {
        Ok(session) => {
            println!(
                "Logged in as {} on {} (level {})",
                session.auth.account_login, session.auth.server_id, session.admin_level
            );
        }
        Err(EngineError::Auth(message)) => {
            eprintln!("Authorization failed: {message}");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    }

    let kind = parse_view(&config.view)?;
    engine
        .open_view(user, channel, kind, ViewParams::default())
        .await?;

    println!("Monitoring. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!(
        component = "main",
        event = "server.stopping",
        "Shutdown requested"
    );
    engine.logout(user);
    engine.shutdown().await;
    println!("Stopped.");
    Ok(())
}

fn parse_view(name: &str) -> anyhow::Result<ViewKind> {
    match name.to_ascii_lowercase().as_str() {
        "summary" => Ok(ViewKind::Summary),
        "online" => Ok(ViewKind::Online),
        "reports" => Ok(ViewKind::Reports),
        "servers" => Ok(ViewKind::Servers),
        other => anyhow::bail!("unknown view '{other}' (expected summary, online, reports or servers)"),
    }
}
