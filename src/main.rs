//! taskstrip
//!
//! A taskbar panel for EWMH window managers: a dock window along one screen
//! edge holding a configurable row of widgets (task list, clock, desktop
//! switcher, launchers).

mod config;
mod error;
mod geometry;
mod panel;
mod widgets;
mod x;

#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use x11rb::connection::Connection;

use crate::error::PanelError;
use crate::panel::render::{Color, CorePainter};
use crate::panel::Panel;
use crate::x::connection::X11Transport;
use crate::x::events::EventSource;
use crate::x::{Atoms, XContext};

const TICK: Duration = Duration::from_secs(1);

fn run() -> Result<()> {
    let config = config::Config::load()?;

    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
    let conn = Rc::new(conn);
    let root = conn.setup().roots[screen_num].root;
    info!("Connected to X server (screen {})", screen_num);

    let atoms = Atoms::new(&*conn).context("Failed to intern atoms")?;
    let frame = panel::window::create_panel_window(&conn, screen_num, &atoms, &config.panel)?;
    let x = XContext::new(Box::new(X11Transport::new(conn.clone(), screen_num)), atoms, root);
    x.select_property_changes(root)?;

    let widgets = config
        .widgets
        .iter()
        .map(|w| widgets::build(w, &config.theme))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let background = Color::parse(&config.theme.background)
        .with_context(|| format!("Invalid panel background {:?}", config.theme.background))?;

    let mut painter = CorePainter::new(conn.clone(), screen_num, &frame)?;
    let mut panel = Panel::new(x, frame, background, widgets)?;
    let mut events = EventSource::new(&conn)?;
    let mut next_tick = Instant::now() + TICK;

    info!("Starting main event loop");
    loop {
        while let Some(event) = conn.poll_for_event().map_err(PanelError::from)? {
            panel.handle_event(event)?;
        }

        let now = Instant::now();
        if now >= next_tick {
            panel.tick()?;
            next_tick = now + TICK;
        }

        if panel.render(&mut painter)? {
            painter.present()?;
        }
        panel.x().flush()?;

        events.wait_readable(next_tick.saturating_duration_since(Instant::now()))?;
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskstrip=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting taskstrip");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PanelError>() {
                Some(PanelError::ConnectionLost(_)) => error!("Display connection lost: {}", e),
                _ => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
