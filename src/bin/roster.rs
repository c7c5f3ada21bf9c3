//! Student roster editor. The roster lives in memory and is gone on exit.
use library_roster_manager::{logging, run_app, AppConfig, RosterApp};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.log_path("roster"))?;
    log::info!("roster editor started");

    let mut app = RosterApp::default();
    run_app(&mut app)
}
