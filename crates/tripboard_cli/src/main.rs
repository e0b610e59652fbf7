//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load the board from a fixture (or the demo data) and print the markup.
//! - Keep output deterministic for quick local sanity checks.

use log::{error, info};
use std::error::Error;
use std::rc::Rc;
use tripboard_core::{
    init_logging, CoreConfig, Dom, EventsModel, FixtureApi, InitOutcome, TripPresenter,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_logging(&config.logging())?;

    let api = match &config.fixture {
        Some(path) => FixtureApi::from_path(path)?,
        None => FixtureApi::demo(),
    };
    let model = Rc::new(EventsModel::with_api(Rc::new(api)));
    let dom = Dom::new();
    let board = TripPresenter::new(Rc::clone(&model), &dom, dom.body());
    board.init()?;

    match model.initialize().await? {
        InitOutcome::Loaded { count } => {
            info!("event=cli_run module=cli status=ok count={count}");
        }
        InitOutcome::Degraded(err) => {
            error!("event=cli_run module=cli status=degraded error={err}");
            eprintln!("tripboard: data unavailable: {err}");
        }
    }

    println!("tripboard_core version={}", tripboard_core::core_version());
    println!("{}", dom.outer_html(dom.body())?);
    board.destroy();
    Ok(())
}
