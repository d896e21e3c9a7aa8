//! Wraith entry point.
//!
//! Reads player input from stdin, one line at a time, and presents UI
//! requests through the log until the player quits, the story ends, or the
//! process is interrupted.

use std::error::Error;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use wraith_app::config::AppConfig;
use wraith_app::context::{AppContext, AppDeps};
use wraith_app::ui::{self, LogPresenter};
use wraith_app::{input, telemetry};

/// How often the UI loop drains pending requests.
const FRAME: Duration = Duration::from_millis(16);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    telemetry::init(config.log_format);

    info!(workers = config.workers, save_path = %config.save_path.display(), "Starting Wraith");

    let deps = AppDeps::production(&config).await?;
    let (ui_tx, mut ui_rx) = ui::channel();
    let context = AppContext::build(&config.dispatch(), deps, &ui_tx)?;
    context.start().await?;

    let mut presenter = LogPresenter::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ended = context.ended();
    let mut frame = tokio::time::interval(FRAME);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = frame.tick() => {
                ui_rx.drain(&mut presenter);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("input closed");
                    break;
                };
                if !context.handle_input(input::parse(&line)) {
                    break;
                }
            }
            changed = ended.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(ending) = *ended.borrow() {
                    info!(%ending, "story over");
                    break;
                }
            }
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    context.shutdown().await?;
    ui_rx.drain(&mut presenter);
    info!(presented = presenter.presented(), "Wraith exited");
    Ok(())
}
