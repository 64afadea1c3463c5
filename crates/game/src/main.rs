use std::process::ExitCode;

use tracing::error;

mod app;

fn main() -> ExitCode {
    app::bootstrap::init_tracing();

    let mode = match app::bootstrap::parse_run_mode(std::env::args().skip(1)) {
        Ok(mode) => mode,
        Err(message) => {
            error!(error = %message, "usage: keepsake [--headless FRAMES]");
            return ExitCode::from(2);
        }
    };
    let wiring = match app::bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    app::loop_runner::run(wiring, mode)
}
