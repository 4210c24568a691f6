//! skyway binary entry point.

use skyway::deploy::DeployError;
use skyway::ui::output;

/// Exit code for a run interrupted by the operator (128 + SIGINT).
const EXIT_CANCELLED: i32 = 130;

fn main() {
    if let Err(err) = skyway::cli::run() {
        if err
            .downcast_ref::<DeployError>()
            .is_some_and(DeployError::is_cancelled)
        {
            eprintln!("cancelled");
            std::process::exit(EXIT_CANCELLED);
        }
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
