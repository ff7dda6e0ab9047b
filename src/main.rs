use layer_mount::cli::{Args, Runner};
use layer_mount::logging::Logger;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();

    let result = match Runner::new(args) {
        Ok(runner) => runner.run().await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            Logger::new(false).error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
