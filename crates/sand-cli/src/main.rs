//! Binary entrypoint for the sand mission agent.

use std::process;

/// Runs the mission on a single-threaded runtime and exits with its status.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit_code = sand_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
