//! Command-line utility for administering a running mail server
//!
//! Usage: `mailctl -h <addr> [-p <n>] <command> [arguments...]`

use std::process::ExitCode;

use mailctl::{RemoteConnector, Shell, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    Shell::default()
        .run(
            std::env::args_os().skip(1),
            &RemoteConnector,
            &mut std::io::stdout().lock(),
            &mut std::io::stderr().lock(),
        )
        .await
}
