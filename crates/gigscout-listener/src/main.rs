// Entry point of the `gigscout` process.
//
// Loads `.env`, parses the command line (every flag has an env fallback),
// creates the HostContext and hands over to the Runner.

use clap::Parser;
use gigscout_common::constants::return_code;
use gigscout_common::host_context::HostContext;

use gigscout_listener::command_settings::CommandSettings;
use gigscout_listener::runner::Runner;

fn main() {
    // A missing .env is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = CommandSettings::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime");

    let exit_code = runtime.block_on(run(cli));

    std::process::exit(exit_code);
}

async fn run(cli: CommandSettings) -> i32 {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("gigscout process starting.");
    tracing::info!("  Version = {}", gigscout_sdk::Package::VERSION);
    tracing::info!("  Commit  = {}", gigscout_sdk::Source::COMMIT_HASH);

    let command = cli.command();
    let context = HostContext::new(cli.settings);
    let runner = Runner::new(context);

    match runner.execute(command).await {
        Ok(exit_code) => {
            tracing::info!("gigscout exiting with code {}", exit_code);
            exit_code
        }
        Err(e) => {
            tracing::error!("gigscout failed: {:#}", e);
            return_code::TERMINATED_ERROR
        }
    }
}
