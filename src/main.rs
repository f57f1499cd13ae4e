use anyhow::Context;
use inventory_smoke::configuration::get_configuration;
use inventory_smoke::runner::SmokeRunner;
use inventory_smoke::telemetry::{get_subscriber, init_subscriber};

// Requests are awaited one at a time; a single-threaded runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries the test lines
    let subscriber = get_subscriber("inventory-smoke".into(), "info".into(), std::io::stderr);
    init_subscriber(subscriber)?;

    let configuration = get_configuration().context("Failed to read configuration.")?;
    tracing::info!(base_url = %configuration.target.base_url, "Starting smoke run");

    let runner = SmokeRunner::build(&configuration, std::io::stdout())?;
    let report = runner.run().await?;

    for failure in report.failures() {
        tracing::warn!(test = failure.name, "Failed check");
    }
    std::process::exit(report.exit_code());
}
