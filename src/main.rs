use clap::Parser;
use motorpanel::cli::{self, Cli};
use motorpanel::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    tracing::debug!("Starting motorpanel {} ({})", motorpanel::VERSION, motorpanel::BUILD_DATE);
    cli::run(cli)
}
