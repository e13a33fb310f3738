use clap::Parser;
use log::{debug, error};

use churchen::{App, Cli, Config, Result};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.clone())?;
    if let Some(base) = cli.api_base {
        config.api_base = base.trim_end_matches('/').to_string();
    }

    let mut app = App::new(config, cli.config)?;
    app.run(cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);
    debug!("churchen starting up");

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
