use anyhow::Result;
use clap::Parser;
use tracing::Instrument;

use main_branch::cli::commands::MigrateCommand;
use main_branch::cli::Cli;
use main_branch::{create_run_span, generate_correlation_id, init_telemetry, MainBranchConfig, Outcome};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let exit_code = match run(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("{e}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<Outcome> {
    MainBranchConfig::load_env_file()?;
    let mut config = MainBranchConfig::load()?;
    cli.apply_overrides(&mut config);
    init_telemetry(&config.logging.level, config.logging.json)?;

    let operation = cli.command.operation();
    let repo = cli.command.branch_args().repo.clone();
    let correlation_id = generate_correlation_id();
    let span = create_run_span(operation.name(), &repo.to_string(), &correlation_id);

    let command = MigrateCommand::new(operation, repo, config).with_prompt(!cli.no_prompt);
    command.execute().instrument(span).await
}
