//! regfetch CLI: degree audits and registrar pages into a local cache tree.

mod commands;

use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse_checked();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
