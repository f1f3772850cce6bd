//! CLI entry point for growing hyperbolic tile worlds

use clap::Parser;
use hypertile::io::cli::{Cli, CommandRunner};
use hypertile::io::logging::init_logging;

fn main() -> hypertile::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.settings.verbose, cli.settings.quiet)?;
    let runner = CommandRunner::new(cli);
    runner.run()
}
