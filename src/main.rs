use clap::Parser;
use gdtkit::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Position(args) => gdtkit::cli::commands::position::run(args, &cli.global),
        Commands::Flatness(args) => gdtkit::cli::commands::flatness::run(args, &cli.global),
        Commands::Perp(args) => gdtkit::cli::commands::perpendicularity::run(args, &cli.global),
        Commands::Profile(args) => gdtkit::cli::commands::profile::run(args, &cli.global),
        Commands::Stackup(args) => gdtkit::cli::commands::stackup::run(args, &cli.global),
    }
}
