use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;
use minus::{Pager, page_all};
use stitch::artifacts::core::PagerWriter;
use stitch::artifacts::unified::UnifiedOptions;
use stitch::commands::Console;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stitch",
    version = "0.1.0",
    about = "A line-level diff and patch tool",
    long_about = "Stitch compares text files line by line, prints unified diffs, \
    and applies unified patches back onto their targets. \
    It is the command-line surface of the stitch overlay and versioning library.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "diff",
        about = "Compare two files and print a unified diff",
        long_about = "This command compares two files line by line and prints their differences \
        in the unified diff format. Identical files print a short notice instead."
    )]
    Diff {
        #[arg(index = 1, help = "The original file")]
        old: String,
        #[arg(index = 2, help = "The modified file")]
        new: String,
        #[arg(long, default_value_t = 3, help = "Unchanged lines kept around each change")]
        context: usize,
        #[arg(long, default_value_t = 3, help = "Maximum gap between changes sharing a hunk")]
        proximity: usize,
        #[arg(long, help = "Use the patience algorithm instead of Myers")]
        patience: bool,
        #[arg(long, help = "Print change counts instead of the diff")]
        stat: bool,
    },
    #[command(
        name = "apply",
        about = "Apply a unified diff to a file",
        long_about = "This command parses a unified diff and applies its hunks to the target file. \
        The patched content goes to stdout unless an output file is given."
    )]
    Apply {
        #[arg(index = 1, help = "The file to patch")]
        target: String,
        #[arg(index = 2, help = "The unified diff to apply")]
        patch: String,
        #[arg(short, long, help = "Write the patched content to this file")]
        output: Option<String>,
    },
    #[command(
        name = "stats",
        about = "Print the change counts of a unified diff",
        long_about = "This command parses a unified diff and prints how many lines it adds, \
        deletes, and changes."
    )]
    Stats {
        #[arg(index = 1, help = "The unified diff to summarize")]
        patch: String,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Diff {
            old,
            new,
            context,
            proximity,
            patience,
            stat,
        } => {
            let mut options = UnifiedOptions::new();
            options.set_context(*context).set_proximity(*proximity);

            let use_pager =
                std::io::stdout().is_terminal() && std::env::var_os("NO_PAGER").is_none();
            if use_pager {
                let pager = Pager::new();
                let console = Console::new(Box::new(PagerWriter::new(pager.clone())));
                console.diff(old.as_ref(), new.as_ref(), &options, *patience, *stat)?;
                page_all(pager)?;
            } else {
                let console = Console::new(Box::new(std::io::stdout()));
                console.diff(old.as_ref(), new.as_ref(), &options, *patience, *stat)?;
            }
        }
        Commands::Apply {
            target,
            patch,
            output,
        } => {
            let console = Console::new(Box::new(std::io::stdout()));
            console.apply(
                target.as_ref(),
                patch.as_ref(),
                output.as_deref().map(std::path::Path::new),
            )?;
        }
        Commands::Stats { patch } => {
            let console = Console::new(Box::new(std::io::stdout()));
            console.stats(patch.as_ref())?;
        }
    }

    Ok(())
}
