//! 🚀 rvx-cli — the front door, the bouncer, the maitre d' of rvx.
//!
//! 🎬 *[narrator voice]* "It all started with a CSV nobody wanted to open in a spreadsheet..."
//! 📦 This binary crate is the thin CLI wrapper that loads config,
//! sets up logging, and then lets the library do the heavy lifting.
//! Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use rvx::IngestReport;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🚜 Stream CSV rows into a record store, in batches.
#[derive(Debug, Parser)]
#[command(name = "rvx", version, about)]
struct Cli {
    /// 🔧 TOML config file. Env vars (`RVX_*`) apply either way.
    #[arg(long, global = true, env = "RVX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 📥 Ingest one CSV file and print the counts.
    Ingest {
        /// 📄 The CSV file. First line is the header.
        file: PathBuf,
    },
    /// 🌐 Serve `POST /upload` and `GET /list` until Ctrl-C.
    Serve,
}

/// 🚀 main() — where it all begins.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Run the thing (send it and pray 🙏)
/// 5. Handle errors (cry)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 Set up tracing — because println! debugging is a lifestyle choice
    // we're trying to move past, like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("💀 error: {}", err);
        // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
        for cause in err.chain().skip(1) {
            error!("⚠️  cause: {}", cause);
        }
        // 🗑️ Exit with prejudice. Process exitus maximus.
        std::process::exit(1);
    }

    // ✅ If we got here, everything worked. Pop the champagne. 🍾
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    // 🔒 Validate the config file exists before we get too emotionally attached
    if let Some(config_file) = &cli.config {
        let exists = config_file.try_exists().context(format!(
            "💀 Couldn't check whether the config file exists. Was checking here: '{}'",
            config_file.display()
        ))?;
        if !exists {
            anyhow::bail!(
                "💀 Config file '{}' does not exist. If it's a relative path, check your cwd, \
                 or use an absolute path to be absolutely certain.",
                config_file.display()
            );
        }
    }

    let app_config = rvx::app_config::load_config(cli.config.as_deref())
        .context("💀 In rvx-cli, we couldn't load the config. Take a look at the file and the RVX_* env vars.")?;

    match cli.command {
        Command::Ingest { file } => {
            let report = rvx::ingest_file(&app_config, &file).await?;
            println!("{}", report_table(&report));
        }
        Command::Serve => rvx::serve(app_config).await?,
    }
    Ok(())
}

/// 🧾 The receipt, framed.
fn report_table(report: &IngestReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["", "count"]);
    for (label, value) in [
        ("inserted", report.inserted_count),
        ("total lines", report.total_lines),
        ("skipped lines", report.skipped_lines),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
