use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> anyhow::Result<ExitCode> {
    let cli = dgsi_harvest::cli::Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    dgsi_harvest::logging::init(default_level).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        dgsi_harvest::cli::Command::Run(args) => {
            let report = dgsi_harvest::harvest::run(args).context("run")?;
            if let Some(url) = &report.failed {
                println!("failed {url}");
                return Ok(ExitCode::FAILURE);
            }
            println!(
                "{} of {} documents extracted ({} skipped)",
                report.extracted,
                report.links,
                report.skipped.len()
            );
        }
        dgsi_harvest::cli::Command::Links(args) => {
            dgsi_harvest::crawl::run(args).context("links")?;
        }
        dgsi_harvest::cli::Command::Extract(args) => {
            dgsi_harvest::extract::run(args).context("extract")?;
        }
        dgsi_harvest::cli::Command::Show(args) => {
            dgsi_harvest::store::show(args).context("show")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
