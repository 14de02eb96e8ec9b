// crates/cli/src/main.rs
//! `bulkadd`: add companies to a collection and follow the job to the end.

mod args;
mod commands;
mod render;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bulkadd_client::HttpJobsApi;
use bulkadd_core::JobsApi;
use bulkadd_sim::{SimConfig, SimulatedJobsApi};
use clap::Parser;

use crate::args::{Cli, Command};
use crate::commands::AddOutcome;
use crate::render::Renderer;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    bulkadd_observability::init_tracing(cli.log_level())?;

    let api: Arc<dyn JobsApi> = if cli.simulate {
        tracing::info!(companies = cli.sim_companies, "Using simulated server");
        Arc::new(SimulatedJobsApi::new(
            SimConfig::default().with_companies(cli.sim_companies),
        ))
    } else {
        Arc::new(HttpJobsApi::new(cli.client_config()).context("failed to build HTTP client")?)
    };

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Command::Collections => commands::collections(api.as_ref(), cli.json, &mut stdout).await?,
        Command::Items {
            collection,
            offset,
            limit,
        } => commands::items(api.as_ref(), collection, *offset, *limit, cli.json, &mut stdout).await?,
        Command::Status { job_id } => commands::status(api.as_ref(), *job_id, cli.json, &mut stdout).await?,
        Command::Cancel { job_id } => commands::cancel(api.as_ref(), *job_id, cli.json, &mut stdout).await?,
        Command::Add { target, items } => {
            let request = commands::add_request(
                api.as_ref(),
                target.as_deref(),
                &items.ids,
                items.source.as_deref(),
            )
            .await?;

            let mut renderer = Renderer::new(&mut stdout, cli.json);
            let outcome = commands::add(Arc::clone(&api), &cli.tracker_config(), request, &mut renderer).await?;
            match &outcome {
                AddOutcome::Lost { job_id, error } => {
                    eprintln!("Lost track of job {job_id}: {error}");
                    eprintln!("It may still be running. Check with `bulkadd status {job_id}`.");
                }
                AddOutcome::Failed(status) => {
                    eprintln!("Job ended as {} after {} of {}", status.state, status.processed, status.total);
                }
                _ => {}
            }
            if !outcome.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
