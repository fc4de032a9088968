//! Subcommand implementations. Each command reads the configuration dump,
//! drives the pipeline worker through the stage messages it needs, and
//! writes the resulting CSV to stdout or a file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use application::pipeline_service_impl::PolicyPipelineService;
use application::worker::{PipelineHandle, spawn_pipeline};
use infrastructure::config::Settings;
use ports::primary::pipeline_port::{PipelineCommand, PipelineEvent};

use crate::cli::{Command, InputArgs};

pub async fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Version => {
            println!("fortiflat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::List { input } => cmd_list(&input, settings.pipeline.channel_capacity).await,
        Command::Normalize { input } => {
            cmd_normalize(&input, settings.pipeline.channel_capacity).await
        }
        Command::Flatten {
            input,
            addresses,
            services,
        } => {
            // Bare `flatten` takes both toggles from the settings file;
            // naming either flag switches to explicit flags.
            let (addresses, services) = if addresses || services {
                (addresses, services)
            } else {
                (settings.flatten.addresses, settings.flatten.services)
            };
            cmd_flatten(
                &input,
                addresses,
                services,
                settings.pipeline.channel_capacity,
            )
            .await
        }
        Command::Lookup {
            input,
            list,
            without_ineffectual,
            fqdn_geo_match_all,
        } => {
            let fqdn_geo_match_all = fqdn_geo_match_all || settings.lookup.fqdn_geo_match_all;
            cmd_lookup(&input, &list, without_ineffectual, fqdn_geo_match_all, settings).await
        }
    }
}

async fn cmd_list(input: &InputArgs, capacity: usize) -> Result<()> {
    let mut handle = start_pipeline(input, capacity).await?;
    let PipelineEvent::ListMade(listings) = next_event(&mut handle).await? else {
        bail!("unexpected pipeline event");
    };
    let mut text = listings.addresses;
    if !listings.services.is_empty() {
        if !text.is_empty() {
            text.push_str("\r\n");
        }
        text.push_str(&listings.services);
    }
    write_output(input.output.as_deref(), &text)
}

async fn cmd_normalize(input: &InputArgs, capacity: usize) -> Result<()> {
    let mut handle = start_pipeline(input, capacity).await?;
    next_event(&mut handle).await?;
    handle.commands.send(PipelineCommand::Normalize).await?;
    let PipelineEvent::Normalized(text) = next_event(&mut handle).await? else {
        bail!("unexpected pipeline event");
    };
    write_output(input.output.as_deref(), &text)
}

async fn cmd_flatten(
    input: &InputArgs,
    addresses: bool,
    services: bool,
    capacity: usize,
) -> Result<()> {
    let mut handle = start_pipeline(input, capacity).await?;
    next_event(&mut handle).await?;
    handle
        .commands
        .send(PipelineCommand::Flatten {
            flatten_addresses: addresses,
            flatten_services: services,
        })
        .await?;
    let PipelineEvent::Flattened(text) = next_event(&mut handle).await? else {
        bail!("unexpected pipeline event");
    };
    write_output(input.output.as_deref(), &text)
}

async fn cmd_lookup(
    input: &InputArgs,
    list_path: &str,
    without_ineffectual: bool,
    fqdn_geo_match_all: bool,
    settings: &Settings,
) -> Result<()> {
    let list_text = std::fs::read_to_string(list_path)
        .with_context(|| format!("failed to read lookup list {list_path}"))?;

    let mut handle = start_pipeline(input, settings.pipeline.channel_capacity).await?;
    next_event(&mut handle).await?;
    handle
        .commands
        .send(PipelineCommand::Flatten {
            flatten_addresses: settings.flatten.addresses,
            flatten_services: settings.flatten.services,
        })
        .await?;
    next_event(&mut handle).await?;
    handle
        .commands
        .send(PipelineCommand::Lookup {
            list_text,
            fqdn_geo_match_all,
        })
        .await?;
    let PipelineEvent::LookedUp(output) = next_event(&mut handle).await? else {
        bail!("unexpected pipeline event");
    };
    let text = if without_ineffectual {
        output.without_ineffectual
    } else {
        output.all
    };
    write_output(input.output.as_deref(), &text)
}

/// Read the config dump and spawn a worker with the parse already posted.
async fn start_pipeline(input: &InputArgs, capacity: usize) -> Result<PipelineHandle> {
    let config_text = std::fs::read_to_string(&input.config)
        .with_context(|| format!("failed to read configuration {}", input.config))?;
    let handle = spawn_pipeline(PolicyPipelineService::new(), capacity);
    handle
        .commands
        .send(PipelineCommand::MakeList {
            config_text,
        })
        .await?;
    Ok(handle)
}

async fn next_event(handle: &mut PipelineHandle) -> Result<PipelineEvent> {
    handle
        .events
        .recv()
        .await
        .context("pipeline worker stopped unexpectedly")
}

fn write_output(path: Option<&str>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(Path::new(path), text)
                .with_context(|| format!("failed to write {path}"))?;
            tracing::info!(path, bytes = text.len(), "output written");
        }
        None => println!("{text}"),
    }
    Ok(())
}
