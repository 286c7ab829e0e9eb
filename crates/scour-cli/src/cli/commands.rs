//! Subcommand execution.
//!
//! Each listing subcommand assembles a [`Fetcher`] over the REST backend and
//! consumes the stream whole (table/json) or item-by-item as results arrive
//! (raw). Single-object lookups bypass the engine entirely; they are one
//! request with nothing to parallelize.

use crate::cli::{
    config::{Command, GroupsAction, OutputFormat, Settings, UsersAction},
    output,
    rest::{Record, RestDirectory},
};
use anyhow::{Context, bail};
use scour::{FetchReport, FetchStream, Fetcher, PartitionSpec};
use tokio_stream::StreamExt;

const USER_COLUMNS: &[&str] = &["id", "name", "email"];
const GROUP_COLUMNS: &[&str] = &["id", "name"];

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    match settings.command.clone() {
        Command::Users {
            action: UsersAction::List { sort_by },
        } => list(&settings, "users".into(), &sort_by, USER_COLUMNS).await,
        Command::Users {
            action: UsersAction::Get { id },
        } => get_user(&settings, &id).await,
        Command::Groups {
            action: GroupsAction::List,
        } => list(&settings, "groups".into(), "name", GROUP_COLUMNS).await,
        Command::Groups {
            action: GroupsAction::Members { name },
        } => members(&settings, &name).await,
    }
}

/// Full-collection listing through the engine.
async fn list(
    settings: &Settings,
    collection: String,
    sort_by: &str,
    columns: &[&str],
) -> anyhow::Result<()> {
    let directory = RestDirectory::new(&settings.base_url, &collection, settings.token.clone())?;
    let fetcher = Fetcher::new(directory, settings.fetch.clone())?;
    let stream = fetcher.fetch(&PartitionSpec::new(sort_by))?;

    let report = match settings.output {
        OutputFormat::Raw => stream_raw(stream).await?,
        format => {
            let (items, report) = tokio::select! {
                collected = stream.collect() => collected?,
                _ = tokio::signal::ctrl_c() => bail!("interrupted"),
            };
            match format {
                OutputFormat::Table => {
                    print!("{}", output::format_table(&items, columns, sort_by));
                }
                OutputFormat::Json => println!("{}", output::format_json(&items)?),
                OutputFormat::Raw => unreachable!(),
            }
            report
        }
    };

    if !report.is_complete() {
        for failure in &report.failures {
            tracing::warn!(
                partition = failure.partition,
                error = %failure.error,
                "Partition failed"
            );
        }
        bail!(
            "fetch incomplete: {} partition(s) failed",
            report.failures.len()
        );
    }
    Ok(())
}

/// Raw mode prints each record the moment it arrives: time-to-first-line is
/// one page round trip, not the whole fetch.
async fn stream_raw(mut stream: FetchStream<Record>) -> anyhow::Result<FetchReport> {
    loop {
        tokio::select! {
            next = stream.next() => match next {
                Some(record) => println!("{}", output::format_line(&record?)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                stream.cancel();
                bail!("interrupted");
            }
        }
    }
    Ok(stream.report())
}

async fn get_user(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let directory = RestDirectory::new(&settings.base_url, "users", settings.token.clone())?;
    let user = directory
        .get_one(id)
        .await
        .context("user lookup failed")?;

    match user {
        Some(record) => render_one(settings, &record, USER_COLUMNS),
        None => bail!("user not found: {id}"),
    }
}

async fn members(settings: &Settings, name: &str) -> anyhow::Result<()> {
    let groups = RestDirectory::new(&settings.base_url, "groups", settings.token.clone())?;
    let group = groups
        .find_by_name(name)
        .await
        .context("group lookup failed")?;

    let Some(group) = group else {
        bail!("group not found: {name}");
    };
    let id = output::field(&group, "id");
    if id.is_empty() {
        bail!("group record for {name:?} carries no id");
    }

    list(
        settings,
        format!("groups/{id}/members"),
        "name",
        USER_COLUMNS,
    )
    .await
}

fn render_one(settings: &Settings, record: &Record, columns: &[&str]) -> anyhow::Result<()> {
    match settings.output {
        OutputFormat::Table => {
            let records = vec![record.clone()];
            print!("{}", output::format_table(&records, columns, columns[0]));
        }
        OutputFormat::Json | OutputFormat::Raw => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }
    Ok(())
}
