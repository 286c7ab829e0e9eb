use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use scour::FetchConfig;

/// Runtime configuration for the `scour` binary.
///
/// These settings control where the directory API lives and how aggressively
/// the engine fetches from it. All values are parsed from CLI arguments or
/// environment variables, with defaults suitable for a large read-only
/// listing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "scour",
    version,
    about = "Fetch large directory collections fast via partitioned parallel pagination"
)]
pub struct CliArgs {
    /// Base URL of the directory API.
    ///
    /// Example: "https://directory.example.com/api/v1"
    ///
    /// Environment variable: `SCOUR_BASE_URL`
    #[arg(long, env = "SCOUR_BASE_URL")]
    pub base_url: String,

    /// Bearer token attached to every request.
    ///
    /// Acquiring and refreshing the token is out of scope; pass a valid one.
    ///
    /// Environment variable: `SCOUR_TOKEN`
    #[arg(long, env = "SCOUR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of concurrent fetch workers.
    ///
    /// For read-only listings a high value hides network latency; raise it
    /// until the server starts rate limiting.
    ///
    /// Environment variable: `SCOUR_CONCURRENCY`
    #[arg(long, env = "SCOUR_CONCURRENCY", default_value_t = 16)]
    pub concurrency: usize,

    /// Maximum requests coalesced into one wire-level batch. 1 disables
    /// batching.
    ///
    /// Batching amortizes per-call overhead but adds serialization without
    /// reducing total round trips for GET-only workloads, so the default
    /// stays at 1.
    ///
    /// Environment variable: `SCOUR_BATCH_SIZE`
    #[arg(long, env = "SCOUR_BATCH_SIZE", default_value_t = 1)]
    pub batch_size: usize,

    /// Page size requested from the API. Should be the maximum the server
    /// allows.
    ///
    /// Environment variable: `SCOUR_PAGE_SIZE`
    #[arg(long, env = "SCOUR_PAGE_SIZE", default_value_t = 999)]
    pub page_size: usize,

    /// Retry budget per page request for transient failures (rate limits,
    /// timeouts, 5xx).
    ///
    /// Environment variable: `SCOUR_MAX_RETRIES`
    #[arg(long, env = "SCOUR_MAX_RETRIES", default_value_t = 4)]
    pub max_retries: u32,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable aligned columns, sorted.
    Table,
    /// One pretty-printed JSON array.
    Json,
    /// One JSON object per line, unsorted, as items arrive.
    Raw,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Operate on organization users.
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Operate on organization groups.
    Groups {
        #[command(subcommand)]
        action: GroupsAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersAction {
    /// Fetch every user in the organization.
    List {
        /// Sortable attribute to partition and sort on.
        #[arg(long, default_value_t = String::from("name"))]
        sort_by: String,
    },
    /// Look up a single user by identifier.
    Get { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum GroupsAction {
    /// Fetch every group in the organization.
    List,
    /// Fetch all members of the named group.
    Members { name: String },
}

/// Validated runtime settings derived from [`CliArgs`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub fetch: FetchConfig,
    pub output: OutputFormat,
    pub command: Command,
}

impl TryFrom<CliArgs> for Settings {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let base_url = args.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("SCOUR_BASE_URL must not be empty");
        }

        let fetch = FetchConfig {
            concurrency_level: args.concurrency,
            batch_size: args.batch_size,
            page_size: args.page_size,
            retry: scour::RetryPolicy {
                max_attempts: args.max_retries,
                ..scour::RetryPolicy::default()
            },
            ..FetchConfig::default()
        };
        fetch.validate()?;

        Ok(Self {
            base_url,
            token: args.token,
            fetch,
            output: args.output,
            command: args.command,
        })
    }
}
