use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use opwrap::{Client, Criteria};
use tracing_subscriber::EnvFilter;

mod config;

use config::OpwrapConfig;

/// opwrap - read 1Password items through the op CLI
#[derive(Parser, Debug)]
#[command(name = "opwrap")]
#[command(about = "Read 1Password items through the op CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/opwrap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 1Password account (shorthand, sign-in address or UUID)
    #[arg(long, global = true)]
    account: Option<String>,

    /// Path to the op binary
    #[arg(long, global = true)]
    program: Option<String>,

    /// Log every op invocation
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an item as JSON, or a single property of it
    Get {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Print only this property (field accessor or top-level key)
        #[arg(long)]
        field: Option<String>,
    },

    /// List the accessor names derived from an item's field labels
    Fields {
        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Exit 0 when signed in, 1 otherwise
    Whoami,

    /// Sign in and print a shell export line for the session token
    Signin,
}

/// Exactly one of --title, --id or --url
#[derive(Args, Debug)]
struct LookupArgs {
    /// Item title
    #[arg(long)]
    title: Option<String>,

    /// Item id
    #[arg(long)]
    id: Option<String>,

    /// Share link or private link
    #[arg(long)]
    url: Option<String>,

    /// Vault to search by title (overrides the configured vault)
    #[arg(long)]
    vault: Option<String>,
}

impl LookupArgs {
    fn criteria(&self) -> Criteria {
        Criteria {
            title: self.title.clone(),
            id: self.id.clone(),
            url: self.url.clone(),
            vault: self.vault.clone(),
            unknown: Vec::new(),
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("opwrap={}", level).parse()?)
                .add_directive(format!("opwrap_cli={}", level).parse()?),
        )
        .init();
    Ok(())
}

fn connect(cli: &Cli, vault: Option<&str>) -> Result<Client> {
    let flags = OpwrapConfig {
        account: cli.account.clone(),
        vault: vault.map(str::to_string),
        program: cli.program.clone(),
    };

    let settings = OpwrapConfig::load_or_default(cli.config.as_deref())?
        .with_env(|key| std::env::var(key).ok())
        .merge(flags)
        .into_settings()?;

    tracing::debug!(account = %settings.account, vault = %settings.vault, "Using settings");
    Client::new(settings).context("Failed to start 1Password CLI")
}

fn run_get(cli: &Cli, lookup: &LookupArgs, field: Option<&str>) -> Result<()> {
    let mut client = connect(cli, lookup.vault.as_deref())?;
    let item = client
        .get(&lookup.criteria())
        .context("Failed to fetch item")?;

    match field {
        Some(name) => {
            let value = item.property(name)?;
            println!("{}", value.to_text());
        }
        None => println!("{}", serde_json::to_string_pretty(&item)?),
    }
    Ok(())
}

fn run_fields(cli: &Cli, lookup: &LookupArgs) -> Result<()> {
    let mut client = connect(cli, lookup.vault.as_deref())?;
    let item = client
        .get(&lookup.criteria())
        .context("Failed to fetch item")?;

    for name in item.accessor_names() {
        println!("{}", name);
    }
    Ok(())
}

fn run_whoami(cli: &Cli) -> Result<bool> {
    let client = connect(cli, None)?;
    let signed_in = client.whoami();
    println!("{}", if signed_in { "signed in" } else { "not signed in" });
    Ok(signed_in)
}

fn run_signin(cli: &Cli) -> Result<()> {
    let mut client = connect(cli, None)?;
    client.signin()?;

    match client.token() {
        Some(token) => println!("export {}=\"{}\"", client.session_var(), token),
        None => tracing::info!("Signed in without a session token (app integration)"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Get { lookup, field } => run_get(&cli, lookup, field.as_deref()),
        Commands::Fields { lookup } => run_fields(&cli, lookup),
        Commands::Whoami => {
            if !run_whoami(&cli)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Signin => run_signin(&cli),
    }
}
