use std::path::PathBuf;

use std::io::BufRead;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use iocraft::prelude::*;

use bugdesk::api::{self, TrackerClient, bugs, reference, session};
use bugdesk::app::App;
use bugdesk::color::ColorDepth;
use bugdesk::config::loader;
use bugdesk::config::types::AppConfig;
use bugdesk::engine::{Engine, TrackerEngine};
use bugdesk::theme::{Background, ResolvedTheme};
use bugdesk::types::User;
use bugdesk::workflow::matcher::AssigneeMatcher;

#[derive(Parser)]
#[command(name = "bugdesk", version, about = "Bug tracker TUI")]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging to debug.log.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every bug as a table.
    List,
    /// Print the signed-in user.
    Whoami,
    /// Rank active users against a name, as the editor's assignee field does.
    Assignees {
        /// Partial name, at least three characters.
        query: String,
    },
    /// Print the priorities and statuses a bug can be given.
    Choices,
    /// Create an account. Reads the password twice from stdin.
    Register {
        email: String,
        first_name: String,
        last_name: String,
    },
    /// Change the signed-in user's name or email.
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Change the signed-in user's password. Reads it twice from stdin.
    Passwd,
}

fn main() -> Result<()> {
    // Install a panic hook that writes to a file, since the fullscreen TUI
    // swallows stderr.
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("{info}\n\n{backtrace}");
        let _ = std::fs::write("panic.log", &msg);
        eprintln!("{msg}");
    }));

    let cli = Cli::parse();

    // Set up tracing.
    if cli.debug {
        let file = std::fs::File::create("debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(file)
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
    }

    // Load config.
    let config = loader::load_config(cli.config.as_deref())?;

    // Handle subcommands that don't need the TUI.
    if let Some(command) = cli.command {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(run_command(command, &config));
    }

    // Detect terminal capabilities.
    let color_depth = ColorDepth::detect();
    let background = Background::detect();
    let theme = ResolvedTheme::resolve(&config.theme, background);

    // Start the tracker engine in a dedicated OS thread (owns its own Tokio
    // runtime). Dropping `engine_handle` at the end of `main` closes the
    // sender channel, signalling the engine to shut down.
    let engine_handle = TrackerEngine::new(config.clone())
        .context("invalid [server] configuration")?
        .start();

    tracing::info!("bugdesk starting against {}", config.server.base_url);

    // Enter fullscreen TUI (iocraft uses smol internally).
    smol::block_on(
        element! {
            App(
                config: &config,
                engine: &engine_handle,
                theme: &theme,
                color_depth,
            )
        }
        .fullscreen(),
    )?;

    Ok(())
}

// ---------------------------------------------------------------------------
// One-shot commands
// ---------------------------------------------------------------------------

async fn run_command(command: Commands, config: &AppConfig) -> Result<()> {
    let client = TrackerClient::new(&config.server, config.defaults.reference_cache_minutes)?;

    if let Commands::Register {
        email,
        first_name,
        last_name,
    } = command
    {
        let (password, confirmation) = read_password_twice()?;
        ensure!(
            !email.trim().is_empty() && !first_name.trim().is_empty() && !last_name.trim().is_empty(),
            "email, first name and last name are all required"
        );
        ensure!(
            !password.is_empty() && password == confirmation,
            "Passwords must match and cannot be empty."
        );
        let registration = session::Registration {
            email: email.trim().to_owned(),
            first_name: first_name.trim().to_owned(),
            last_name: last_name.trim().to_owned(),
            password,
        };
        session::register(&client, &registration).await?;
        println!("registered {}; sign in with BUGDESK_EMAIL and BUGDESK_PASSWORD", registration.email);
        return Ok(());
    }

    let credentials = api::resolve_credentials(&config.server)?;
    let user = session::establish(&client, &credentials)
        .await
        .with_context(|| format!("signing in to {}", client.base_url()))?;

    match command {
        Commands::Whoami => {
            println!("{}", describe_user(&user));
        }
        Commands::List => {
            let bugs = bugs::list_bugs(&client).await.context("listing bugs")?;
            println!(
                "{:>6}  {:<12}  {:<10}  {:<20}  TITLE",
                "#", "STATUS", "PRIORITY", "ASSIGNEE"
            );
            for bug in &bugs {
                println!(
                    "{:>6}  {:<12}  {:<10}  {:<20}  {}",
                    bug.id,
                    bug.status_label(),
                    bug.priority_label(),
                    bug.assignee_name(),
                    bug.title.lines().next().unwrap_or_default(),
                );
            }
        }
        Commands::Assignees { query } => {
            let matcher = AssigneeMatcher::new(reference::load_active_users(&client).await);
            let hits = matcher.search(&query);
            if hits.is_empty() {
                eprintln!("no active user matches \"{query}\"");
            }
            for hit in hits.iter().take(config.editor.max_suggestions) {
                println!("{:.2}  {}", hit.score, describe_user(hit.user));
            }
        }
        Commands::Choices => {
            println!("PRIORITIES");
            for priority in reference::load_active_priorities(&client).await {
                println!("{:>6}  {}", priority.id, priority.level);
            }
            println!("STATUSES");
            for status in reference::load_active_statuses(&client).await {
                println!("{:>6}  {}", status.id, status.label);
            }
        }
        Commands::Profile {
            email,
            first_name,
            last_name,
        } => {
            let mut update = session::ProfileUpdate::from_user(&user);
            if let Some(email) = email {
                update.email = email;
            }
            if let Some(first) = first_name {
                update.first_name = first;
            }
            if let Some(last) = last_name {
                update.last_name = last;
            }
            let updated = session::update_profile(&client, &update)
                .await
                .context("updating profile")?;
            println!("{}", describe_user(&updated));
        }
        Commands::Passwd => {
            let (password, confirmation) = read_password_twice()?;
            session::change_password(&client, &password, &confirmation).await?;
            println!("password updated");
        }
        // Handled before signing in.
        Commands::Register { .. } => {}
    }
    Ok(())
}

/// Read a password and its confirmation, one per line, from stdin.
fn read_password_twice() -> Result<(String, String)> {
    let mut lines = std::io::stdin().lock().lines();
    let mut next = |what: &str| -> Result<String> {
        eprintln!("{what}:");
        let line = lines.next().transpose()?.unwrap_or_default();
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    };
    let password = next("new password")?;
    let confirmation = next("confirm password")?;
    Ok((password, confirmation))
}

fn describe_user(user: &User) -> String {
    let role = user.role.as_ref().map_or("", |r| r.role.as_str());
    if role.is_empty() {
        format!("{} <{}>", user.full_name(), user.email)
    } else {
        format!("{} <{}> ({role})", user.full_name(), user.email)
    }
}
