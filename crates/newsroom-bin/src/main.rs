//! Newsroom - command-line reader over the newsroom state layer.

mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use newsroom_config_and_utils::{init_logging, Config, Paths};

/// Newsroom command-line interface.
#[derive(Parser)]
#[command(name = "newsroom")]
#[command(about = "Read headlines, discuss them, and keep a reading feed")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and session files. Defaults to ~/.newsroom
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Two-letter country code
    #[arg(long)]
    country: Option<String>,

    /// News category (business, science, technology, ...)
    #[arg(long)]
    category: Option<String>,
}

#[derive(clap::Args)]
struct Credentials {
    /// Account email
    #[arg(long)]
    email: String,

    /// Account password
    #[arg(long, env = "NEWSROOM_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List top headlines
    Headlines {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show a saved headline with its comments
    Show {
        slug: String,
    },
    /// Save a headline from the current list so it can be discussed
    Save {
        slug: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Create an account and sign in
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Sign in
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the current session
    Status,
    /// Manage your reading feed
    Feed {
        #[command(subcommand)]
        command: FeedCommands,
    },
    /// Comment on a saved headline
    Comment {
        slug: String,
        body: String,
        /// Comment id. Reusing an id replaces that comment
        #[arg(long)]
        id: Option<String>,
    },
    /// Like a comment
    Like {
        slug: String,
        comment_id: String,
    },
}

#[derive(Subcommand)]
enum FeedCommands {
    /// List saved headlines
    List,
    /// Add a headline from the current list
    Add {
        slug: String,
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Remove a headline by title
    Remove {
        title: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));

    let app = app::App::build(config, &paths)?;

    match cli.command {
        Commands::Headlines { source } => {
            commands::headlines(&app, source.country, source.category).await?
        }
        Commands::Show { slug } => commands::show(&app, &slug).await?,
        Commands::Save { slug, source } => {
            commands::save(&app, &slug, source.country, source.category).await?
        }
        Commands::Register { credentials } => {
            commands::authenticate(
                &app,
                newsroom_state::AuthAction::Register,
                &credentials.email,
                &credentials.password,
            )
            .await?
        }
        Commands::Login { credentials } => {
            commands::authenticate(
                &app,
                newsroom_state::AuthAction::Login,
                &credentials.email,
                &credentials.password,
            )
            .await?
        }
        Commands::Logout => commands::logout(&app)?,
        Commands::Status => commands::status(&app)?,
        Commands::Feed { command } => match command {
            FeedCommands::List => commands::feed_list(&app).await?,
            FeedCommands::Add { slug, source } => {
                commands::feed_add(&app, &slug, source.country, source.category).await?
            }
            FeedCommands::Remove { title } => commands::feed_remove(&app, &title).await?,
        },
        Commands::Comment { slug, body, id } => commands::comment(&app, &slug, &body, id).await?,
        Commands::Like { slug, comment_id } => commands::like(&app, &slug, &comment_id).await?,
    }

    Ok(())
}
