use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lan_transfer_client::commands::{self, Session};
use lan_transfer_client::config::{self, Config};
use lan_transfer_client::models::Category;
use lan_transfer_client::security::InputValidator;

#[derive(Parser, Debug)]
#[command(name = "lan-transfer", version, about = "Share files and chat with a LAN transfer server")]
struct Cli {
    /// Server address: IP, IP:port, localhost[:port] or a full URL.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Display name for this run; overrides the saved one.
    #[arg(long, global = true)]
    name: Option<String>,

    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Server(ServerCommand),
    /// Inspect or edit the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ServerCommand {
    /// List stored files
    Files {
        #[arg(default_value = "all")]
        category: Category,
    },
    /// Show storage statistics
    Stats,
    /// Upload files one after another
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Download a stored file
    Download {
        category: Category,
        filename: String,
        /// Directory to save into
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Delete a stored file
    Delete {
        category: Category,
        filename: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Print the conversation
    Messages {
        /// Also write it as an HTML transcript
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Send one message
    Send {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Interactive chat
    Chat,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    SetServer { address: String },
    SetName { name: String },
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(path) => Ok(path),
        None => config::default_config_path(),
    };
    let loaded = config_path
        .as_ref()
        .map_err(|e| e.to_string())
        .and_then(|path| config::load_config_from(path).map_err(|e| e.to_string()));

    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    log::info!("Starting LAN Transfer client v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration, using defaults: {}", e);
            Config::default()
        }
    };

    if let Err(e) = run(cli, config_path.ok(), config).await {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config_path: Option<PathBuf>, mut config: Config) -> anyhow::Result<()> {
    let command = match cli.command {
        Command::Config { action } => {
            let path = config_path.context("Could not determine the config file location")?;
            return run_config(&action, &path, &config);
        }
        Command::Server(command) => command,
    };

    if let Some(server) = &cli.server {
        config.server_url = InputValidator::normalize_server_address(server)?;
    }
    if let Some(name) = &cli.name {
        InputValidator::validate_display_name(name)?;
        config.display_name = name.trim().to_string();
    }

    // A one-off --name must not be written back by /name persistence.
    let persist_path = if cli.name.is_none() { config_path } else { None };
    let session = Session::new(config, persist_path)
        .context("Failed to set up the server connection")?;

    match command {
        ServerCommand::Files { category } => commands::list_files(&session, category).await?,
        ServerCommand::Stats => commands::show_stats(&session).await?,
        ServerCommand::Upload { paths } => {
            let result = commands::upload_files(&session, &paths).await?;
            if result.success_count == 0 {
                anyhow::bail!("No files were uploaded");
            }
        }
        ServerCommand::Download {
            category,
            filename,
            out,
        } => {
            commands::download_file(&session, category, &filename, out).await?;
        }
        ServerCommand::Delete {
            category,
            filename,
            yes,
        } => {
            if !commands::delete_file(&session, category, &filename, yes).await? {
                anyhow::bail!("File was not deleted");
            }
        }
        ServerCommand::Messages { html } => {
            commands::show_messages(&session, html.as_deref()).await?
        }
        ServerCommand::Send { text } => {
            if !commands::send_message(&session, &text.join(" ")).await? {
                anyhow::bail!("Message was not sent");
            }
        }
        ServerCommand::Chat => commands::run_chat(&session).await?,
    }

    Ok(())
}

fn run_config(action: &ConfigAction, path: &std::path::Path, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => commands::show_config(path, config)?,
        ConfigAction::SetServer { address } => {
            let updated = commands::set_server(path, address)?;
            println!("Server set to {}", updated.server_url);
        }
        ConfigAction::SetName { name } => {
            let updated = commands::set_display_name(path, name)?;
            println!("Display name set to {}", updated.sender_name());
        }
        ConfigAction::Reset => {
            commands::reset_config(path)?;
            println!("Configuration reset to defaults");
        }
    }
    Ok(())
}
