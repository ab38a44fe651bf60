use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Password};
use dotenvy::dotenv;
use propdesk_cli::commands;
use propdesk_cli::form::LoginForm;
use propdesk_config::{ApiConfig, SessionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "propdesk-cli")]
#[command(about = "PropDesk CLI - Session and API tools for PropDesk", long_about = None)]
struct Cli {
    /// Directory holding the persisted session (defaults to SESSION_STORAGE_DIR)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Keep the session after the CLI exits
        #[arg(short = 'r', long)]
        remember_me: Option<bool>,
    },
    /// Show who the stored session belongs to
    Whoami,
    /// End the stored session
    Logout,
    /// Send an authenticated request to the backend
    Request {
        /// HTTP method
        method: String,

        /// Endpoint relative to API_BASE_URL, e.g. /owners
        endpoint: String,

        /// JSON request body
        #[arg(short = 'd', long)]
        data: Option<String>,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'q', long = "param")]
        params: Vec<String>,

        /// Print the full response instead of its data member
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = SessionConfig::from_env();
    let storage_dir = cli
        .storage_dir
        .clone()
        .unwrap_or_else(|| config.storage_dir.clone());
    let session = commands::open_session(&storage_dir, ApiConfig::from_env(), config)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            remember_me,
        } => {
            let email = match email {
                Some(email) => email,
                None => Input::new().with_prompt("Email address").interact_text()?,
            };
            let password = match password {
                Some(password) => password,
                None => Password::new().with_prompt("Password").interact()?,
            };
            let remember_me = match remember_me {
                Some(remember_me) => remember_me,
                None => Confirm::new()
                    .with_prompt("Remember me?")
                    .default(true)
                    .interact()?,
            };

            let form = LoginForm {
                email,
                password,
                remember_me,
            };
            let user = commands::login(&session, &form).await?;
            println!("✅ Signed in as {}", user.display_name());
            if let Some(role) = session.auth.current_role() {
                println!("   Dashboard: {}", role.dashboard_path());
            }
        }
        Commands::Whoami => match commands::whoami(&session).await? {
            Some(me) => {
                println!("{}", me.user.display_name());
                match me.role {
                    Some((role, source)) => {
                        println!("   Role: {} ({:?})", role.display_name(), source)
                    }
                    None => println!("   Role: unknown"),
                }
            }
            None => println!("Not signed in"),
        },
        Commands::Logout => {
            commands::logout(&session).await;
            println!("Signed out");
        }
        Commands::Request {
            method,
            endpoint,
            data,
            params,
            raw,
        } => {
            let method = commands::parse_method(&method)?;
            let params = params
                .iter()
                .map(|p| commands::parse_param(p))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let body =
                commands::request(&session, method, &endpoint, data.as_deref(), params, raw)
                    .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
