use std::path::PathBuf;
use std::sync::Arc;

use chat_client::storage::FileStorage;
use chat_client::{ApiClient, AuthProvider, ClientConfig, ClientError, SessionStore, User, use_auth};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("not logged in; run `chat-cli login` first")]
    NotLoggedIn,
    #[error("missing password; pass --password or set CHAT_PASSWORD")]
    MissingPassword,
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("server response missing {0}")]
    MissingField(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "chat-cli", about = "Chat backend auth and messaging CLI")]
struct Cli {
    /// Server origin; overrides `CHAT_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Session file; overrides `CHAT_STORE_PATH`.
    #[arg(long)]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account (does not log in).
    Register {
        name: String,
        email: String,
        #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log in and persist the session.
    Login {
        email: String,
        #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the persisted session.
    Logout,
    /// Print the logged-in user.
    Whoami,
    /// Print whether a session is held.
    Status,
    /// Create a chat session and print its id.
    Session,
    /// Send one message to an existing session.
    Send {
        session_id: String,
        message: String,
    },
    /// Send each stdin line to a session and print the replies.
    Chat {
        #[arg(long, help = "Reuse this session instead of creating one")]
        session_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = ClientConfig::new(base_url)?.with_store_path(config.store_path);
    }
    if let Some(store_path) = cli.store_path {
        config = config.with_store_path(store_path);
    }
    let storage = Arc::new(FileStorage::new(config.store_path.clone()));
    let api = ApiClient::new(config, storage)?;
    let provider = AuthProvider::new(api);

    provider.scope(run(cli.command)).await
}

async fn run(command: Command) -> Result<(), CliError> {
    let auth = use_auth();
    match command {
        Command::Register { name, email, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            auth.register(&name, &email, &password).await?;
            println!("registered {email}; run `chat-cli login {email}` to sign in");
            Ok(())
        }
        Command::Login { email, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let user = auth.login(&email, &password).await?;
            print_json(&serde_json::to_value(&user)?)
        }
        Command::Logout => {
            auth.logout()?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = current_user(&auth)?;
            print_json(&serde_json::to_value(&user)?)
        }
        Command::Status => {
            let state = auth.state();
            print_json(&json!({
                "authenticated": state.is_authenticated(),
                "user": state.user,
            }))
        }
        Command::Session => {
            let user = current_user(&auth)?;
            let session = auth.api().chat().create_session(&user.id).await?;
            match session.session_id() {
                Some(id) => {
                    println!("{id}");
                    Ok(())
                }
                None => print_json(&session.body),
            }
        }
        Command::Send { session_id, message } => {
            let user = current_user(&auth)?;
            let reply = auth.api().chat().send_message(&session_id, &user.id, &message).await?;
            println!("{reply}");
            Ok(())
        }
        Command::Chat { session_id } => chat_loop(&auth, session_id).await,
    }
}

fn current_user(auth: &SessionStore) -> Result<User, CliError> {
    auth.user().ok_or(CliError::NotLoggedIn)
}

async fn chat_loop(auth: &SessionStore, session_id: Option<String>) -> Result<(), CliError> {
    let user = current_user(auth)?;
    let chat = auth.api().chat();
    let session_id = match session_id {
        Some(id) => id,
        None => {
            let session = chat.create_session(&user.id).await?;
            session.session_id().ok_or(CliError::MissingField("session id"))?
        }
    };
    eprintln!("session {session_id}; one message per line, EOF to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        let reply = chat.send_message(&session_id, &user.id, message).await?;
        println!("{reply}");
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
