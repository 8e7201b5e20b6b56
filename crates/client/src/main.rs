//! `keeper`: command-line client.
//!
//! Every invocation logs in, runs one command, and logs out again. Secrets
//! are encrypted and decrypted locally with the key stored under `--key-dir`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::SecretKind;
use tracing::warn;

use keeper_client::config::Config;
use keeper_client::payload::{BankCard, Binary, LoginPassword, Text};
use keeper_client::{telemetry, KeeperClient, KeyStore, NewSecret, SecretPayload};

#[derive(Parser)]
#[command(name = "keeper")]
#[command(about = "Client for the password keeper: secrets are encrypted before they leave this machine")]
#[command(version)]
#[command(after_help = "\
EXAMPLES:
    keeper --login alice --password pw register
    keeper --login alice --password pw create --name bank --meta \"main card\" card \\
        --number 4111111111111111 --expire-at 12/29 --first-name Alice --surname Liddell
    keeper --login alice --password pw list --type 4
    keeper --login alice --password pw get 1")]
struct Cli {
    /// Server base URL [env: ADDRESS]
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Directory holding private key files [env: KEY_PATH]
    #[arg(short, long, global = true)]
    key_dir: Option<String>,

    #[arg(short, long, global = true, env = "KEEPER_LOGIN")]
    login: Option<String>,

    #[arg(short, long, global = true, env = "KEEPER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and generate its key pair
    Register,

    /// List stored secrets
    List {
        /// Only secrets of this type (1 login/password, 2 text, 3 file, 4 card)
        #[arg(short = 't', long = "type", value_parser = parse_kind)]
        kind: Option<SecretKind>,
    },

    /// Show one secret, decrypted
    Get {
        id: i64,

        /// Write a file secret's content here instead of printing its size
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a secret
    Delete { id: i64 },

    /// Store a new secret
    Create {
        /// Unique secret name
        #[arg(short, long)]
        name: String,

        /// Free-form description, stored encrypted
        #[arg(short, long, default_value = "")]
        meta: String,

        #[command(subcommand)]
        payload: PayloadCommand,
    },

    /// Replace the content of an existing secret
    Update {
        id: i64,

        #[arg(short, long, default_value = "")]
        meta: String,

        #[command(subcommand)]
        payload: PayloadCommand,
    },
}

#[derive(Subcommand)]
enum PayloadCommand {
    /// A login and password pair
    Credentials {
        #[arg(long)]
        username: String,
        #[arg(long)]
        secret: String,
    },

    /// Free text
    Text {
        #[arg(long)]
        value: String,
    },

    /// The content of a local file
    File { path: PathBuf },

    /// Bank card details
    Card(CardArgs),
}

#[derive(Args)]
struct CardArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    expire_at: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    surname: String,
}

fn parse_kind(raw: &str) -> Result<SecretKind, String> {
    SecretKind::from_query(raw)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "type must not be empty".to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = Config::from_env()
        .map_err(|e| {
            eprintln!("ERROR: configuration invalid: {e:#}");
            e
        })?
        .with_overrides(cli.address.clone(), cli.key_dir.clone());
    telemetry::init(&cfg.log_level)?;

    let login = cli.login.context("--login is required")?;
    let password = cli.password.context("--password is required")?;

    let mut client = KeeperClient::new(&cfg.address, KeyStore::new(&cfg.key_path))?;

    let outcome = match cli.command {
        Commands::Register => {
            client
                .register(&login, &password)
                .await
                .context("registration failed")?;
            println!("Registered {login}; private key stored in {}", cfg.key_path);
            Ok(())
        }
        command => {
            client
                .login(&login, &password)
                .await
                .context("login failed")?;
            run(&client, command).await
        }
    };

    if let Err(e) = client.logout().await {
        warn!(error = %e, "logout failed");
    }
    outcome
}

async fn run(client: &KeeperClient, command: Commands) -> Result<()> {
    match command {
        Commands::Register => anyhow::bail!("register runs without a prior login"),
        Commands::List { kind } => {
            let secrets = client.list(kind).await?;
            if secrets.is_empty() {
                println!("No secrets found.");
            }
            for s in secrets {
                println!("| {:>4} | {:<20} | {:<16} |", s.id, s.name, s.kind.label());
            }
        }
        Commands::Get { id, output } => {
            let secret = client.get(id).await?;
            println!("ID:       {}", secret.id);
            println!("Name:     {}", secret.name);
            println!("Type:     {}", secret.kind);
            println!("Metadata: {}", secret.meta);
            print_payload(secret.payload, output).await?;
        }
        Commands::Delete { id } => {
            client.delete(id).await?;
            println!("Secret {id} deleted");
        }
        Commands::Create { name, meta, payload } => {
            let payload = build_payload(payload).await?;
            let id = client.create(NewSecret { name, payload, meta }).await?;
            println!("Secret created with ID: {id}");
        }
        Commands::Update { id, meta, payload } => {
            let payload = build_payload(payload).await?;
            let id = client.update(id, payload, &meta).await?;
            println!("Secret {id} updated");
        }
    }
    Ok(())
}

async fn build_payload(cmd: PayloadCommand) -> Result<SecretPayload> {
    Ok(match cmd {
        PayloadCommand::Credentials { username, secret } => SecretPayload::LoginPassword(LoginPassword {
            login: username,
            password: secret,
        }),
        PayloadCommand::Text { value } => SecretPayload::Text(Text { value }),
        PayloadCommand::File { path } => {
            let value = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            SecretPayload::Binary(Binary { name, value })
        }
        PayloadCommand::Card(card) => SecretPayload::BankCard(BankCard {
            number: card.number,
            expire_at: card.expire_at,
            name: card.first_name,
            surname: card.surname,
        }),
    })
}

async fn print_payload(payload: SecretPayload, output: Option<PathBuf>) -> Result<()> {
    match payload {
        SecretPayload::LoginPassword(lp) => {
            println!("Login:    {}", lp.login);
            println!("Password: {}", lp.password);
        }
        SecretPayload::Text(t) => println!("Text:     {}", t.value),
        SecretPayload::Binary(b) => {
            println!("File:     {} ({} bytes)", b.name, b.value.len());
            if let Some(path) = output {
                tokio::fs::write(&path, &b.value)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Written to {}", path.display());
            }
        }
        SecretPayload::BankCard(c) => {
            println!("Number:   {}", c.number);
            println!("Expires:  {}", c.expire_at);
            println!("Holder:   {} {}", c.name, c.surname);
        }
    }
    Ok(())
}
