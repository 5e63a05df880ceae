//! petfriends - issue single PetFriends API calls from the shell
//!
//! Prints `{"status": .., "body": ..}` for the call and exits non-zero when
//! the service answers with a non-2xx status.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use petfriends_api::{
    client::PetFriendsClient, config::Config, logging, models::AuthKey, ApiResponse, PetFilter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// PetFriends API command-line client
#[derive(Parser, Debug)]
#[command(name = "petfriends")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to PETFRIENDS_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch an auth key for the configured account
    Key,

    /// List pets
    List {
        /// "all" or "my_pets"
        #[arg(short, long, default_value = "all")]
        filter: PetFilter,
    },

    /// Create a pet (multipart with photo, or simple form without)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        animal_type: String,
        #[arg(long)]
        age: String,
        /// Photo to attach
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Update a pet's name, type and age
    Update {
        pet_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        animal_type: String,
        #[arg(long)]
        age: String,
    },

    /// Delete a pet
    Delete { pet_id: String },

    /// Attach a photo to an existing pet
    SetPhoto { pet_id: String, photo: PathBuf },
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config from {:?}", path))?
        }
        None => Config::from_env().context("reading PETFRIENDS_* environment variables")?,
    };

    if let Some(base_url) = &args.base_url {
        config.service.base_url = base_url.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn fetch_key(client: &PetFriendsClient, config: &Config) -> anyhow::Result<AuthKey> {
    let creds = config.credentials.valid();
    let response = client.get_api_key(&creds.email, &creds.password).await?;
    AuthKey::from_response(&response).ok_or_else(|| {
        anyhow!(
            "authentication failed with status {}: {}",
            response.status,
            response.body
        )
    })
}

async fn run(args: Args) -> anyhow::Result<ApiResponse> {
    let config = load_config(&args)?;
    logging::init_subscriber(&config.logging)?;
    info!(
        "petfriends v{} against {}",
        petfriends_api::VERSION,
        config.service.base_url
    );

    let client = PetFriendsClient::from_config(&config.service)?;

    let key = match args.command {
        Command::Key => None,
        _ => Some(fetch_key(&client, &config).await?),
    };

    let response = match (args.command, key) {
        (Command::Key, _) => {
            let creds = config.credentials.valid();
            client.get_api_key(&creds.email, &creds.password).await?
        }
        (Command::List { filter }, Some(key)) => client.get_list_of_pets(&key, filter).await?,
        (
            Command::Add {
                name,
                animal_type,
                age,
                photo: Some(photo),
            },
            Some(key),
        ) => client.add_new_pet(&key, &name, &animal_type, age, photo).await?,
        (
            Command::Add {
                name,
                animal_type,
                age,
                photo: None,
            },
            Some(key),
        ) => {
            client
                .add_new_pet_without_photo(&key, &name, &animal_type, age)
                .await?
        }
        (
            Command::Update {
                pet_id,
                name,
                animal_type,
                age,
            },
            Some(key),
        ) => {
            client
                .update_pet_info(&key, &pet_id, &name, &animal_type, age)
                .await?
        }
        (Command::Delete { pet_id }, Some(key)) => client.delete_pet(&key, &pet_id).await?,
        (Command::SetPhoto { pet_id, photo }, Some(key)) => {
            client.add_photo_of_pet(&key, &pet_id, photo).await?
        }
        (_, None) => return Err(anyhow!("no auth key available")),
    };
    Ok(response)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(response) => {
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("error: failed to render response: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
