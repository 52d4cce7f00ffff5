use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::{json, Value};

use remote_client::codec::{Arguments, MethodMetadata};
use remote_client::config::{load_config, Environment};
use remote_client::lifecycle::Bootstrap;
use remote_client::observability::init_logging;

#[derive(Parser)]
#[command(name = "client-cli")]
#[command(about = "Inspect and call declared remote clients", long_about = None)]
struct Cli {
    /// Runtime manifest.
    #[arg(short, long, default_value = "client.toml")]
    config: PathBuf,

    /// Log filter, overrides the manifest's observability.log_level.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered clients
    Clients,
    /// Show the resolved configuration of a client
    Resolve {
        /// Contract name, alias or contextId
        client: String,
    },
    /// Perform a raw call through a client
    Call {
        /// Contract name, alias or contextId
        client: String,
        /// Path relative to the client's base URL
        path: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Query pair as key=value, repeatable
        #[arg(short, long)]
        query: Vec<String>,
        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.observability.log_level));

    // manifest properties override process variables
    let mut environment = Environment::from_process_env();
    environment.extend(config.environment.clone());

    let runtime = Bootstrap::new(config).with_environment(environment).lazy().start()?;
    for failure in &runtime.report().failures {
        eprintln!("rejected {}", failure);
    }

    match cli.command {
        Commands::Clients => {
            for declaration in runtime.registry().declarations() {
                let line = json!({
                    "contract": declaration.contract.name,
                    "context_id": declaration.context_id,
                    "service": declaration.service_name,
                    "url": declaration.url,
                    "path": declaration.path,
                    "alias": declaration.alias,
                    "decode404": declaration.decode404,
                });
                println!("{}", line);
            }
        }
        Commands::Resolve { client } => {
            let target = runtime.get_target(&client)?;
            let config = target.config();
            let resolved = json!({
                "contract": target.contract().name,
                "context_id": config.context_id,
                "url": target.url(),
                "load_balanced": target.transport().is_load_balancing(),
                "logger_level": config.logger_level,
                "connect_timeout_ms": config.options.connect_timeout.as_millis() as u64,
                "read_timeout_ms": config.options.read_timeout.as_millis() as u64,
                "interceptors": config.interceptor_names(),
                "decode404": config.decode404,
                "fallback": target.has_fallback(),
            });
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
        Commands::Call {
            client,
            path,
            method,
            query,
            body,
        } => {
            let target = runtime.get_target(&client)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let metadata = MethodMetadata::new("call", method, path);

            let mut args = Arguments::new();
            for pair in query {
                let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
                args = args.query(key, value);
            }
            if let Some(body) = body {
                args = args.body(serde_json::from_str::<Value>(&body)?);
            }

            let value = target.invoke(&metadata, &args).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    runtime.shutdown();
    Ok(())
}
