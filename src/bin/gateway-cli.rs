use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

use lingo_gateway::auth::verifier::{issue_token, UserClaims};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the lingo gateway", long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// API version token
    #[arg(short = 'v', long, default_value = "v1", env = "API_VERSION")]
    api_version: String,

    /// Bearer token sent with protected calls
    #[arg(short, long, env = "GATEWAY_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and store readiness
    Health,
    /// Show the caller's profile with experience
    Profile,
    /// Show the caller's experience record
    Experience,
    /// Add experience to the caller's record
    Gain,
    /// List all words
    Words,
    /// Show one word
    Word { id: String },
    /// Sign a development token for a user
    MintToken {
        user_id: String,
        #[arg(short, long, env = "SECRET_KEY")]
        secret: String,
        /// Expiry as a Unix timestamp
        #[arg(long)]
        exp: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    let api = format!("{}/api/{}", cli.url.trim_end_matches('/'), cli.api_version);
    let (method, url) = match cli.command {
        Commands::Health => (Method::GET, format!("{}/health", cli.url.trim_end_matches('/'))),
        Commands::Profile => (Method::GET, format!("{api}/user")),
        Commands::Experience => (Method::GET, format!("{api}/experience")),
        Commands::Gain => (Method::PATCH, format!("{api}/experience")),
        Commands::Words => (Method::GET, format!("{api}/words")),
        Commands::Word { id } => (Method::GET, format!("{api}/words/{id}")),
        Commands::MintToken {
            user_id,
            secret,
            exp,
        } => {
            let mut claims = UserClaims::new(user_id);
            if let Some(exp) = exp {
                claims = claims.expiring_at(exp);
            }
            println!("{}", issue_token(&claims, &secret)?);
            return Ok(());
        }
    };

    let res = client.request(method, url).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
