use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser)]
#[command(name = "alarms-cli")]
#[command(about = "Command-line client for the alarm relay", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ALARMS_URL", default_value = "http://localhost:7001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the relay is up
    Ping,
    /// Send an alarm
    Send {
        #[arg(short, long)]
        service: String,
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        message: String,
        #[arg(short, long, env = "ALARMS_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/ping", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Send {
            service,
            category,
            message,
            token,
        } => {
            let res = client
                .post(format!("{}/alarms", cli.url))
                .json(&json!({
                    "service": service,
                    "category": category,
                    "message": message,
                    "token": token,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if text.is_empty() {
        println!("{}", status);
    } else {
        println!("{}", text);
    }
    Ok(())
}
