use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "hitctl")]
#[command(about = "Management CLI for the hit counter", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List hit counts for every path
    Hits,
    /// Show the hit count for one path
    Get {
        /// Request path, e.g. /hello
        path: String,
    },
    /// GET the endpoint root, /hello, /test and the hits viewer; fail on any non-2xx
    Smoke {
        /// Public endpoint base URL
        endpoint: String,
        /// Caller identity sent as X-User
        #[arg(long, default_value = "smoke-test")]
        user: String,
        /// Hits viewer URL (default: the admin API's /admin/viewer)
        #[arg(long)]
        viewer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Hits => {
            let res = client.get(format!("{}/admin/hits", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Get { path } => {
            let path = path.trim_start_matches('/');
            let res = client.get(format!("{}/admin/hits/{}", base, path)).send().await?;
            print_response(res).await?;
        }
        Commands::Smoke { endpoint, user, viewer } => {
            let viewer = viewer.unwrap_or_else(|| format!("{}/admin/viewer", base));
            for line in smoke(&client, &endpoint, &user, &viewer).await? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// Post-deployment check. Returns one `status url` line per passing GET.
async fn smoke(
    client: &reqwest::Client,
    endpoint: &str,
    user: &str,
    viewer: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let endpoint = endpoint.trim_end_matches('/');
    let mut checks: Vec<(String, bool)> = ["/", "/hello", "/test"]
        .iter()
        .map(|path| (format!("{}{}", endpoint, path), true))
        .collect();
    checks.push((viewer.to_string(), false));

    let mut lines = Vec::with_capacity(checks.len());
    for (url, as_user) in checks {
        let mut req = client.get(&url);
        if as_user {
            req = req.header("x-user", user);
        }
        let status = req.send().await?.status();
        if !status.is_success() {
            return Err(format!("{} returned {}", url, status).into());
        }
        lines.push(format!("{} {}", status.as_u16(), url));
    }
    Ok(lines)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("admin API returned {}: {}", status, text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
