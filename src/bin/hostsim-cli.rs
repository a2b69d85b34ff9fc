use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "hostsim-cli")]
#[command(about = "Management CLI for the hostsim control panel", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[arg(long, default_value = "/control-panel")]
    prefix: String,

    #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List hostname rules
    Rules,
    /// Add or replace a hostname rule
    AddRule {
        hostname: String,
        /// status or redirect
        #[arg(long, default_value = "status")]
        r#type: String,
        #[arg(long)]
        code: u16,
        #[arg(long)]
        target: Option<String>,
    },
    /// Delete a hostname rule
    DeleteRule { hostname: String },
    /// Download the access log
    Export {
        /// json or csv
        #[arg(long, default_value = "json")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Empty the live access log
    ClearLogs,
    /// Show access analytics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;
    let admin = format!("{}{}", cli.url.trim_end_matches('/'), cli.prefix);
    let api = format!("{}/api", admin);

    let cookie = login(&client, &admin, &cli.password).await?;

    match cli.command {
        Commands::Rules => {
            let res = client.get(format!("{}/rules", api)).header(COOKIE, cookie.clone()).send().await?;
            print_json(res).await?;
        }
        Commands::AddRule { hostname, r#type, code, target } => {
            let body = json!({ "hostname": hostname, "type": r#type, "code": code, "target": target });
            let res = client
                .post(format!("{}/rules", api))
                .header(COOKIE, cookie.clone())
                .json(&body)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::DeleteRule { hostname } => {
            let res = client
                .delete(format!("{}/rules/{}", api, hostname))
                .header(COOKIE, cookie.clone())
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Export { format, output } => {
            let res = client
                .get(format!("{}/logs/export", api))
                .query(&[("format", format.as_str())])
                .header(COOKIE, cookie.clone())
                .send()
                .await?;
            if !res.status().is_success() {
                return print_text(res).await;
            }
            let bytes = res.bytes().await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => println!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
        Commands::ClearLogs => {
            let res = client
                .delete(format!("{}/logs/clear", api))
                .header(COOKIE, cookie.clone())
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Stats => {
            let res = client.get(format!("{}/stats", api)).header(COOKIE, cookie.clone()).send().await?;
            print_json(res).await?;
        }
    }

    Ok(())
}

/// Log in and return the `Cookie` header value for the new session.
async fn login(
    client: &reqwest::Client,
    admin: &str,
    password: &str,
) -> Result<HeaderValue, Box<dyn std::error::Error>> {
    let res = client
        .post(format!("{}/login", admin))
        .form(&[("password", password)])
        .send()
        .await?;

    let session = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.split(';').next().filter(|c| c.starts_with("admin-session=")))
        .map(str::to_string);

    match session {
        Some(cookie) => Ok(HeaderValue::from_str(&cookie)?),
        None => Err("login failed: invalid password or unexpected response".into()),
    }
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if status.is_success() {
        println!("{}", text);
    } else {
        eprintln!("Error: Admin API returned status {}", status);
        eprintln!("Response: {}", text);
    }
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        return print_text(res).await;
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
