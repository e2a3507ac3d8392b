use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the CRM gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gateway liveness
    Health,
    /// Upstream CRM probe through the gateway
    Status,
    /// Send a GraphQL document through POST /monday
    Query {
        /// Inline document, e.g. 'query { me { id name } }'
        #[arg(conflicts_with = "file")]
        query: Option<String>,

        /// Read the document from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
    },
    /// List blog posts, or fetch one by slug
    Posts {
        slug: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        page: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}/health")).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{base}/api/status")).send().await?;
            print_response(res).await?;
        }
        Commands::Query { query, file, variables } => {
            let document = match (query, file) {
                (Some(query), _) => query,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err("either a query or --file is required".into()),
            };
            let variables: Value = match variables {
                Some(raw) => serde_json::from_str(&raw)?,
                None => json!({}),
            };
            let res = client
                .post(format!("{base}/monday"))
                .json(&json!({ "query": document, "variables": variables }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Posts { slug, limit, page } => {
            let res = match slug {
                Some(slug) => client.get(format!("{base}/api/posts/{slug}")).send().await?,
                None => {
                    let mut params = Vec::new();
                    if let Some(limit) = limit {
                        params.push(("limit", limit));
                    }
                    if let Some(page) = page {
                        params.push(("page", page));
                    }
                    client.get(format!("{base}/api/posts")).query(&params).send().await?
                }
            };
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
