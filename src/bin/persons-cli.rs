use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use url::Url;

#[derive(Parser)]
#[command(name = "persons-cli")]
#[command(about = "Query a running persons API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Output format, requested through the URL suffix.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Send this Accept header and no suffix (list only).
    #[arg(long)]
    accept: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Xml,
    Csv,
}

impl Format {
    fn suffix(self) -> &'static str {
        match self {
            Format::Json => ".json",
            Format::Xml => ".xml",
            Format::Csv => ".csv",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List persons
    List,
    /// Show one person with enrichment fields
    Show { id: i64 },
    /// Search by address substring
    ByAddress { substring: String },
    /// Search by name substring
    ByName { substring: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let suffix = cli.format.suffix();

    let mut url = Url::parse(&cli.url)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| "base URL cannot have a path")?;
        segments.pop_if_empty();
        match &cli.command {
            Commands::List => match cli.accept {
                Some(_) => segments.push("persons"),
                None => segments.push(&format!("persons{}", suffix)),
            },
            Commands::Show { id } => segments.push("persons").push(&format!("{}{}", id, suffix)),
            Commands::ByAddress { substring } => segments
                .push("persons")
                .push("by-address")
                .push(&format!("{}{}", substring, suffix)),
            Commands::ByName { substring } => segments
                .push("persons")
                .push("by-name")
                .push(&format!("{}{}", substring, suffix)),
        };
    }

    let mut headers = HeaderMap::new();
    if let Some(accept) = &cli.accept {
        headers.insert(ACCEPT, HeaderValue::from_str(accept)?);
    }

    let res = client.get(url).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: persons API returned status {}", status);
        eprintln!("Response: {}", body);
        return Ok(());
    }

    if content_type.starts_with("application/json") {
        let json: serde_json::Value = serde_json::from_str(&body)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print!("{}", body);
    }
    Ok(())
}
