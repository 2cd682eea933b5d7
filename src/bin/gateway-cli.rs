use clap::{Parser, Subcommand};
use request_gateway::upstream::RequestSpec;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the request gateway", long_about = None)]
struct Cli {
    /// Gateway base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    gateway: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL through the gateway
    Get {
        url: String,
        /// Bypass the SOCKS5 proxy
        #[arg(long)]
        noproxy: bool,
        /// Print the raw upstream body
        #[arg(long)]
        stream: bool,
    },
    /// Send an arbitrary request through the gateway
    Custom {
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Header as "name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Cookie as "name=value" (repeatable)
        #[arg(short = 'b', long = "cookie")]
        cookies: Vec<String>,
        #[arg(short = 'd', long, default_value = "")]
        data: String,
        #[arg(long)]
        noproxy: bool,
        #[arg(long)]
        stream: bool,
    },
    /// Show the address the gateway egresses from
    Ip {
        #[arg(long)]
        noproxy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let (path, mut query, (flags, stream)) = match cli.command {
        Commands::Get { url, noproxy, stream } => {
            ("get", vec![("url".to_string(), url)], with_flags(noproxy, stream))
        }
        Commands::Custom {
            url,
            method,
            headers,
            cookies,
            data,
            noproxy,
            stream,
        } => {
            let mut spec = RequestSpec {
                url,
                method,
                body: data,
                ..RequestSpec::default()
            };
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| format!("header {:?} is not \"name: value\"", header))?;
                spec.headers.insert(name.trim().to_string(), value.trim().to_string());
            }
            for cookie in cookies {
                let (name, value) = cookie
                    .split_once('=')
                    .ok_or_else(|| format!("cookie {:?} is not \"name=value\"", cookie))?;
                spec.cookies.insert(name.to_string(), value.to_string());
            }
            let request = serde_json::to_string(&spec)?;
            ("custom", vec![("request".to_string(), request)], with_flags(noproxy, stream))
        }
        Commands::Ip { noproxy } => ("ip", Vec::new(), with_flags(noproxy, false)),
    };
    query.extend(flags);

    let res = client
        .get(format!("{}/{}", cli.gateway.trim_end_matches('/'), path))
        .query(&query)
        .send()
        .await?;

    if stream {
        print!("{}", res.text().await?);
        return Ok(());
    }
    print_response(res).await
}

fn with_flags(noproxy: bool, stream: bool) -> (Vec<(String, String)>, bool) {
    let mut flags = Vec::new();
    if noproxy {
        flags.push(("noproxy".to_string(), String::new()));
    }
    if stream {
        flags.push(("stream".to_string(), String::new()));
    }
    (flags, stream)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
