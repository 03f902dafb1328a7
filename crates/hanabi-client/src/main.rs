use clap::Parser;

mod client;

#[derive(Parser)]
#[command(name = "hanabi")]
#[command(about = "Join a Hanabi game server", long_about = None)]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let address = format!("{}:{}", cli.host, cli.port);
    println!("Connecting to {address}...");

    if let Err(e) = client::start_client(&address).await {
        eprintln!("Error: {e}");
    }
}
