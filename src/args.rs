use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "nightpass")]
#[command(about = "Nightclub ticketing server with Telegram login and signed QR check-in")]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// HTTP port override
    #[arg(long)]
    pub port: Option<u16>,

    /// Telegram bot token override
    #[arg(long)]
    pub bot_token: Option<String>,

    /// Apply database migrations and exit
    #[arg(long)]
    pub migrate_only: bool,
}
