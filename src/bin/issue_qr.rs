//! Issues a signed ticket QR from the command line, for door-staff drills
//! and for checking a scanner against a known-good code.

use anyhow::Context;
use clap::Parser;
use nightpass::{Config, TicketQrService};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "issue_qr")]
#[command(about = "Issue a signed ticket QR code")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(long)]
    ticket_id: Uuid,

    #[arg(long)]
    user_id: Uuid,

    #[arg(long)]
    event_id: Uuid,

    /// Write a PNG here instead of printing a data URI
    #[arg(long)]
    out: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config).with_context(|| format!("loading {}", args.config))?;

    let issued = TicketQrService::issue(
        &args.ticket_id.to_string(),
        &args.user_id.to_string(),
        &args.event_id.to_string(),
        config.get_qr_secret(),
    )?;

    match args.out {
        Some(path) => {
            let png = TicketQrService::render_png(&issued.content)?;
            std::fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
            println!("{}", issued.content);
            eprintln!("✅ QR written to {}", path.display());
        }
        None => println!("{}", issued.data_uri),
    }

    Ok(())
}
