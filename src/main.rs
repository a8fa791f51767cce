use anyhow::{Context, Result};
use cert_vault::{api, CertificationStore, FileSlot, LogNotifier};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Certification vault HTTP server", long_about = None)]
struct Args {
    #[arg(long, env = "CERT_VAULT_ADDR", default_value = "0.0.0.0:3000", help = "Address to listen on")]
    addr: String,

    #[arg(
        long,
        env = "CERT_VAULT_DATA_FILE",
        default_value = "certifications.json",
        help = "File holding the stored certifications"
    )]
    data_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let slot = FileSlot::new(&args.data_file);
    let store = CertificationStore::open(slot, LogNotifier);
    tracing::info!(
        data_file = %args.data_file.display(),
        count = store.len().await,
        "Certification store ready"
    );

    let app = api::router(store);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    println!("🚀 Certification vault running on http://{}", args.addr);
    println!("📋 Endpoints:");
    println!("   POST   /certifications               - Upload files (multipart 'file' parts)");
    println!("   GET    /certifications               - List (?search=&type=all|image|pdf)");
    println!("   GET    /certifications/stats         - Collection stats");
    println!("   GET    /certifications/:id           - Details and preview");
    println!("   GET    /certifications/:id/download  - Download original file");
    println!("   PATCH  /certifications/:id           - Rename");
    println!("   DELETE /certifications/:id           - Delete");
    println!("   DELETE /certifications               - Delete everything");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
