use anyhow::{bail, Context, Result};
use cert_vault::models::{
    CertificationDetail, CertificationListResponse, InfoResponse, RenameRequest, Stats,
    UploadResponse,
};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Response};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "certs")]
#[command(about = "A CLI tool for managing certifications", long_about = None)]
struct Cli {
    #[arg(
        long,
        env = "CERT_VAULT_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the certification server"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Upload one or more image or PDF files")]
    Upload {
        #[arg(required = true, help = "Paths of the files to upload")]
        files: Vec<PathBuf>,
    },

    #[command(about = "List certifications")]
    List {
        #[arg(short, long, help = "Only names containing this text")]
        search: Option<String>,

        #[arg(short = 't', long = "type", help = "all, image, or pdf")]
        kind: Option<String>,
    },

    #[command(about = "Show collection stats")]
    Stats,

    #[command(about = "Show one certification")]
    Show {
        #[arg(help = "Certification ID")]
        id: String,
    },

    #[command(about = "Rename a certification")]
    Rename {
        #[arg(help = "Certification ID")]
        id: String,

        #[arg(help = "New display name")]
        name: String,
    },

    #[command(about = "Delete a certification")]
    Delete {
        #[arg(help = "Certification ID")]
        id: String,
    },

    #[command(about = "Download the original file")]
    Download {
        #[arg(help = "Certification ID")]
        id: String,

        #[arg(short, long, default_value = ".", help = "Directory to save into")]
        out: PathBuf,
    },

    #[command(about = "Delete every certification")]
    Clear,

    #[command(about = "Show supported formats and upload limit")]
    Info,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let api = Api {
        client: Client::new(),
        base_url: cli.api_url.trim_end_matches('/').to_string(),
    };

    let result = match cli.command {
        Commands::Upload { files } => upload(&api, files).await,
        Commands::List { search, kind } => list(&api, search, kind).await,
        Commands::Stats => stats(&api).await,
        Commands::Show { id } => show(&api, &id).await,
        Commands::Rename { id, name } => rename(&api, &id, name).await,
        Commands::Delete { id } => delete(&api, &id).await,
        Commands::Download { id, out } => download(&api, &id, &out).await,
        Commands::Clear => clear(&api).await,
        Commands::Info => info(&api).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

struct Api {
    client: Client,
    base_url: String,
}

impl Api {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        bail!("Failed to {}: {}", action, error_text);
    }
    Ok(response)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn upload(api: &Api, files: Vec<PathBuf>) -> Result<()> {
    let mut form = Form::new();

    for path in &files {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "certification".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(media_type_for(path))?;
        form = form.part("file", part);
    }

    let response = api
        .client
        .post(api.url("/certifications"))
        .multipart(form)
        .send()
        .await?;
    let result: UploadResponse = ensure_success(response, "upload certifications")
        .await?
        .json()
        .await?;

    println!("✅ {} certification(s) uploaded successfully.", result.submitted);
    for cert in result.certifications {
        println!("   {}  {} ({}, {})", short_id(&cert.id), cert.name, cert.kind, cert.size);
    }

    Ok(())
}

async fn list(api: &Api, search: Option<String>, kind: Option<String>) -> Result<()> {
    let mut params = Vec::new();
    if let Some(search) = search {
        params.push(("search", search));
    }
    if let Some(kind) = kind {
        params.push(("type", kind));
    }

    let response = api
        .client
        .get(api.url("/certifications"))
        .query(&params)
        .send()
        .await?;
    let result: CertificationListResponse = ensure_success(response, "fetch certifications")
        .await?
        .json()
        .await?;

    if result.certifications.is_empty() {
        println!("📭 No certifications found.");
        return Ok(());
    }

    println!("\n📋 Certifications ({})\n", result.certifications.len());

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new("Type"),
        Cell::new("Uploaded"),
        Cell::new("Size"),
    ]));

    for cert in result.certifications {
        table.add_row(Row::new(vec![
            Cell::new(short_id(&cert.id)),
            Cell::new(&cert.name),
            Cell::new(cert.kind.as_str()),
            Cell::new(&cert.upload_date),
            Cell::new(&cert.size),
        ]));
    }

    table.printstd();
    println!();

    Ok(())
}

async fn stats(api: &Api) -> Result<()> {
    let response = api.client.get(api.url("/certifications/stats")).send().await?;
    let stats: Stats = ensure_success(response, "fetch stats").await?.json().await?;

    println!(
        "📊 {} files • {} MB ({} images, {} PDFs)",
        stats.count, stats.total_size_mb, stats.image_count, stats.pdf_count
    );

    Ok(())
}

async fn show(api: &Api, id: &str) -> Result<()> {
    let response = api
        .client
        .get(api.url(&format!("/certifications/{}", id)))
        .send()
        .await?;
    let cert: CertificationDetail = ensure_success(response, "fetch certification")
        .await?
        .json()
        .await?;

    println!("📄 {}", cert.name);
    println!("   ID: {}", cert.id);
    println!("   Type: {}", cert.kind);
    println!("   Original file: {} ({})", cert.file_name, cert.media_type);
    println!("   Uploaded: {}", cert.upload_date);
    println!("   Size: {}", cert.size);
    match cert.preview {
        Some(preview) => println!("   Preview: {} characters of inline data", preview.len()),
        None => println!("   Preview: none"),
    }

    Ok(())
}

async fn rename(api: &Api, id: &str, name: String) -> Result<()> {
    let response = api
        .client
        .patch(api.url(&format!("/certifications/{}", id)))
        .json(&RenameRequest { name: name.clone() })
        .send()
        .await?;
    ensure_success(response, "rename certification").await?;

    println!("✅ Certification renamed to {}", name);
    Ok(())
}

async fn delete(api: &Api, id: &str) -> Result<()> {
    let response = api
        .client
        .delete(api.url(&format!("/certifications/{}", id)))
        .send()
        .await?;
    ensure_success(response, "delete certification").await?;

    println!("🗑️  Certification removed successfully.");
    Ok(())
}

async fn clear(api: &Api) -> Result<()> {
    let response = api.client.delete(api.url("/certifications")).send().await?;
    ensure_success(response, "clear certifications").await?;

    println!("🗑️  All certifications removed.");
    Ok(())
}

fn attachment_name(response: &Response) -> Option<String> {
    let disposition = response.headers().get(header::CONTENT_DISPOSITION)?.to_str().ok()?;
    let start = disposition.find("filename=\"")? + "filename=\"".len();
    let end = disposition[start..].find('"')? + start;
    Some(disposition[start..end].to_string())
}

async fn download(api: &Api, id: &str, out: &Path) -> Result<()> {
    let response = api
        .client
        .get(api.url(&format!("/certifications/{}/download", id)))
        .send()
        .await?;
    let response = ensure_success(response, "download certification").await?;

    let file_name = attachment_name(&response).unwrap_or_else(|| format!("{}.bin", id));
    let file_name = Path::new(&file_name)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| format!("{}.bin", id).into());
    let bytes = response.bytes().await?;

    let target = out.join(file_name);
    fs::write(&target, &bytes).with_context(|| format!("Failed to write {}", target.display()))?;

    println!("⬇️  Downloaded {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

async fn info(api: &Api) -> Result<()> {
    let response = api.client.get(api.url("/info")).send().await?;
    let info: InfoResponse = ensure_success(response, "fetch server info").await?.json().await?;

    println!(
        "📋 Supported formats: {} (Max {}MB per file)",
        info.supported_formats.join(", "),
        info.max_upload_mb
    );
    Ok(())
}
