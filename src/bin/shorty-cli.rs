use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shorty::client::{App, EnrichedLink, Endpoints, View};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shorty-cli")]
#[command(about = "Create, list and delete short links", long_about = None)]
struct Cli {
    /// Origin short links are shared under
    #[arg(long, env = "SHORTY_ORIGIN", default_value = "http://localhost:8080")]
    origin: String,

    /// API base URL; empty means the same origin
    #[arg(long, env = "SHORTY_API_BASE", default_value = "")]
    api_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all links with their click counts
    List,
    /// Shorten a URL
    Create {
        /// Destination URL
        url: String,
        /// Use this slug instead of a generated one
        #[arg(long)]
        slug: Option<String>,
    },
    /// Delete a link by id
    Delete {
        /// Link id as shown by `list`
        id: i64,
    },
    /// Download the QR code of a slug as PNG
    Qr {
        slug: String,
        /// Output file, defaults to `<slug>.png`
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let endpoints = Endpoints::new(&cli.origin, &cli.api_base)
        .with_context(|| format!("invalid origin '{}'", cli.origin))?;

    let mut app = App::start(endpoints).await;

    match cli.command {
        Commands::List => {
            exit_on_error(&app);
            print_links(&app);
        }
        Commands::Create { url, slug } => {
            app.submit(&url, slug.as_deref()).await;
            exit_on_error(&app);
            if app.state().view() == View::Qr {
                if let Some(active) = app.state().active_link() {
                    println!("✓ Created {}", active.short_url);
                    println!("  -> {}", active.link.url);
                    println!("  QR code: {}", active.qr_code_url);
                }
            }
        }
        Commands::Delete { id } => {
            if !app.delete(id).await {
                exit_on_error(&app);
            }
            println!("✓ Deleted link {}", id);
            match app.state().error() {
                Some(error) => eprintln!("✗ {}", error),
                None => print_links(&app),
            }
        }
        Commands::Qr { slug, out } => {
            let qr_code_url = app.state().endpoints().qr_code_url(&slug);
            let png = app
                .api()
                .qr_png(&qr_code_url)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Failed to fetch QR code")))?;
            let out = out.unwrap_or_else(|| PathBuf::from(format!("{slug}.png")));
            tokio::fs::write(&out, png)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("✓ Wrote QR code for {} to {}", slug, out.display());
        }
    }

    Ok(())
}

fn exit_on_error(app: &App) {
    if let Some(error) = app.state().error() {
        eprintln!("✗ {}", error);
        std::process::exit(1);
    }
}

fn print_links(app: &App) {
    let links = app.state().links();
    if app.state().is_empty() {
        println!("No links yet. Create one with `shorty-cli create <url>`.");
        return;
    }

    println!("{:<8} {:<40} {:>8}  {}", "ID", "Short URL", "Clicks", "Destination");
    println!("{}", "-".repeat(100));
    for EnrichedLink {
        link, short_url, ..
    } in links
    {
        println!(
            "{:<8} {:<40} {:>8}  {}",
            link.id, short_url, link.clicks, link.url
        );
    }
}
