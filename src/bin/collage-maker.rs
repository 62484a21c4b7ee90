//! Collage maker CLI
//!
//! Command-line interface for building favorite-things collages from photos,
//! image search results and stickers.

#[cfg(feature = "cli")]
use collage_maker::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
