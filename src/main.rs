mod config;
mod error;
mod types;
mod transport;
mod mtop;
mod image_search;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Command};
use image_search::{ImageSearchEngine, print_reports};
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use types::ImageIdentifier;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let engine = ImageSearchEngine::new(
        cli.client_config(),
        cli.proxy_config(),
        cli.session.clone(),
    )
    .with_progress(!cli.verbose);

    match &cli.command {
        Command::Run { image, platform } => {
            run_search(&engine, image, image_search::platforms(*platform)).await?
        }
        Command::Search { image_id, platform } => {
            run_search_only(&engine, image_id, image_search::platforms(*platform)).await?
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    // 非 verbose 時 spinner 會佔用終端機，只輸出 warn 以上
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn run_search(
    engine: &ImageSearchEngine,
    image: &Path,
    platforms: Vec<image_search::Platform>,
) -> Result<()> {
    println!("=== 以圖搜圖 ===\n");
    println!("🖼️  圖片: {}", image.display());
    println!(
        "🛒 平台: {}\n",
        platforms.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );

    let reports = engine.run(image, &platforms).await?;
    print_reports(&reports);

    if reports.iter().any(|r| !r.is_success()) {
        println!("💡 上傳被拒絕通常代表 session 過期，請更新 --token 或 --cookie-file 後重試");
    }

    Ok(())
}

async fn run_search_only(
    engine: &ImageSearchEngine,
    image_id: &str,
    platforms: Vec<image_search::Platform>,
) -> Result<()> {
    let image_id = ImageIdentifier::new(image_id).context("圖片 ID 不可為空")?;

    println!("=== 以圖片 ID 搜尋 ===\n");

    let reports = engine.search_only(&image_id, &platforms).await?;
    print_reports(&reports);

    Ok(())
}
