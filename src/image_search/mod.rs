// 宣告子模組
pub mod types;
pub mod trait_def;
pub mod engine;
pub mod utils;
pub mod services;

// 重新導出常用項目
pub use types::{Platform, PlatformReport};
pub use engine::ImageSearchEngine;

use crate::config::PlatformChoice;

/// CLI 選項對應的平台清單
pub fn platforms(choice: PlatformChoice) -> Vec<Platform> {
    match choice {
        PlatformChoice::Ali1688 => vec![Platform::Ali1688],
        PlatformChoice::Taobao => vec![Platform::Taobao],
        PlatformChoice::All => Platform::all(),
    }
}

/// 顯示結果報告
pub fn print_reports(reports: &[PlatformReport]) {
    let succeeded = reports.iter().filter(|r| r.is_success()).count();

    println!("\n╔══════════════════════════════════╗");
    println!("║   📊 以圖搜圖結果               ║");
    println!("╠══════════════════════════════════╣");
    println!("║ 平台數:     {:>18} ║", reports.len());
    println!("║ 成功:       {:>18} ║", succeeded);
    println!("║ 失敗:       {:>18} ║", reports.len() - succeeded);
    println!("╚══════════════════════════════════╝\n");

    for report in reports {
        let marker = if report.is_success() { "✅" } else { "❌" };
        println!("{} [{}]", marker, report.platform);

        if let Some(strategy) = &report.strategy {
            println!("   session: {}", strategy);
        }
        if let Some(image_id) = &report.image_id {
            println!("   圖片 ID: {}", image_id);
        }
        if let Some(search) = &report.search {
            println!("   搜尋 URL: {}", search.url);
            println!("   HTTP 狀態: {} ({} bytes)", search.status, search.body.len());
        }
        if let Some(error) = &report.error {
            println!("   錯誤: {}", error);
            if report.image_id.is_some() && report.search.is_none() {
                println!("   💡 可用 `search <圖片 ID> --platform {}` 重試搜尋", report.platform);
            }
        }
        println!();
    }
}
