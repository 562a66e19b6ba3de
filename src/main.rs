//! 车辆档案处理 - メインエントリポイント

use clap::Parser;
use std::process::ExitCode;
use vehicle_archiver::ocr::build_engine;
use vehicle_archiver::{console, logger, BatchProcessor, BatchSummary, Config};

/// Ctrl-C で中断したときの終了コード
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // 環境変数の読み込み（.env も clap の env に反映される）
    dotenvy::dotenv().ok();
    console::init_utf8_console();

    let config = Config::parse();
    logger::init_logger(config.verbose, config.debug);
    tracing::debug!("設定: {:?}", config);

    let missing = config.missing_inputs();
    if !missing.is_empty() {
        for path in missing {
            eprintln!("❌ ファイルが見つかりません: {}", path.display());
        }
        return ExitCode::FAILURE;
    }
    for path in config.unrecognized_inputs() {
        eprintln!("⚠️  未対応の形式の可能性があります（処理は試みます）: {}", path.display());
    }

    let engine = match build_engine(&config.engine_options()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("❌ OCRエンジンの初期化に失敗: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("OCRエンジン: {}", engine.name());

    let processor = BatchProcessor::new(engine, config.process_options());

    let summary = tokio::select! {
        summary = processor.run(&config.archives) => summary,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n中断しました");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    print_summary(&summary);

    if config.open {
        if let Err(e) = open::that(&config.output) {
            eprintln!("⚠️  出力フォルダを開けません: {}", e);
        }
    }

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "=".repeat(60));

    for (i, result) in summary.results.iter().enumerate() {
        let mark = if result.success { "✓" } else { "✗" };
        let vin = result.merged.vin.as_deref().unwrap_or("未识别");
        println!("{} {}. {} | VIN: {} | {} 件", mark, i + 1, result.name, vin, result.documents.len());
        if let Some(dir) = &result.organized_dir {
            println!("    → {}", dir.display());
        }
    }
    for (input, error) in &summary.failed_inputs {
        eprintln!("✗ {}: {}", input.display(), error);
    }

    println!("{}", "=".repeat(60));
    println!("完了: {} 件成功, {} 件失敗", summary.succeeded(), summary.failed());

    if let Some(path) = &summary.report_path {
        println!("📁 レポート: {}", path.display());
    }
    if let Some(error) = &summary.report_error {
        eprintln!("❌ レポート出力失敗: {}", error);
    }
}
