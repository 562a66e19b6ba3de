//! ログ初期化

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 既定のフィルタ（`RUST_LOG` があればそちらを優先）
fn default_filter(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "vehicle_archiver=trace,info"
    } else if verbose {
        "vehicle_archiver=debug,info"
    } else {
        "vehicle_archiver=info,warn"
    }
}

pub fn init_logger(verbose: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(debug)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
