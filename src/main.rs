//! aabforge CLI entry point.
//!
//! Not a general-purpose flag parser: `aabforge <bundle.aab> <output-dir>`.
//! Everything else (optimization era, timeouts, worker pool size) comes
//! from the persisted `PipelineConfig`.

use std::path::PathBuf;
use std::process::ExitCode;

use aabforge::orchestrate::{build_apk_set, BuildRequest};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to install tracing subscriber");

    let mut args = std::env::args().skip(1);
    let (bundle_path, output_dir) = match (args.next(), args.next()) {
        (Some(bundle), Some(output)) => (PathBuf::from(bundle), PathBuf::from(output)),
        _ => {
            eprintln!("usage: aabforge <bundle.aab> <output-dir>");
            return ExitCode::from(2);
        }
    };

    let request = BuildRequest { bundle_path, output_dir };
    match build_apk_set(request).await {
        Ok(written) => {
            info!(count = written.len(), "wrote APK set");
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(internal = %e, "build failed");
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
