use std::path::PathBuf;

use anyhow::Context;
use gardenmap::{default_config_path, init_logging, run_demo, EditorConfig, BUILD_DATE, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("GardenMap {} (built {})", VERSION, BUILD_DATE);

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => EditorConfig::load_from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                EditorConfig::load_from_file(&path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?
            } else {
                tracing::info!("No config at {}, using defaults", path.display());
                EditorConfig::default()
            }
        }
    };

    let summary = run_demo(&config).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
