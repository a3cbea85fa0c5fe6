use crate::config::AppConfig;
use crate::services::media_storage::LocalMediaStorage;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub async fn setup_media_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalMediaStorage>> {
    let uploads = config.uploads_path();
    let recovery = config.recovery_path();

    info!(
        "🗂️  Media storage: {} (recovery: {})",
        uploads.display(),
        recovery.display()
    );

    let storage = LocalMediaStorage::new(uploads, recovery);
    storage
        .ensure_directories()
        .await
        .context("failed to create media directories")?;

    Ok(Arc::new(storage))
}
