use anyhow::Context;
use pipe_common::{consts, BlogId, NewSetting};
use pipe_storage::Storage;

/// Installs the platform on a fresh database.
///
/// Stores the system version marker of the running release together with the
/// default blog's settings and marks the platform as initialized. Returns
/// `false` without touching anything if the platform was already installed.
pub fn initialize(storage: &Storage) -> anyhow::Result<bool> {
    let mut connection = storage.connection()?;
    let tx = connection
        .transaction()
        .context("Create database transaction")?;

    if tx.is_initialized()? {
        tracing::debug!("Platform is already initialized");
        return Ok(false);
    }

    let blog_id = BlogId::DEFAULT;
    tx.insert_setting(&NewSetting::system_version(consts::VERSION, blog_id))
        .context("Storing system version")?;
    tx.insert_setting(&NewSetting::google_adsense_article_embed(blog_id))
        .context("Storing Google AdSense setting")?;
    tx.set_initialized()?;
    tx.commit().context("Committing initialization")?;

    tracing::info!(version=%consts::VERSION, "Platform initialized");

    Ok(true)
}
