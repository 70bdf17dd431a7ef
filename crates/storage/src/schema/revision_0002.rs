use anyhow::Context;

/// Adds the indices used for looking up a single setting and for grouping
/// settings by blog.
pub(crate) fn migrate(tx: &rusqlite::Transaction<'_>) -> anyhow::Result<()> {
    tracing::info!("Creating settings indices");

    tx.execute(
        "CREATE INDEX settings_blog_id_idx ON settings(blog_id)",
        [],
    )
    .context("Creating settings_blog_id_idx")?;

    tx.execute(
        "CREATE INDEX settings_category_name_idx ON settings(category, name, blog_id)",
        [],
    )
    .context("Creating settings_category_name_idx")?;

    Ok(())
}
