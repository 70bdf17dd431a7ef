use anyhow::Context;

/// Creates the settings and storage flag tables of a fresh database.
pub(crate) fn base_schema(tx: &rusqlite::Transaction<'_>) -> anyhow::Result<()> {
    tx.execute_batch(
        r"
        CREATE TABLE settings (
            id       INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            name     TEXT NOT NULL,
            value    TEXT NOT NULL DEFAULT '',
            blog_id  INTEGER NOT NULL
        );

        CREATE TABLE storage_flags (
            flag TEXT PRIMARY KEY
        );
        ",
    )
    .context("Creating base tables")?;

    Ok(())
}
