use anyhow::Context;

use crate::prelude::*;

/// Set once the platform has been installed.
const INITIALIZED: &str = "initialized";

impl Transaction<'_> {
    pub fn is_initialized(&self) -> anyhow::Result<bool> {
        self.flag_is_set(INITIALIZED)
    }

    /// Marks the platform as installed. Setting the flag again is a no-op.
    pub fn set_initialized(&self) -> anyhow::Result<()> {
        self.set_flag(INITIALIZED)
    }

    fn flag_is_set(&self, flag: &str) -> anyhow::Result<bool> {
        self.inner()
            .query_row(
                "SELECT 1 FROM storage_flags WHERE flag = ?",
                params![&flag],
                |_| Ok(()),
            )
            .optional()
            .map(|x| x.is_some())
            .with_context(|| format!("Querying storage flag {flag}"))
    }

    fn set_flag(&self, flag: &str) -> anyhow::Result<()> {
        self.inner()
            .execute(
                "INSERT OR IGNORE INTO storage_flags (flag) VALUES (?)",
                params![&flag],
            )
            .with_context(|| format!("Setting storage flag {flag}"))?;

        Ok(())
    }
}
