//! Error type of the settings store.

use thiserror::Error;

/// A failure reading or writing the settings database.
///
/// Wraps the underlying `anyhow::Error` chain. Callers cannot recover from a
/// broken settings database, so there is no variant per cause.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct StorageError(#[from] anyhow::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_error_chain() {
        let error = StorageError::from(
            anyhow::anyhow!("no such table: settings").context("Querying settings"),
        );

        assert_eq!(error.to_string(), "Querying settings");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(error)),
            "Querying settings: no such table: settings"
        );
    }
}
