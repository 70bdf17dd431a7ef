//! Upgrades the persisted state of an installation by one release.
//!
//! Every installation records the release it was last run with in the system
//! version setting of the [default blog](BlogId::DEFAULT). On startup the
//! [Upgrade] compares that marker against the running release:
//!
//! - equal: nothing to do,
//! - exactly the previous release: the marker is advanced and new per blog
//!   settings are added in a single transaction,
//! - anything else: the installation skipped releases and must be upgraded
//!   release by release by the operator.

use anyhow::Context;
use pipe_common::consts::{self, category, name};
use pipe_common::{BlogId, NewSetting, Setting};
use pipe_storage::{Storage, StorageError, Transaction, TransactionBehavior};

#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    #[error("System version setting is missing, the database state is corrupt")]
    CorruptState,
    #[error(
        "Attempt to skip more than one version to upgrade. Expected: {expected}, actually: \
         {actual}"
    )]
    UnsupportedSkip { expected: String, actual: String },
    #[error("Upgrading from version {from} to version {to} failed")]
    MigrationWrite {
        from: String,
        to: String,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The platform has not been installed yet, there is nothing to upgrade.
    NotInitialized,
    /// The installation already runs the current release.
    UpToDate,
    Upgraded(UpgradeReport),
}

/// Summary of a completed upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub from: String,
    pub to: String,
    /// Number of system version settings advanced to `to`.
    pub markers_updated: usize,
    /// Number of blogs which received the new default settings.
    pub defaults_inserted: usize,
    /// Blogs for which storing the new default settings failed. These are not
    /// retried by later runs.
    pub defaults_failed: Vec<BlogId>,
}

/// Upgrades an installation of release [FROM_VERSION](consts::FROM_VERSION)
/// to the running release [VERSION](consts::VERSION).
#[derive(Clone)]
pub struct Upgrade {
    storage: Storage,
    from: String,
    to: String,
}

impl Upgrade {
    pub fn new(storage: Storage) -> Self {
        Self::with_versions(storage, consts::FROM_VERSION, consts::VERSION)
    }

    /// Upgrades from release `from` to release `to` instead of the releases
    /// known to this binary.
    pub fn with_versions(storage: Storage, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            storage,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Brings the installation up to date, if required.
    ///
    /// Nothing is written unless the outcome is [UpgradeOutcome::Upgraded].
    /// All errors leave the database as it was.
    pub fn perform(&self) -> Result<UpgradeOutcome, UpgradeError> {
        let mut connection = self.storage.connection().map_err(StorageError::from)?;
        // The write lock is held from the version check until commit.
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Create database transaction")
            .map_err(StorageError::from)?;

        if !tx.is_initialized().map_err(StorageError::from)? {
            tracing::debug!("Platform is not initialized, skipping upgrade");
            return Ok(UpgradeOutcome::NotInitialized);
        }

        let current = tx
            .setting(category::SYSTEM, name::SYSTEM_VERSION, BlogId::DEFAULT)
            .map_err(StorageError::from)?
            .ok_or_else(|| {
                tracing::error!(blog_id=%BlogId::DEFAULT, "System version setting is missing");
                UpgradeError::CorruptState
            })?
            .value;

        if current == self.to {
            tracing::debug!(version=%current, "No upgrade required");
            return Ok(UpgradeOutcome::UpToDate);
        }

        if current != self.from {
            tracing::error!(
                version=%current,
                expected=%self.from,
                "Installation is more than one release behind"
            );
            return Err(UpgradeError::UnsupportedSkip {
                expected: self.from.clone(),
                actual: current,
            });
        }

        self.migrate(tx).map(UpgradeOutcome::Upgraded)
    }

    fn migrate(&self, tx: Transaction<'_>) -> Result<UpgradeReport, UpgradeError> {
        tracing::info!(from=%self.from, to=%self.to, "Upgrading installation");

        let markers = tx
            .settings()
            .context("Loading settings")
            .map_err(StorageError::from)?
            .into_iter()
            .filter(Setting::is_system_version)
            .map(|mut setting| {
                setting.value.clone_from(&self.to);
                setting
            })
            .collect::<Vec<_>>();

        // Returning early drops `tx` which rolls back all marker updates.
        for marker in &markers {
            tx.update_setting(marker)
                .with_context(|| format!("Updating setting {marker:?}"))
                .map_err(|e| self.write_failed(e))?;
        }

        let blog_ids = tx
            .setting_blog_ids()
            .map_err(|e| self.write_failed(e))?;

        let mut defaults_inserted = 0;
        let mut defaults_failed = Vec::new();
        for blog_id in blog_ids {
            match tx.insert_setting(&NewSetting::google_adsense_article_embed(blog_id)) {
                Ok(_) => defaults_inserted += 1,
                Err(error) => {
                    tracing::error!(%blog_id, ?error, "Creating Google AdSense setting failed");
                    defaults_failed.push(blog_id);
                }
            }
        }

        tx.commit()
            .context("Committing upgrade")
            .map_err(|e| self.write_failed(e))?;

        tracing::info!(
            from=%self.from,
            to=%self.to,
            markers=%markers.len(),
            blogs=%defaults_inserted,
            "Upgraded installation successfully"
        );

        Ok(UpgradeReport {
            from: self.from.clone(),
            to: self.to.clone(),
            markers_updated: markers.len(),
            defaults_inserted,
            defaults_failed,
        })
    }

    fn write_failed(&self, error: anyhow::Error) -> UpgradeError {
        tracing::error!(from=%self.from, to=%self.to, ?error, "Upgrading installation failed");
        UpgradeError::MigrationWrite {
            from: self.from.clone(),
            to: self.to.clone(),
            source: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pipe_storage::{test_utils, StorageBuilder};
    use rstest::rstest;

    use super::*;

    const FROM: &str = "1.8.4";
    const TO: &str = "1.8.5";

    fn blog(id: u64) -> BlogId {
        BlogId::new_or_panic(id)
    }

    /// An initialized installation of `version` hosting `blogs`, each with a
    /// system version marker.
    fn installation(version: &str, blogs: &[u64]) -> Storage {
        let storage = StorageBuilder::in_memory().unwrap();
        let settings = blogs
            .iter()
            .map(|id| NewSetting::system_version(version, blog(*id)))
            .collect::<Vec<_>>();
        test_utils::with_settings(&storage, &settings);
        test_utils::initialized(&storage);
        storage
    }

    fn adsense_blogs(settings: &[Setting]) -> Vec<BlogId> {
        settings
            .iter()
            .filter(|s| {
                s.category == category::AD && s.name == name::AD_GOOGLE_ADSENSE_ARTICLE_EMBED
            })
            .map(|s| s.blog_id)
            .collect()
    }

    fn versions(settings: &[Setting]) -> Vec<&str> {
        settings
            .iter()
            .filter(|s| s.is_system_version())
            .map(|s| s.value.as_str())
            .collect()
    }

    #[test]
    fn constructor_targets_this_release() {
        let upgrade = Upgrade::new(StorageBuilder::in_memory().unwrap());
        assert_eq!(upgrade.from, consts::FROM_VERSION);
        assert_eq!(upgrade.to, consts::VERSION);
    }

    #[test_log::test]
    fn upgrades_every_blog() {
        let storage = installation(FROM, &[1, 2, 3]);

        let outcome = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap();

        assert_eq!(
            outcome,
            UpgradeOutcome::Upgraded(UpgradeReport {
                from: FROM.to_owned(),
                to: TO.to_owned(),
                markers_updated: 3,
                defaults_inserted: 3,
                defaults_failed: vec![],
            })
        );

        let settings = test_utils::settings(&storage);
        assert_eq!(versions(&settings), vec![TO; 3]);
        assert_eq!(adsense_blogs(&settings), vec![blog(1), blog(2), blog(3)]);
        assert!(settings
            .iter()
            .filter(|s| s.name == name::AD_GOOGLE_ADSENSE_ARTICLE_EMBED)
            .all(|s| s.value.is_empty()));
    }

    #[test]
    fn blogs_without_marker_receive_defaults() {
        let storage = installation(FROM, &[1]);
        test_utils::with_settings(
            &storage,
            &[
                NewSetting::new("basic", "blogTitle", "Second", blog(2)),
                NewSetting::new("basic", "blogSubtitle", "", blog(2)),
                NewSetting::new("basic", "blogTitle", "Third", blog(3)),
            ],
        );

        let outcome = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap();

        assert_matches!(outcome, UpgradeOutcome::Upgraded(report) => {
            assert_eq!(report.markers_updated, 1);
            assert_eq!(report.defaults_inserted, 3);
        });

        let settings = test_utils::settings(&storage);
        assert_eq!(adsense_blogs(&settings), vec![blog(1), blog(2), blog(3)]);
        // Unrelated settings are left alone.
        assert!(settings
            .iter()
            .any(|s| s.name == "blogTitle" && s.value == "Second"));
    }

    #[test]
    fn up_to_date_performs_no_writes() {
        let storage = installation(TO, &[1, 2]);
        let before = test_utils::settings(&storage);

        let upgrade = Upgrade::with_versions(storage.clone(), FROM, TO);
        assert_eq!(upgrade.perform().unwrap(), UpgradeOutcome::UpToDate);
        assert_eq!(upgrade.perform().unwrap(), UpgradeOutcome::UpToDate);

        assert_eq!(test_utils::settings(&storage), before);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let storage = installation(FROM, &[1, 2, 3]);
        let upgrade = Upgrade::with_versions(storage.clone(), FROM, TO);

        assert_matches!(upgrade.perform().unwrap(), UpgradeOutcome::Upgraded(_));
        let after_first = test_utils::settings(&storage);

        assert_eq!(upgrade.perform().unwrap(), UpgradeOutcome::UpToDate);
        assert_eq!(test_utils::settings(&storage), after_first);
    }

    #[rstest]
    #[case::older("1.8.3")]
    #[case::much_older("1.2.0")]
    #[case::newer("1.8.6")]
    #[case::empty("")]
    fn unsupported_skip_performs_no_writes(#[case] current: &str) {
        let storage = installation(current, &[1, 2]);
        let before = test_utils::settings(&storage);

        let error = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap_err();

        assert_matches!(error, UpgradeError::UnsupportedSkip { expected, actual } => {
            assert_eq!(expected, FROM);
            assert_eq!(actual, current);
        });
        assert_eq!(test_utils::settings(&storage), before);
    }

    #[test]
    fn unsupported_skip_message_names_both_versions() {
        let error = UpgradeError::UnsupportedSkip {
            expected: FROM.to_owned(),
            actual: "1.7.0".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "Attempt to skip more than one version to upgrade. Expected: 1.8.4, actually: 1.7.0"
        );
    }

    #[test]
    fn uninitialized_platform_is_skipped() {
        let storage = StorageBuilder::in_memory().unwrap();
        // Even a stale marker is ignored until the platform is installed.
        test_utils::with_settings(&storage, &[NewSetting::system_version("0.1.0", blog(1))]);
        let before = test_utils::settings(&storage);

        let outcome = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap();

        assert_eq!(outcome, UpgradeOutcome::NotInitialized);
        assert_eq!(test_utils::settings(&storage), before);
    }

    #[test_log::test]
    fn missing_marker_is_corrupt_state() {
        let storage = StorageBuilder::in_memory().unwrap();
        test_utils::initialized(&storage);

        let error = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap_err();

        assert_matches!(error, UpgradeError::CorruptState);
        assert!(test_utils::settings(&storage).is_empty());
    }

    #[test]
    fn marker_of_another_blog_is_not_used() {
        let storage = installation(FROM, &[2]);

        let error = Upgrade::with_versions(storage, FROM, TO)
            .perform()
            .unwrap_err();

        assert_matches!(error, UpgradeError::CorruptState);
    }

    #[test_log::test]
    fn failed_marker_update_rolls_back_everything() {
        let storage = installation(FROM, &[1, 2, 3]);
        // Blogs 1 and 2 are updated before blog 3 fails.
        test_utils::fail_updates_for(&storage, blog(3));
        let before = test_utils::settings(&storage);

        let error = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap_err();

        assert_matches!(error, UpgradeError::MigrationWrite { from, to, .. } => {
            assert_eq!(from, FROM);
            assert_eq!(to, TO);
        });
        let after = test_utils::settings(&storage);
        assert_eq!(after, before);
        assert_eq!(versions(&after), vec![FROM; 3]);
        assert!(adsense_blogs(&after).is_empty());
    }

    #[test_log::test]
    fn failed_blog_enumeration_rolls_back_everything() {
        let storage = installation(FROM, &[1, 2]);
        test_utils::corrupt_blog_ids_after_update(&storage);
        let before = test_utils::settings(&storage);

        let error = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap_err();

        assert_matches!(error, UpgradeError::MigrationWrite { .. });
        let after = test_utils::settings(&storage);
        assert_eq!(after, before);
        assert_eq!(versions(&after), vec![FROM; 2]);
        assert!(adsense_blogs(&after).is_empty());
    }

    #[test_log::test]
    fn failed_default_insert_is_best_effort() {
        let storage = installation(FROM, &[1, 2, 3]);
        test_utils::fail_inserts_for(&storage, blog(2));

        let outcome = Upgrade::with_versions(storage.clone(), FROM, TO)
            .perform()
            .unwrap();

        assert_matches!(outcome, UpgradeOutcome::Upgraded(report) => {
            assert_eq!(report.markers_updated, 3);
            assert_eq!(report.defaults_inserted, 2);
            assert_eq!(report.defaults_failed, vec![blog(2)]);
        });

        let settings = test_utils::settings(&storage);
        assert_eq!(versions(&settings), vec![TO; 3]);
        assert_eq!(adsense_blogs(&settings), vec![blog(1), blog(3)]);
    }

    #[test]
    fn failed_default_insert_is_not_retried() {
        let storage = installation(FROM, &[1, 2]);
        test_utils::fail_inserts_for(&storage, blog(2));
        let upgrade = Upgrade::with_versions(storage.clone(), FROM, TO);

        assert_matches!(upgrade.perform().unwrap(), UpgradeOutcome::Upgraded(_));
        assert_eq!(upgrade.perform().unwrap(), UpgradeOutcome::UpToDate);

        let settings = test_utils::settings(&storage);
        assert_eq!(adsense_blogs(&settings), vec![blog(1)]);
    }
}
