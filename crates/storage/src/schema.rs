mod base;

mod revision_0002;

pub(crate) use base::base_schema;

type MigrationFn = fn(&rusqlite::Transaction<'_>) -> anyhow::Result<()>;

/// The full list of pipe migrations.
pub fn migrations() -> &'static [MigrationFn] {
    MIGRATIONS
}

/// The number of schema revisions replaced by the [base
/// schema](base::base_schema).
pub(crate) const BASE_SCHEMA_REVISION: usize = 1;

const MIGRATIONS: &[MigrationFn] = &[revision_0002::migrate];

// The target version is the number of revisions which have been replaced
// by the base schema + the new migrations built on top of that.
pub(crate) const LATEST_SCHEMA_REVISION: usize = BASE_SCHEMA_REVISION + MIGRATIONS.len();
