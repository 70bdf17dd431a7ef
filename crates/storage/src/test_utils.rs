//! Helpers for setting up databases in tests.
use pipe_common::{BlogId, NewSetting, Setting};

use crate::Storage;

/// Stores `settings` in a single transaction and returns them as persisted.
pub fn with_settings(storage: &Storage, settings: &[NewSetting]) -> Vec<Setting> {
    let mut connection = storage.connection().unwrap();
    let tx = connection.transaction().unwrap();

    let stored = settings
        .iter()
        .map(|setting| {
            let id = tx.insert_setting(setting).unwrap();
            setting.clone().with_id(id)
        })
        .collect();

    tx.commit().unwrap();
    stored
}

/// Marks the platform as installed.
pub fn initialized(storage: &Storage) {
    let mut connection = storage.connection().unwrap();
    let tx = connection.transaction().unwrap();
    tx.set_initialized().unwrap();
    tx.commit().unwrap();
}

/// All stored settings, in insertion order.
pub fn settings(storage: &Storage) -> Vec<Setting> {
    let mut connection = storage.connection().unwrap();
    let tx = connection.transaction().unwrap();
    tx.settings().unwrap()
}

/// Makes every subsequent insert of a setting owned by `blog_id` fail.
///
/// The failure aborts only the offending statement, the surrounding
/// transaction stays usable.
pub fn fail_inserts_for(storage: &Storage, blog_id: BlogId) {
    install_trigger(storage, "INSERT", blog_id);
}

/// Makes every subsequent update of a setting owned by `blog_id` fail.
pub fn fail_updates_for(storage: &Storage, blog_id: BlogId) {
    install_trigger(storage, "UPDATE", blog_id);
}

/// Makes every subsequent update of a setting also store a setting owned by
/// a negative blog id, which fails to load as a [BlogId].
///
/// Reads of the blog ids within the updating transaction fail from then on.
pub fn corrupt_blog_ids_after_update(storage: &Storage) {
    let mut connection = storage.connection().unwrap();
    let tx = connection.transaction().unwrap();
    tx.inner()
        .execute_batch(
            r"
            CREATE TRIGGER corrupt_blog_ids_after_update
            AFTER UPDATE ON settings
            BEGIN
                INSERT INTO settings (category, name, value, blog_id) VALUES ('test', 'corrupt', '', -5);
            END;
            ",
        )
        .unwrap();
    tx.commit().unwrap();
}

fn install_trigger(storage: &Storage, operation: &str, blog_id: BlogId) {
    let mut connection = storage.connection().unwrap();
    let tx = connection.transaction().unwrap();
    tx.inner()
        .execute_batch(&format!(
            r"
            CREATE TRIGGER fail_{operation}_blog_{blog_id}
            BEFORE {operation} ON settings
            WHEN NEW.blog_id = {blog_id}
            BEGIN
                SELECT RAISE(ABORT, 'simulated {operation} failure for blog {blog_id}');
            END;
            "
        ))
        .unwrap();
    tx.commit().unwrap();
}
