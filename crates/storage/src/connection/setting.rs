use anyhow::Context;
use pipe_common::{BlogId, NewSetting, Setting, SettingId};

use crate::prelude::*;

impl Transaction<'_> {
    /// Returns the setting with the given `category` and `name` of `blog_id`.
    ///
    /// Should multiple rows match, the oldest one is returned.
    pub fn setting(
        &self,
        category: &str,
        name: &str,
        blog_id: BlogId,
    ) -> anyhow::Result<Option<Setting>> {
        let mut stmt = self
            .inner()
            .prepare_cached(
                r"SELECT id, category, name, value, blog_id
                FROM settings
                WHERE category = :category AND name = :name AND blog_id = :blog_id
                ORDER BY id
                LIMIT 1",
            )
            .context("Preparing setting query")?;

        let setting = stmt
            .query_row(
                named_params! {
                    ":category": &category,
                    ":name": &name,
                    ":blog_id": &blog_id,
                },
                setting_from_row,
            )
            .optional()
            .context("Querying setting")?;

        Ok(setting)
    }

    /// All settings, in insertion order.
    pub fn settings(&self) -> anyhow::Result<Vec<Setting>> {
        let mut stmt = self
            .inner()
            .prepare_cached(
                "SELECT id, category, name, value, blog_id FROM settings ORDER BY id",
            )
            .context("Preparing settings query")?;

        let settings = stmt
            .query_map([], setting_from_row)
            .context("Querying settings")?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(settings)
    }

    pub fn insert_setting(&self, setting: &NewSetting) -> anyhow::Result<SettingId> {
        self.inner()
            .execute(
                "INSERT INTO settings (category, name, value, blog_id) VALUES (?, ?, ?, ?)",
                params![
                    &setting.category,
                    &setting.name,
                    &setting.value,
                    &setting.blog_id
                ],
            )
            .context("Inserting setting")?;

        let id = self.inner().last_insert_rowid();
        // Row ids are always positive for tables with an INTEGER PRIMARY KEY.
        SettingId::new(id as u64).context("Setting row id out of range")
    }

    /// Overwrites the stored row with the same [id](Setting::id).
    pub fn update_setting(&self, setting: &Setting) -> anyhow::Result<()> {
        let updated = self
            .inner()
            .execute(
                r"UPDATE settings
                SET category = ?, name = ?, value = ?, blog_id = ?
                WHERE id = ?",
                params![
                    &setting.category,
                    &setting.name,
                    &setting.value,
                    &setting.blog_id,
                    &setting.id
                ],
            )
            .context("Updating setting")?;

        anyhow::ensure!(updated == 1, "Setting {} does not exist", setting.id);

        Ok(())
    }

    /// Distinct blogs which own at least one setting, in ascending order.
    pub fn setting_blog_ids(&self) -> anyhow::Result<Vec<BlogId>> {
        let mut stmt = self
            .inner()
            .prepare_cached("SELECT blog_id FROM settings GROUP BY blog_id ORDER BY blog_id")
            .context("Preparing blog id query")?;

        let blog_ids = stmt
            .query_map([], |row| row.get_blog_id(0))
            .context("Querying blog ids")?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(blog_ids)
    }
}

fn setting_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Setting> {
    Ok(Setting {
        id: row.get_setting_id(0)?,
        category: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        blog_id: row.get_blog_id(4)?,
    })
}
