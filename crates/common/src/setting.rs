use serde::{Deserialize, Serialize};

use crate::{consts, BlogId, SettingId};

/// A persisted key/value setting scoped to a blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: SettingId,
    pub category: String,
    pub name: String,
    pub value: String,
    pub blog_id: BlogId,
}

impl Setting {
    pub fn is_system_version(&self) -> bool {
        self.name == consts::name::SYSTEM_VERSION
    }
}

/// A [Setting] which has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSetting {
    pub category: String,
    pub name: String,
    pub value: String,
    pub blog_id: BlogId,
}

impl NewSetting {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
        blog_id: BlogId,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            value: value.into(),
            blog_id,
        }
    }

    /// The system version marker of `blog_id`, set to `version`.
    pub fn system_version(version: impl Into<String>, blog_id: BlogId) -> Self {
        Self::new(
            consts::category::SYSTEM,
            consts::name::SYSTEM_VERSION,
            version,
            blog_id,
        )
    }

    /// The (empty) Google AdSense article embed setting of `blog_id`.
    pub fn google_adsense_article_embed(blog_id: BlogId) -> Self {
        Self::new(
            consts::category::AD,
            consts::name::AD_GOOGLE_ADSENSE_ARTICLE_EMBED,
            "",
            blog_id,
        )
    }

    pub fn with_id(self, id: SettingId) -> Setting {
        Setting {
            id,
            category: self.category,
            name: self.name,
            value: self.value,
            blog_id: self.blog_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_version_is_detected_by_name() {
        let marker = NewSetting::system_version("1.8.4", BlogId::DEFAULT)
            .with_id(SettingId::new_or_panic(1));
        assert!(marker.is_system_version());

        let embed = NewSetting::google_adsense_article_embed(BlogId::DEFAULT)
            .with_id(SettingId::new_or_panic(2));
        assert!(!embed.is_system_version());
    }

    #[test]
    fn adsense_embed_defaults_to_empty() {
        let setting = NewSetting::google_adsense_article_embed(BlogId::new_or_panic(7));
        assert_eq!(setting.category, "ad");
        assert_eq!(setting.name, "adGoogleAdSenseArticleEmbed");
        assert_eq!(setting.value, "");
        assert_eq!(setting.blog_id, 7u64);
    }
}
