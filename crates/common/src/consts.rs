//! Repeated constants used around pipe

/// The release this binary upgrades installations to.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The only release an installation may be upgraded from by this binary.
pub const FROM_VERSION: &str = "1.8.4";

/// Setting categories.
pub mod category {
    pub const SYSTEM: &str = "system";
    pub const AD: &str = "ad";
}

/// Setting names.
pub mod name {
    /// The system version marker, stored under [category::SYSTEM](super::category::SYSTEM).
    pub const SYSTEM_VERSION: &str = "systemVersion";
    /// Google AdSense snippet embedded into articles, stored under
    /// [category::AD](super::category::AD).
    pub const AD_GOOGLE_ADSENSE_ARTICLE_EMBED: &str = "adGoogleAdSenseArticleEmbed";
}
