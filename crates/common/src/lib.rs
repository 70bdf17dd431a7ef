//! Contains core types and constants that are shared between the pipe crates
//! but have no real home of their own.
pub mod consts;
mod macros;
pub mod setting;

pub use setting::{NewSetting, Setting};

/// Identifies a blog hosted on the platform.
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlogId(u64);

macros::i64_backed_u64::new_get_partialeq!(BlogId);
macros::i64_backed_u64::serdes!(BlogId);
macros::fmt::thin_display!(BlogId);

impl BlogId {
    /// The blog created on first install. Platform wide settings are read
    /// from this blog.
    pub const DEFAULT: BlogId = BlogId::new_or_panic(1);
}

/// Row identifier of a stored [Setting].
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SettingId(u64);

macros::i64_backed_u64::new_get_partialeq!(SettingId);
macros::i64_backed_u64::serdes!(SettingId);
macros::fmt::thin_display!(SettingId);
