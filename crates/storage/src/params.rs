use pipe_common::{BlogId, SettingId};
use rusqlite::RowIndex;

pub trait ToSql {
    fn to_sql(&self) -> rusqlite::types::ToSqlOutput<'_>;
}

impl<Inner: ToSql> ToSql for Option<Inner> {
    fn to_sql(&self) -> rusqlite::types::ToSqlOutput<'_> {
        use rusqlite::types::{ToSqlOutput, Value};

        match self {
            Some(value) => value.to_sql(),
            None => ToSqlOutput::Owned(Value::Null),
        }
    }
}

to_sql_int!(BlogId, SettingId);

// These conversions are infallible in rusqlite.
to_sql_builtin!(String, &str, i64);

/// Extends [rusqlite::Row] to provide getters for our own foreign types. This
/// is a work-around for the orphan rule -- our types live in a separate crate
/// and can therefore not implement the rusqlite traits.
pub trait RowExt {
    fn get_i64<I: RowIndex>(&self, index: I) -> rusqlite::Result<i64>;

    fn get_blog_id<I: RowIndex>(&self, index: I) -> rusqlite::Result<BlogId> {
        let num = self.get_i64(index)?;
        // Always safe since we are fetching an i64
        Ok(BlogId::new_or_panic(num as u64))
    }

    fn get_setting_id<I: RowIndex>(&self, index: I) -> rusqlite::Result<SettingId> {
        let num = self.get_i64(index)?;
        // Always safe since we are fetching an i64
        Ok(SettingId::new_or_panic(num as u64))
    }
}

impl RowExt for &rusqlite::Row<'_> {
    fn get_i64<I: RowIndex>(&self, index: I) -> rusqlite::Result<i64> {
        let num = self.get_ref(index)?.as_i64()?;
        if num < 0 {
            return Err(rusqlite::types::FromSqlError::OutOfRange(num).into());
        }
        Ok(num)
    }
}

/// Implements [ToSql] for the target integer newtype.
macro_rules! to_sql_int {
    ($target:ty) => {
        impl ToSql for $target {
            fn to_sql(&self) -> rusqlite::types::ToSqlOutput<'_> {
                use rusqlite::types::{ToSqlOutput, Value};
                ToSqlOutput::Owned(Value::Integer(self.get() as i64))
            }
        }
    };
    ($head:ty, $($rest:ty),+  $(,)?) => {
        to_sql_int!($head);
        to_sql_int!($($rest),+);
    }
}

macro_rules! to_sql_builtin {
    ($target:ty) => {
        impl ToSql for $target {
            fn to_sql(&self) -> rusqlite::types::ToSqlOutput<'_> {
                rusqlite::ToSql::to_sql(self).unwrap()
            }
        }
    };
    ($head:ty, $($rest:ty),+  $(,)?) => {
        to_sql_builtin!($head);
        to_sql_builtin!($($rest),+);
    }
}

use {to_sql_builtin, to_sql_int};

/// Used in combination with our own [ToSql] trait to provide functionality
/// equivalent to [rusqlite::params!] for our own foreign types.
#[macro_export]
macro_rules! params {
    [] => {
        rusqlite::params![]
    };
    [$($param:expr),+ $(,)?] => {
        rusqlite::params![$(&crate::params::ToSql::to_sql($param)),+]
    };
}

#[macro_export]
macro_rules! named_params {
    () => {
        rusqlite::named_params![]
    };
    // Note: It's a lot more work to support this as part of the same macro as
    // `params!`, unfortunately.
    ($($param_name:literal: $param_val:expr),+ $(,)?) => {
        rusqlite::named_params![$($param_name: crate::params::ToSql::to_sql($param_val)),+]
    };
}
