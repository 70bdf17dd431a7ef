//! Bundles commonly used items - meant for internal crate usage only.

pub(crate) use rusqlite::OptionalExtension;

pub(crate) use crate::params::RowExt;
pub(crate) use crate::{named_params, params, Transaction};
