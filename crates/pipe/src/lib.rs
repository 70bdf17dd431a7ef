#![deny(rust_2018_idioms)]

pub mod init;
pub mod upgrade;
