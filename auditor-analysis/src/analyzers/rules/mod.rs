//! Built-in analyzer rules.

pub mod dynamic_io;
pub mod endpoint_contract;
pub mod shell_exec;
pub mod sql_strings;
