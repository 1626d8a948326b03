// src/vars/mod.rs

//! Variable handling for tool invocations.
//!
//! - [`value`] defines the nested [`Value`] tree callers hand to the runner.
//! - [`format`] turns values into the tool's literal syntax and `-var` flags.
//! - [`file`] writes a variable map to a scoped `.tfvars` file.

pub mod file;
pub mod format;
pub mod value;

pub use file::{VarFile, render_tfvars};
pub use format::{format_var_args, quote, to_literal};
pub use value::Value;
