// SPDX-License-Identifier: MIT

//! Carries a specific process exit code through an `anyhow::Error` chain.
//!
//! A fatal step failure (`success = false` in the execution summary) exits
//! `1`, matching spec.md §6's "exit code 0 on success and 1 on fatal step
//! failure"; every other error path (bad args, unreadable task file) also
//! exits `1` via anyhow's default, so this type only needs to exist for the
//! cases where a distinct, explicit code matters.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitError {}

impl ExitError {
    pub fn code(code: i32) -> anyhow::Error {
        anyhow::Error::new(ExitError { code })
    }
}
