// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! oj-storage: the durable artifact manifest and the project memory bank.

pub mod manifest;
pub mod memory_bank;

pub use manifest::{ArtifactRecord, Manifest, ManifestError};
pub use memory_bank::{distill_success_patterns, MemoryBank, MemoryBankError};
