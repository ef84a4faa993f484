// SPDX-License-Identifier: MIT

pub mod common;
pub mod distill;
pub mod replay;
pub mod run;
