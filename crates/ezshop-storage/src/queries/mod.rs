// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed statements against the conversation log and summary tables.

pub mod exchanges;
pub mod summaries;
