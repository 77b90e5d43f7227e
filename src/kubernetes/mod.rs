// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Hub client creation.

pub mod client;

pub use client::create_hub_client;
