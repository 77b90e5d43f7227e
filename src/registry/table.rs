// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::ClusterRecord;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Render the cluster listing as a fixed width table, one row per record in input order
pub fn render(records: &[ClusterRecord], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        ["NAME", "HUB ACCEPTED", "MANAGED CLUSTER URLS", "JOINED", "AVAILABLE", "AGE"],
    );

    for record in records {
        let age = record
            .age_days(now)
            .map(|days| format!("{}d", days))
            .unwrap_or_else(|| "N/A".to_string());
        push_row(
            &mut out,
            [
                record.name.as_str(),
                if record.hub_accepted { "true" } else { "false" },
                record.endpoint.as_deref().unwrap_or("N/A"),
                record.joined.as_str(),
                record.available.as_str(),
                age.as_str(),
            ],
        );
    }

    out
}

fn push_row(out: &mut String, [name, accepted, url, joined, available, age]: [&str; 6]) {
    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "{:<10} {:<14} {:<80} {:<8} {:<10} {}",
        name, accepted, url, joined, available, age
    );
}
