//! Provider status report for the CLI and the gateway

use serde::{Deserialize, Serialize};

use crate::providers::FallbackRouter;

/// One row of the provider report. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// 1-based position in the fallback chain
    pub position: usize,
    pub identifier: String,
    pub model: String,
    pub available: bool,
}

pub fn provider_report(router: &FallbackRouter) -> Vec<ProviderStatus> {
    router
        .providers()
        .iter()
        .enumerate()
        .map(|(i, p)| ProviderStatus {
            position: i + 1,
            identifier: p.identifier().to_string(),
            model: p.model().to_string(),
            available: p.is_available(),
        })
        .collect()
}

/// Render the report as an aligned text table
pub fn format_report(report: &[ProviderStatus]) -> String {
    if report.is_empty() {
        return "No providers configured.".to_string();
    }

    let mut output = format!("{:<4}{:<10}{:<22}{}\n", "#", "PROVIDER", "MODEL", "STATUS");
    for row in report {
        let status = if row.available { "ready" } else { "no credential" };
        output.push_str(&format!(
            "{:<4}{:<10}{:<22}{}\n",
            row.position, row.identifier, row.model, status
        ));
    }
    output.trim_end().to_string()
}
