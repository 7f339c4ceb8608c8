use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Issue,
    Feedback,
}

/// Body expected by the report endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_type: ReportKind,
    pub issue: String,
    pub site_name: String,
    pub contact_info: String,
}

pub struct ReportClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ReportClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn submit(&self, report: &Report) -> Result<(), ReportError> {
        if report.issue.trim().is_empty() {
            return Err(ReportError::EmptyIssue);
        }

        let status = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await?
            .status();

        if status.is_success() {
            info!("Report for {:?} submitted", report.site_name);
            Ok(())
        } else {
            warn!("Report endpoint answered {}", status);
            Err(ReportError::Rejected(status))
        }
    }
}
