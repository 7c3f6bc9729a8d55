use std::collections::HashSet;
use std::path::Path;

use drain_core::{render_document, Broadcast, Converter, DocumentSettings};
use drain_logging::{drain_error, drain_info, drain_warn};

use crate::config::Configuration;
use crate::convert::Html2MdConverter;
use crate::fetch::{BroadcastSource, DripClient};
use crate::persist::{ensure_output_dir, write_document};
use crate::{BroadcastOutcome, ExportError, ExportSummary, SkipReason, WriteOutcome};

/// Load `_drain.yml` from `base_dir` and export every broadcast from Drip.
/// Returns before any network traffic if the configuration is unusable.
pub async fn run(base_dir: &Path) -> Result<ExportSummary, ExportError> {
    let config = Configuration::load(base_dir)?;
    drain_info!(
        "Loaded configuration from {:?}; exporting to {:?}",
        base_dir,
        config.output_dir()
    );
    let client = DripClient::from_config(&config);
    export_broadcasts(&config, &client, &Html2MdConverter).await
}

/// Fetch once, then render and write each broadcast in order. A broadcast
/// that fails to render or write is recorded and the run moves on.
pub async fn export_broadcasts(
    config: &Configuration,
    source: &dyn BroadcastSource,
    converter: &dyn Converter,
) -> Result<ExportSummary, ExportError> {
    let broadcasts = source.broadcasts(&config.status).await.map_err(|err| {
        drain_error!("Fetching broadcasts failed: {}", err);
        ExportError::ApiFailure(err)
    })?;
    drain_info!(
        "Fetched {} broadcasts with status {:?}",
        broadcasts.len(),
        config.status
    );

    let output_dir = config.output_dir();
    ensure_output_dir(&output_dir).map_err(ExportError::OutputDir)?;

    let mut run = ExportRun {
        output_dir: &output_dir,
        settings: config.document_settings(),
        overwrite: config.overwrite,
        converter,
        claimed: HashSet::new(),
    };
    let outcomes: Vec<_> = broadcasts.iter().map(|b| run.export_one(b)).collect();

    let summary = ExportSummary {
        output_dir,
        outcomes,
    };
    drain_info!(
        "Export finished: {} written, {} skipped, {} failed",
        summary.written(),
        summary.skipped(),
        summary.failed()
    );
    Ok(summary)
}

struct ExportRun<'a> {
    output_dir: &'a Path,
    settings: DocumentSettings,
    overwrite: bool,
    converter: &'a dyn Converter,
    /// Slugs whose file was written or kept in this run; a failed write claims nothing.
    claimed: HashSet<String>,
}

impl ExportRun<'_> {
    fn export_one(&mut self, broadcast: &Broadcast) -> BroadcastOutcome {
        let subject = broadcast.subject.clone();
        let doc = match render_document(broadcast, &self.settings, self.converter) {
            Ok(doc) => doc,
            Err(err) => {
                drain_error!("Rendering {:?} failed: {}", subject, err);
                return BroadcastOutcome::Failed {
                    subject,
                    message: err.to_string(),
                };
            }
        };

        if doc.slug.is_empty() {
            drain_warn!("Skipping {:?}: subject yields an empty filename", subject);
            return BroadcastOutcome::Skipped {
                subject,
                reason: SkipReason::EmptySlug,
            };
        }

        if self.claimed.contains(&doc.slug) {
            let path = self.output_dir.join(doc.filename());
            drain_warn!(
                "Skipping {:?}: {:?} belongs to an earlier broadcast in this run",
                subject,
                path
            );
            return BroadcastOutcome::Skipped {
                subject,
                reason: SkipReason::DuplicateSlug(path),
            };
        }

        match write_document(self.output_dir, &doc.slug, &doc.content, self.overwrite) {
            Ok(WriteOutcome::Written(path)) => {
                drain_info!("Wrote {:?}", path);
                self.claimed.insert(doc.slug);
                BroadcastOutcome::Written { subject, path }
            }
            Ok(WriteOutcome::Skipped(path)) => {
                drain_info!("Kept existing {:?}", path);
                self.claimed.insert(doc.slug);
                BroadcastOutcome::Skipped {
                    subject,
                    reason: SkipReason::Exists(path),
                }
            }
            Err(err) => {
                drain_error!("Writing {:?} failed: {}", subject, err);
                BroadcastOutcome::Failed {
                    subject,
                    message: err.to_string(),
                }
            }
        }
    }
}
