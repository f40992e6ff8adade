use crate::cancel::CancelFlag;
use crate::delivery::service::validate_credentials;
use crate::delivery::{Credentials, DeliveryService, MailTransport, MessageTemplate};
use crate::error::DeliveryError;
use common::jobs::progress_percent;
use common::model::delivery::{DeliveryFailure, DeliveryIndex, DeliveryReport};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Where the certificate file of a record is looked up.
///
/// Directories are tried in order and the first one holding the file wins. When
/// none has it, the path in the first directory is used and the message goes out
/// without an attachment.
#[derive(Debug, Clone)]
pub struct AttachmentSource {
    dirs: Vec<PathBuf>,
}

impl AttachmentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dirs: vec![dir.into()],
        }
    }

    /// Looks in `preferred` first, then in `fallback`.
    pub fn preferring(preferred: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            dirs: vec![preferred.into(), fallback.into()],
        }
    }

    pub fn locate(&self, filename: &str) -> PathBuf {
        self.dirs
            .iter()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file())
            .or_else(|| self.dirs.first().map(|dir| dir.join(filename)))
            .unwrap_or_else(|| Path::new(filename).to_path_buf())
    }
}

/// Sends certificates to every recipient of a [`DeliveryIndex`], one at a time.
///
/// Runs on a blocking thread. The pause between attempts is a plain sleep.
pub struct DeliveryOrchestrator<T> {
    service: DeliveryService<T>,
    delay: Duration,
    cancel: CancelFlag,
}

impl<T: MailTransport> DeliveryOrchestrator<T> {
    pub fn new(service: DeliveryService<T>, delay: Duration, cancel: CancelFlag) -> Self {
        Self {
            service,
            delay,
            cancel,
        }
    }

    pub fn service(&self) -> &DeliveryService<T> {
        &self.service
    }

    /// Attempts every record that is not `Sent`, in index order.
    pub fn send_all<P: FnMut(u32)>(
        &self,
        credentials: &Credentials,
        index: &mut DeliveryIndex,
        message: &MessageTemplate,
        attachments: &AttachmentSource,
        progress: P,
    ) -> DeliveryReport {
        let targets = index.unsent_recipients();
        info!("Sending certificates to {} recipients", targets.len());
        self.run_pass(credentials, index, &targets, message, attachments, progress)
    }

    /// Attempts only the records currently marked `Failed`.
    pub fn retry_failed<P: FnMut(u32)>(
        &self,
        credentials: &Credentials,
        index: &mut DeliveryIndex,
        message: &MessageTemplate,
        attachments: &AttachmentSource,
        progress: P,
    ) -> DeliveryReport {
        let targets = index.failed_recipients();
        info!("Retrying {} failed recipients", targets.len());
        self.run_pass(credentials, index, &targets, message, attachments, progress)
    }

    fn run_pass<P: FnMut(u32)>(
        &self,
        credentials: &Credentials,
        index: &mut DeliveryIndex,
        targets: &[String],
        message: &MessageTemplate,
        attachments: &AttachmentSource,
        mut progress: P,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        // Bad credentials would fail every recipient the same way.
        if let Err(e) = validate_credentials(credentials) {
            error!("Delivery pass not started: {}", e);
            report.aborted = Some(e.to_string());
            return report;
        }

        let total = targets.len();
        for (position, recipient) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Delivery cancelled after {} of {} recipients", position, total);
                report.cancelled = true;
                break;
            }
            if position > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }

            let Some(record) = index.get_mut(recipient) else {
                continue;
            };
            let attachment = attachments.locate(&record.filename);
            report.attempted += 1;

            match self.service.send(
                credentials,
                &record.recipient,
                &message.subject,
                &message.body,
                Some(&attachment),
            ) {
                Ok(()) => {
                    record.mark_sent();
                    report.sent += 1;
                }
                Err(e) => {
                    warn!("Delivery to {} failed: {}", record.recipient, e);
                    let reason = e.to_string();
                    record.mark_failed(reason.clone());
                    report.failed += 1;
                    report.failures.push(DeliveryFailure {
                        recipient: record.recipient.clone(),
                        reason: reason.clone(),
                    });
                    if matches!(e, DeliveryError::Auth(_)) {
                        error!("Authentication rejected, stopping delivery pass");
                        report.aborted = Some(reason);
                        break;
                    }
                }
            }

            progress(progress_percent(position + 1, total));
        }

        if total == 0 {
            progress(100);
        }
        info!(
            "Delivery pass finished: {} attempted, {} sent, {} failed",
            report.attempted, report.sent, report.failed
        );
        report
    }
}
