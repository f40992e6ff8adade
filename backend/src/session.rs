//! # Sessions
//!
//! Every client works inside its own [`Session`]: the uploaded template and
//! dataset, the field layout, the sender credentials and the results of the last
//! batch, QR and delivery runs. Nothing is shared between sessions and nothing
//! outlives the process except the files under the session's work directory.
//!
//! ## Jobs
//!
//! A session runs at most one background job at a time. [`SessionsState::begin_job`]
//! refuses to start a second one while the previous job is still pending or in
//! progress, resets the session's cancel flag and hands the job the inputs it needs
//! as cheap `Arc` clones. Workers write their results back with
//! [`SessionsState::blocking_update`] from the blocking pool.

use crate::archive::Archive;
use crate::cancel::CancelFlag;
use crate::delivery::{is_valid_email, AttachmentSource, Credentials, MessageTemplate};
use crate::error::SessionError;
use crate::job_controller::state::JobsState;
use crate::qr::QrBatchOutput;
use crate::render::Template;
use common::model::batch::BatchSummary;
use common::model::delivery::{DeliveryIndex, DeliveryReport};
use common::model::field::FieldLayout;
use common::model::participant::Dataset;
use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const CERTIFICATES_DIR: &str = "certificates";
const QR_CERTIFICATES_DIR: &str = "certificates_with_qr";

/// Result of the last batch run.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub summary: BatchSummary,
    pub archive: Arc<Archive>,
}

/// Result of the last QR pass.
#[derive(Debug, Clone)]
pub struct QrRun {
    pub output: QrBatchOutput,
    pub archive: Arc<Archive>,
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub work_dir: PathBuf,
    pub template: Option<Arc<Template>>,
    pub dataset: Option<Arc<Dataset>>,
    /// md5 of the uploaded dataset file.
    pub dataset_fingerprint: Option<String>,
    pub layout: FieldLayout,
    pub email_column: Option<String>,
    pub credentials: Option<Credentials>,
    pub batch: Option<BatchRun>,
    pub deliveries: DeliveryIndex,
    pub qr: Option<QrRun>,
    /// Subject and body of the last send pass, reused by retries.
    pub last_message: Option<MessageTemplate>,
    pub last_report: Option<DeliveryReport>,
    pub cancel: CancelFlag,
    /// Human-readable log of everything that went wrong, oldest first.
    pub errors: Vec<String>,
    pub active_job: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, work_dir: PathBuf) -> Self {
        Self {
            id: id.into(),
            work_dir,
            template: None,
            dataset: None,
            dataset_fingerprint: None,
            layout: FieldLayout::new(),
            email_column: None,
            credentials: None,
            batch: None,
            deliveries: DeliveryIndex::new(),
            qr: None,
            last_message: None,
            last_report: None,
            cancel: CancelFlag::new(),
            errors: Vec::new(),
            active_job: None,
        }
    }

    pub fn certificates_dir(&self) -> PathBuf {
        self.work_dir.join(CERTIFICATES_DIR)
    }

    pub fn qr_dir(&self) -> PathBuf {
        self.work_dir.join(QR_CERTIFICATES_DIR)
    }

    /// Where delivery reads certificates from. After a QR pass the stamped copies
    /// are attached, falling back to the plain certificate for any file the pass
    /// could not annotate.
    pub fn attachment_source(&self) -> AttachmentSource {
        match self.qr {
            Some(_) => AttachmentSource::preferring(self.qr_dir(), self.certificates_dir()),
            None => AttachmentSource::new(self.certificates_dir()),
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("[session {}] {}", self.id, message);
        self.errors.push(message);
    }

    /// Replaces the template and resizes the layout to it.
    pub fn set_template(&mut self, template: Template) {
        self.layout
            .set_template_size(template.width(), template.height());
        self.template = Some(Arc::new(template));
    }

    /// Replaces the dataset. Returns `true` when the file is byte-identical to the
    /// one already loaded. A previously chosen email column is kept only if the new
    /// dataset still has it.
    pub fn set_dataset(&mut self, dataset: Dataset, fingerprint: String) -> bool {
        let unchanged = self.dataset_fingerprint.as_deref() == Some(fingerprint.as_str());
        if let Some(column) = &self.email_column {
            if !dataset.has_column(column) {
                info!("[session {}] email column '{}' dropped with the old dataset", self.id, column);
                self.email_column = None;
            }
        }
        self.dataset = Some(Arc::new(dataset));
        self.dataset_fingerprint = Some(fingerprint);
        unchanged
    }

    /// Chooses (or clears) the email column. Returns the 0-based indices of
    /// non-blank rows whose address is missing or malformed.
    pub fn set_email_column(&mut self, column: Option<String>) -> Result<Vec<usize>, SessionError> {
        let Some(column) = column.filter(|c| !c.trim().is_empty()) else {
            self.email_column = None;
            return Ok(Vec::new());
        };
        let dataset = self.require_dataset()?;
        if !dataset.has_column(&column) {
            return Err(SessionError::UnknownColumn(column));
        }

        let invalid: Vec<usize> = dataset
            .rows
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.is_blank() && !is_valid_email(record.get(&column)))
            .map(|(row, _)| row)
            .collect();
        if !invalid.is_empty() {
            self.record_error(format!(
                "{} rows have a missing or invalid address in column '{}'",
                invalid.len(),
                column
            ));
        }
        self.email_column = Some(column);
        Ok(invalid)
    }

    pub fn require_template(&self) -> Result<Arc<Template>, SessionError> {
        self.template.clone().ok_or(SessionError::MissingTemplate)
    }

    pub fn require_dataset(&self) -> Result<Arc<Dataset>, SessionError> {
        self.dataset.clone().ok_or(SessionError::MissingDataset)
    }

    pub fn require_credentials(&self) -> Result<Credentials, SessionError> {
        self.credentials
            .clone()
            .ok_or(SessionError::MissingCredentials)
    }

    pub fn require_batch(&self) -> Result<&BatchRun, SessionError> {
        self.batch.as_ref().ok_or(SessionError::NoBatch)
    }
}

/// All live sessions, shared as actix `web::Data`.
#[derive(Clone)]
pub struct SessionsState {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    root: PathBuf,
}

impl SessionsState {
    /// Sessions keep their files under `root/<session_id>`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn create(&self) -> Result<String, SessionError> {
        let id = Uuid::new_v4().to_string();
        let work_dir = self.root.join(&id);
        fs::create_dir_all(&work_dir)?;
        self.sessions
            .write()
            .await
            .insert(id.clone(), Session::new(id.clone(), work_dir));
        info!("Created session {}", id);
        Ok(id)
    }

    /// Drops the session, raises its cancel flag and deletes its work directory.
    pub async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        session.cancel.cancel();
        if session.work_dir.exists() {
            fs::remove_dir_all(&session.work_dir)?;
        }
        info!("Removed session {}", id);
        Ok(())
    }

    pub async fn read<R, F>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&Session) -> Result<R, SessionError>,
    {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        f(session)
    }

    pub async fn update<R, F>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<R, SessionError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        f(session)
    }

    /// Same as [`update`](Self::update) for code running on the blocking pool.
    pub fn blocking_update<R, F>(&self, id: &str, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<R, SessionError>,
    {
        let mut sessions = self.sessions.blocking_write();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        f(session)
    }

    /// Claims the session for a new job.
    ///
    /// `prepare` checks preconditions and collects the job's inputs; if it fails
    /// no job is registered. Returns the new job id, the session's (reset) cancel
    /// flag and whatever `prepare` produced.
    pub async fn begin_job<R, F>(
        &self,
        id: &str,
        jobs: &JobsState,
        prepare: F,
    ) -> Result<(String, CancelFlag, R), SessionError>
    where
        F: FnOnce(&mut Session) -> Result<R, SessionError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        if let Some(active) = &session.active_job {
            if jobs.is_running(active).await {
                return Err(SessionError::SessionBusy(active.clone()));
            }
        }

        let inputs = prepare(session)?;
        let job_id = jobs.register().await;
        session.active_job = Some(job_id.clone());
        session.cancel.reset();
        Ok((job_id, session.cancel.clone(), inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::white_template;
    use common::model::participant::ParticipantRecord;

    fn dataset(emails: &[&str]) -> Dataset {
        let headers = vec!["Name".to_string(), "Email".to_string()];
        let rows = emails
            .iter()
            .enumerate()
            .map(|(i, email)| {
                ParticipantRecord::new(vec![
                    ("Name".into(), format!("P{}", i)),
                    ("Email".into(), email.to_string()),
                ])
            })
            .collect();
        Dataset::new(headers, rows)
    }

    #[test]
    fn template_sets_layout_size() {
        let mut session = Session::new("s", PathBuf::from("/tmp/s"));
        session.set_template(white_template(640, 480));
        assert_eq!(session.layout.template_size(), Some((640, 480)));
        assert!(session.require_template().is_ok());
    }

    #[test]
    fn delivery_prefers_qr_stamped_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new("s", dir.path().to_path_buf());
        fs::create_dir_all(session.certificates_dir()).unwrap();
        fs::create_dir_all(session.qr_dir()).unwrap();
        fs::write(session.certificates_dir().join("a.png"), b"plain").unwrap();
        fs::write(session.certificates_dir().join("b.png"), b"plain").unwrap();
        fs::write(session.qr_dir().join("a.png"), b"stamped").unwrap();

        assert_eq!(
            session.attachment_source().locate("a.png"),
            session.certificates_dir().join("a.png")
        );

        session.qr = Some(QrRun {
            output: QrBatchOutput::default(),
            archive: Arc::new(Archive {
                bytes: Vec::new(),
                member_count: 0,
            }),
        });
        let source = session.attachment_source();
        assert_eq!(source.locate("a.png"), session.qr_dir().join("a.png"));
        assert_eq!(source.locate("b.png"), session.certificates_dir().join("b.png"));
    }

    #[test]
    fn email_column_reports_invalid_rows() {
        let mut session = Session::new("s", PathBuf::from("/tmp/s"));
        assert!(matches!(
            session.set_email_column(Some("Email".into())),
            Err(SessionError::MissingDataset)
        ));

        session.set_dataset(dataset(&["a@x.io", "nope", "b@x.io"]), "f1".into());
        assert!(matches!(
            session.set_email_column(Some("Mail".into())),
            Err(SessionError::UnknownColumn(_))
        ));

        let invalid = session.set_email_column(Some("Email".into())).unwrap();
        assert_eq!(invalid, vec![1]);
        assert_eq!(session.email_column.as_deref(), Some("Email"));
        assert_eq!(session.errors.len(), 1);

        session.set_email_column(None).unwrap();
        assert!(session.email_column.is_none());
    }

    #[test]
    fn reupload_is_detected_by_fingerprint() {
        let mut session = Session::new("s", PathBuf::from("/tmp/s"));
        assert!(!session.set_dataset(dataset(&["a@x.io"]), "f1".into()));
        assert!(session.set_dataset(dataset(&["a@x.io"]), "f1".into()));
        assert!(!session.set_dataset(dataset(&["a@x.io"]), "f2".into()));
    }

    #[test]
    fn email_column_is_dropped_when_missing_from_new_dataset() {
        let mut session = Session::new("s", PathBuf::from("/tmp/s"));
        session.set_dataset(dataset(&["a@x.io"]), "f1".into());
        session.set_email_column(Some("Email".into())).unwrap();

        let other = Dataset::new(
            vec!["Name".into()],
            vec![ParticipantRecord::new(vec![("Name".into(), "X".into())])],
        );
        session.set_dataset(other, "f2".into());
        assert!(session.email_column.is_none());
    }

    #[actix_web::test]
    async fn sessions_are_isolated_and_removable() {
        let root = tempfile::tempdir().unwrap();
        let state = SessionsState::new(root.path());

        let a = state.create().await.unwrap();
        let b = state.create().await.unwrap();
        assert_ne!(a, b);

        state
            .update(&a, |s| {
                s.record_error("only in a");
                Ok(())
            })
            .await
            .unwrap();
        let b_errors = state.read(&b, |s| Ok(s.errors.len())).await.unwrap();
        assert_eq!(b_errors, 0);

        assert!(root.path().join(&a).is_dir());
        state.remove(&a).await.unwrap();
        assert!(!root.path().join(&a).exists());
        assert!(matches!(
            state.read(&a, |_| Ok(())).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn one_job_at_a_time() {
        let root = tempfile::tempdir().unwrap();
        let state = SessionsState::new(root.path());
        let (jobs, _rx) = JobsState::new();
        let id = state.create().await.unwrap();

        let (first, cancel, ()) = state.begin_job(&id, &jobs, |_| Ok(())).await.unwrap();
        assert!(!cancel.is_cancelled());
        assert!(matches!(
            state.begin_job(&id, &jobs, |_| Ok(())).await,
            Err(SessionError::SessionBusy(active)) if active == first
        ));

        jobs.jobs
            .write()
            .await
            .insert(first, common::jobs::JobStatus::Completed("ok".into()));
        assert!(state.begin_job(&id, &jobs, |_| Ok(())).await.is_ok());
    }

    #[actix_web::test]
    async fn failed_preconditions_do_not_claim_the_session() {
        let root = tempfile::tempdir().unwrap();
        let state = SessionsState::new(root.path());
        let (jobs, _rx) = JobsState::new();
        let id = state.create().await.unwrap();

        let result = state
            .begin_job(&id, &jobs, |s| s.require_template().map(|_| ()))
            .await;
        assert!(matches!(result, Err(SessionError::MissingTemplate)));
        assert!(state.read(&id, |s| Ok(s.active_job.is_none())).await.unwrap());
    }
}
