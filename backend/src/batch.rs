//! # Batch Pipeline
//!
//! Turns a whole dataset into certificates, one row at a time:
//!
//! 1. Blank rows are skipped without a trace; they are neither counted nor errors.
//! 2. Every other row is rendered and PNG-encoded. A failure is logged, recorded as
//!    a [`RowError`] and the loop moves on.
//! 3. The artifact gets a filename derived from the row's first column.
//! 4. If an email column is configured and the row holds a valid address, the
//!    artifact is registered for delivery.
//!
//! Progress is reported after every row through a callback; the cancel flag is
//! checked before every row. A cancelled run returns whatever was produced so far.

use crate::archive::{build_archive, Archive};
use crate::cancel::CancelFlag;
use crate::delivery::is_valid_email;
use crate::error::ArchiveError;
use crate::render::{encode_png, CertificateRenderer, Template};
use common::jobs::progress_percent;
use common::model::batch::{BatchSummary, RowError};
use common::model::delivery::DeliveryIndex;
use common::model::field::FieldElement;
use common::model::participant::{Dataset, ParticipantRecord};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

const FILENAME_SUFFIX: &str = "_certificate.png";

/// Everything one batch run reads. Nothing here is mutated.
#[derive(Debug, Clone, Copy)]
pub struct BatchInput<'a> {
    pub template: &'a Template,
    pub dataset: &'a Dataset,
    pub elements: &'a [FieldElement],
    pub email_column: Option<&'a str>,
}

/// One rendered certificate.
#[derive(Debug, Clone)]
pub struct CertificateArtifact {
    pub row_index: usize,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Artifacts in row order.
    pub artifacts: Vec<CertificateArtifact>,
    pub deliveries: DeliveryIndex,
    pub errors: Vec<RowError>,
    pub total_rows: usize,
    pub cancelled: bool,
}

impl BatchOutput {
    pub fn artifact(&self, filename: &str) -> Option<&CertificateArtifact> {
        self.artifacts.iter().find(|a| a.filename == filename)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.filename.clone()).collect()
    }

    /// Writes every artifact to `dir/<filename>`, creating `dir` if needed.
    pub fn persist(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        for artifact in &self.artifacts {
            fs::write(dir.join(&artifact.filename), &artifact.bytes)?;
        }
        Ok(())
    }

    pub fn archive(&self) -> Result<Archive, ArchiveError> {
        build_archive(
            self.artifacts
                .iter()
                .map(|a| (a.filename.as_str(), a.bytes.as_slice())),
        )
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total_rows: self.total_rows,
            certificates: self.artifacts.len(),
            filenames: self.filenames(),
            errors: self.errors.clone(),
            deliveries: self.deliveries.summary(),
            cancelled: self.cancelled,
        }
    }
}

/// Renders every non-blank row of `input.dataset`.
pub fn run_batch<R, P>(
    renderer: &R,
    input: &BatchInput<'_>,
    cancel: &CancelFlag,
    mut progress: P,
) -> BatchOutput
where
    R: CertificateRenderer + ?Sized,
    P: FnMut(u32),
{
    let total_rows = input.dataset.len();
    let mut output = BatchOutput {
        total_rows,
        ..BatchOutput::default()
    };
    let mut used_names = HashSet::new();

    for (row_index, record) in input.dataset.rows.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("Batch cancelled before row {}", row_index + 1);
            output.cancelled = true;
            break;
        }

        if !record.is_blank() {
            process_row(renderer, input, row_index, record, &mut used_names, &mut output);
        }

        progress(progress_percent(row_index + 1, total_rows));
    }

    info!(
        "Batch finished: {} certificates from {} rows, {} errors, {} recipients",
        output.artifacts.len(),
        total_rows,
        output.errors.len(),
        output.deliveries.len()
    );
    output
}

fn process_row<R>(
    renderer: &R,
    input: &BatchInput<'_>,
    row_index: usize,
    record: &ParticipantRecord,
    used_names: &mut HashSet<String>,
    output: &mut BatchOutput,
) where
    R: CertificateRenderer + ?Sized,
{
    let bytes = match renderer
        .render(input.template, record, input.elements)
        .and_then(|img| encode_png(&img))
    {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Row {} failed to render: {}", row_index + 1, e);
            output.errors.push(RowError {
                row_index,
                message: format!("Failed to generate certificate for row {}: {}", row_index + 1, e),
            });
            return;
        }
    };

    let filename = unique_filename(derive_filename(record, row_index), row_index, used_names);

    let recipient = input
        .email_column
        .map(|column| record.get(column).trim())
        .filter(|address| is_valid_email(address))
        .map(str::to_string);

    if let Some(address) = &recipient {
        if let Err(first_row) = output.deliveries.register(address, filename.clone(), row_index) {
            warn!(
                "Row {} repeats the address of row {}; it will not be emailed",
                row_index + 1,
                first_row + 1
            );
            output.errors.push(RowError {
                row_index,
                message: format!(
                    "Duplicate recipient {} (already used by row {}); certificate not queued for email",
                    address,
                    first_row + 1
                ),
            });
        }
    }

    output.artifacts.push(CertificateArtifact {
        row_index,
        filename,
        bytes,
        recipient,
    });
}

/// `<first column>_certificate.png` with whitespace and path-hostile characters
/// replaced by `_`, or `certificate_<row + 1>.png` when the first column is blank.
pub fn derive_filename(record: &ParticipantRecord, row_index: usize) -> String {
    let name = record.display_name().trim();
    if name.is_empty() {
        return format!("certificate_{}.png", row_index + 1);
    }

    let sanitized: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}{}", sanitized, FILENAME_SUFFIX)
}

fn unique_filename(candidate: String, row_index: usize, used: &mut HashSet<String>) -> String {
    let mut filename = candidate;
    while used.contains(&filename) {
        let stem = filename.trim_end_matches(".png");
        filename = format!("{}_{}.png", stem, row_index + 1);
    }
    used.insert(filename.clone());
    filename
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::render::fonts::Face;
    use crate::render::tests::white_template;
    use crate::render::Renderer;
    use common::model::delivery::DeliveryStatus;
    use common::model::field::{FieldLayout, Rgb};
    use image::RgbaImage;

    fn dataset(rows: &[&[Option<&str>]]) -> Dataset {
        let headers = vec!["Name".to_string(), "Email".to_string()];
        let rows = rows
            .iter()
            .map(|cells| {
                ParticipantRecord::from_cells(&headers, cells.iter().map(|c| c.map(str::to_string)))
            })
            .collect();
        Dataset::new(headers, rows)
    }

    fn name_layout() -> Vec<FieldElement> {
        let mut layout = FieldLayout::with_template_size(120, 80);
        layout.add_field("Name", 16, Rgb::BLACK);
        layout.elements().to_vec()
    }

    fn run(dataset: &Dataset, email_column: Option<&str>) -> BatchOutput {
        let template = white_template(120, 80);
        let elements = name_layout();
        let input = BatchInput {
            template: &template,
            dataset,
            elements: &elements,
            email_column,
        };
        run_batch(&Renderer::with_face(Face::Bitmap), &input, &CancelFlag::new(), |_| {})
    }

    /// Fails on one chosen row, delegates to the bitmap renderer otherwise.
    struct FailingOn(&'static str);

    impl CertificateRenderer for FailingOn {
        fn render(
            &self,
            template: &Template,
            record: &ParticipantRecord,
            elements: &[FieldElement],
        ) -> Result<RgbaImage, RenderError> {
            if record.display_name() == self.0 {
                return Err(RenderError::InvalidElement {
                    field: "Name".into(),
                    reason: "boom".into(),
                });
            }
            Renderer::with_face(Face::Bitmap).render(template, record, elements)
        }
    }

    #[test]
    fn blank_rows_are_skipped() {
        let data = dataset(&[
            &[Some("Ada"), None],
            &[None, None],
            &[Some("Grace"), Some("g@x.io")],
            &[Some("  "), Some("")],
            &[Some("Linus"), None],
        ]);
        let output = run(&data, None);

        assert_eq!(output.total_rows, 5);
        assert_eq!(output.artifacts.len(), 3);
        assert!(output.errors.is_empty());
        let rows: Vec<_> = output.artifacts.iter().map(|a| a.row_index).collect();
        assert_eq!(rows, vec![0, 2, 4]);
    }

    #[test]
    fn filenames_follow_the_first_column() {
        let data = dataset(&[
            &[Some("Jane Doe"), None],
            &[Some("a"), None],
            &[Some("b"), None],
            &[Some("c"), None],
            &[None, Some("nobody@x.io")],
        ]);
        let output = run(&data, None);

        assert_eq!(output.artifacts[0].filename, "Jane_Doe_certificate.png");
        assert_eq!(output.artifacts[4].filename, "certificate_5.png");
    }

    #[test]
    fn filenames_are_sanitized() {
        let record = ParticipantRecord::new(vec![("Name".into(), " Jane \t van/der  Doe ".into())]);
        assert_eq!(derive_filename(&record, 0), "Jane_van_der_Doe_certificate.png");
    }

    #[test]
    fn repeated_names_do_not_overwrite_each_other() {
        let data = dataset(&[&[Some("Sam"), None], &[Some("Sam"), None]]);
        let output = run(&data, None);
        assert_eq!(
            output.filenames(),
            vec!["Sam_certificate.png", "Sam_certificate_2.png"]
        );
    }

    #[test]
    fn only_valid_addresses_are_registered() {
        let data = dataset(&[
            &[Some("Ada"), Some("ada@example.com")],
            &[Some("Bob"), Some("not-an-email")],
            &[Some("Cy"), None],
        ]);
        let output = run(&data, Some("Email"));

        assert_eq!(output.artifacts.len(), 3);
        assert_eq!(output.deliveries.len(), 1);
        let record = output.deliveries.get("ada@example.com").unwrap();
        assert_eq!(record.filename, "Ada_certificate.png");
        assert_eq!(record.status, DeliveryStatus::NotSent);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn duplicate_addresses_are_reported() {
        let data = dataset(&[
            &[Some("Ada"), Some("same@example.com")],
            &[Some("Bea"), Some("SAME@example.com")],
        ]);
        let output = run(&data, Some("Email"));

        assert_eq!(output.artifacts.len(), 2);
        assert_eq!(output.deliveries.len(), 1);
        assert_eq!(output.deliveries.get("same@example.com").unwrap().row_index, 0);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].row_index, 1);
    }

    #[test]
    fn a_failing_row_does_not_stop_the_batch() {
        let data = dataset(&[
            &[Some("r1"), None],
            &[Some("r2"), None],
            &[Some("r3"), None],
            &[Some("r4"), None],
            &[Some("r5"), None],
        ]);
        let template = white_template(120, 80);
        let elements = name_layout();
        let input = BatchInput {
            template: &template,
            dataset: &data,
            elements: &elements,
            email_column: None,
        };
        let output = run_batch(&FailingOn("r3"), &input, &CancelFlag::new(), |_| {});

        assert_eq!(
            output.filenames(),
            vec![
                "r1_certificate.png",
                "r2_certificate.png",
                "r4_certificate.png",
                "r5_certificate.png"
            ]
        );
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].row_index, 2);
        assert!(output.errors[0].message.contains("row 3"));
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let data = dataset(&[
            &[Some("a"), None],
            &[None, None],
            &[Some("c"), None],
        ]);
        let template = white_template(120, 80);
        let elements = name_layout();
        let input = BatchInput {
            template: &template,
            dataset: &data,
            elements: &elements,
            email_column: None,
        };
        let mut seen = Vec::new();
        run_batch(
            &Renderer::with_face(Face::Bitmap),
            &input,
            &CancelFlag::new(),
            |p| seen.push(p),
        );
        assert_eq!(seen, vec![33, 66, 100]);
    }

    #[test]
    fn cancellation_keeps_partial_output() {
        let data = dataset(&[&[Some("a"), None], &[Some("b"), None], &[Some("c"), None]]);
        let template = white_template(120, 80);
        let elements = name_layout();
        let input = BatchInput {
            template: &template,
            dataset: &data,
            elements: &elements,
            email_column: None,
        };
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let output = run_batch(&Renderer::with_face(Face::Bitmap), &input, &cancel, |p| {
            if p >= 33 {
                flag.cancel();
            }
        });

        assert!(output.cancelled);
        assert_eq!(output.filenames(), vec!["a_certificate.png"]);
    }

    #[test]
    fn persist_and_archive_hold_every_artifact() {
        let data = dataset(&[&[Some("a"), None], &[Some("b"), None]]);
        let output = run(&data, None);

        let dir = tempfile::tempdir().unwrap();
        output.persist(&dir.path().join("certs")).unwrap();
        assert!(dir.path().join("certs/a_certificate.png").is_file());
        assert!(dir.path().join("certs/b_certificate.png").is_file());

        let archive = output.archive().unwrap();
        assert_eq!(archive.member_count, 2);

        let summary = output.summary();
        assert_eq!(summary.certificates, 2);
        assert_eq!(summary.total_rows, 2);
    }
}
