//! # QR Annotator
//!
//! Stamps a verification QR code onto finished certificates. Each certificate gets a
//! fresh id (`cert_<uuid>`); the code encodes `{base_url}?cert_id={id}` and is
//! pasted into the bottom-right corner, 10px in from both edges.
//!
//! The annotator only looks at encoded images. It knows nothing about fields,
//! datasets or recipients.

use crate::cancel::CancelFlag;
use crate::error::QrError;
use crate::render::encode_png;
use common::jobs::progress_percent;
use common::model::batch::IssuedCode;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Luma};
use log::{info, warn};
use qrcode::QrCode;
use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// What a directory pass produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QrBatchOutput {
    pub issued: Vec<IssuedCode>,
    /// One message per certificate that could not be annotated.
    pub errors: Vec<String>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct QrAnnotator {
    /// Side of the pasted symbol, in pixels.
    pub footprint: u32,
    /// Gap between the symbol and the right/bottom edges.
    pub inset: u32,
}

impl Default for QrAnnotator {
    fn default() -> Self {
        Self {
            footprint: 150,
            inset: 10,
        }
    }
}

pub fn validation_url(base_url: &str, certificate_id: &str) -> String {
    format!("{}?cert_id={}", base_url, certificate_id)
}

impl QrAnnotator {
    /// Returns the annotated certificate as PNG bytes, plus the id it now carries.
    pub fn annotate(&self, certificate: &[u8], base_url: &str) -> Result<(Vec<u8>, String), QrError> {
        let mut canvas = image::load_from_memory(certificate)
            .map_err(|e| QrError::Decode(e.to_string()))?
            .to_rgba8();

        let certificate_id = format!("cert_{}", Uuid::new_v4());
        let symbol = QrCode::new(validation_url(base_url, &certificate_id).as_bytes())
            .map_err(|e| QrError::Encode(e.to_string()))?
            .render::<Luma<u8>>()
            .build();
        let symbol = imageops::resize(&symbol, self.footprint, self.footprint, FilterType::Nearest);
        let symbol = DynamicImage::ImageLuma8(symbol).to_rgba8();

        let offset = self.footprint + self.inset;
        let x = canvas.width().saturating_sub(offset);
        let y = canvas.height().saturating_sub(offset);
        imageops::replace(&mut canvas, &symbol, x as i64, y as i64);

        Ok((encode_png(&canvas)?, certificate_id))
    }

    /// Annotates `filenames` from `src_dir` into `out_dir`, keeping their names.
    ///
    /// A certificate that fails is recorded and skipped. Only failing to create
    /// `out_dir` is fatal.
    pub fn annotate_directory<P: FnMut(u32)>(
        &self,
        src_dir: &Path,
        filenames: &[String],
        out_dir: &Path,
        base_url: &str,
        cancel: &CancelFlag,
        mut progress: P,
    ) -> Result<QrBatchOutput, QrError> {
        fs::create_dir_all(out_dir)?;
        let mut output = QrBatchOutput::default();
        let total = filenames.len();

        for (position, filename) in filenames.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("QR annotation cancelled after {} of {} certificates", position, total);
                output.cancelled = true;
                break;
            }

            match self.annotate_file(&src_dir.join(filename), &out_dir.join(filename), base_url) {
                Ok(certificate_id) => output.issued.push(IssuedCode {
                    filename: filename.clone(),
                    url: validation_url(base_url, &certificate_id),
                    certificate_id,
                }),
                Err(e) => {
                    warn!("Could not add a QR code to {}: {}", filename, e);
                    output.errors.push(format!("{}: {}", filename, e));
                }
            }
            progress(progress_percent(position + 1, total));
        }

        info!(
            "Issued {} QR codes, {} failures",
            output.issued.len(),
            output.errors.len()
        );
        Ok(output)
    }

    fn annotate_file(&self, src: &Path, dst: &Path, base_url: &str) -> Result<String, QrError> {
        let bytes = fs::read(src)?;
        let (annotated, certificate_id) = self.annotate(&bytes, base_url)?;
        fs::write(dst, annotated)?;
        Ok(certificate_id)
    }
}
