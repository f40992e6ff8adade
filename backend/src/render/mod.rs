//! # Renderer
//!
//! Composites one certificate: a copy of the template with every field element
//! drawn on top in list order. No I/O happens here; callers encode the result with
//! [`encode_png`] and decide where the bytes go.
//!
//! Element positions are resolved against the template being drawn on, never
//! taken from the element's cached pixel position, so a stale layout cannot
//! misplace text. A coordinate that lands exactly on the right or bottom edge is
//! clamped onto the last pixel; a percentage outside `[0, 100]` is an error.

pub mod fonts;
mod personalize;

pub use personalize::{Personalization, PHOTO_SIZE};

use crate::error::RenderError;
use common::model::field::{FieldElement, Rgb};
use common::model::participant::ParticipantRecord;
use fonts::{Face, FontChain};
use image::{Rgba, RgbaImage};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};

/// A decoded certificate background. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Template {
    image: RgbaImage,
}

impl Template {
    /// Decodes a PNG or JPEG image.
    pub fn decode(bytes: &[u8]) -> Result<Self, RenderError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| RenderError::TemplateDecode(e.to_string()))?;
        Ok(Self::from_image(image.to_rgba8()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Anything able to turn one participant row into a certificate image.
///
/// The batch pipeline is written against this trait so a row-level failure can be
/// handled the same way whatever produced it.
pub trait CertificateRenderer {
    fn render(
        &self,
        template: &Template,
        record: &ParticipantRecord,
        elements: &[FieldElement],
    ) -> Result<RgbaImage, RenderError>;
}

/// Draws field text with one resolved [`Face`].
#[derive(Debug, Clone)]
pub struct Renderer {
    face: Face,
}

impl Renderer {
    /// Resolves the font chain once; every later render reuses the winning face.
    pub fn new(fonts: &FontChain) -> Self {
        Self {
            face: fonts.resolve(),
        }
    }

    pub fn with_face(face: Face) -> Self {
        Self { face }
    }

    pub fn face(&self) -> &Face {
        &self.face
    }

    /// Renders every element with `Sample {field_name}` as its text.
    pub fn render_preview(
        &self,
        template: &Template,
        elements: &[FieldElement],
    ) -> Result<RgbaImage, RenderError> {
        self.compose(template, elements, |element| {
            format!("Sample {}", element.field_name)
        })
    }

    fn compose<F>(
        &self,
        template: &Template,
        elements: &[FieldElement],
        text_for: F,
    ) -> Result<RgbaImage, RenderError>
    where
        F: Fn(&FieldElement) -> String,
    {
        for element in elements {
            validate_element(element)?;
        }

        let mut canvas = template.image().clone();
        for element in elements {
            let (x, y) = anchor(element, canvas.width(), canvas.height());
            let text = text_for(element);
            self.face
                .draw_centered(&mut canvas, &text, element.font_size, x, y, to_rgba(element.color));
        }
        Ok(canvas)
    }
}

impl CertificateRenderer for Renderer {
    fn render(
        &self,
        template: &Template,
        record: &ParticipantRecord,
        elements: &[FieldElement],
    ) -> Result<RgbaImage, RenderError> {
        self.compose(template, elements, |element| {
            record.get(&element.field_name).to_string()
        })
    }
}

fn validate_element(element: &FieldElement) -> Result<(), RenderError> {
    if !element.position.is_within_bounds() {
        return Err(RenderError::ElementOutOfBounds {
            field: element.field_name.clone(),
            x_pct: element.position.x_pct,
            y_pct: element.position.y_pct,
        });
    }
    if element.font_size == 0 {
        return Err(RenderError::InvalidElement {
            field: element.field_name.clone(),
            reason: "font size must be positive".to_string(),
        });
    }
    Ok(())
}

/// Pixel anchor of `element` on a `width` x `height` canvas, clamped onto the image.
fn anchor(element: &FieldElement, width: u32, height: u32) -> (f32, f32) {
    let resolved = element.position.resolve(width, height);
    let max_x = width.saturating_sub(1) as f64;
    let max_y = height.saturating_sub(1) as f64;
    (
        resolved.x.clamp(0.0, max_x) as f32,
        resolved.y.clamp(0.0, max_y) as f32,
    )
}

pub(crate) fn to_rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Encodes an RGBA image as an 8-bit PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let (w, h) = img.dimensions();
    let mut out = Vec::new();
    {
        let mut encoder = PngEncoder::new(&mut out, w, h);
        encoder.set_color(PngColorType::Rgba);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        writer
            .write_image_data(img.as_raw())
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use common::model::field::{FieldLayout, FieldUpdate, NormalizedPosition};

    pub(crate) fn white_template(width: u32, height: u32) -> Template {
        Template::from_image(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    pub(crate) fn record(pairs: &[(&str, &str)]) -> ParticipantRecord {
        ParticipantRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn bitmap_renderer() -> Renderer {
        Renderer::with_face(Face::Bitmap)
    }

    fn dark_pixels(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[0] < 128).count()
    }

    fn element_at(field: &str, x_pct: f64, y_pct: f64) -> FieldElement {
        let mut layout = FieldLayout::new();
        let id = layout.add_field(field, 16, Rgb::BLACK).id.clone();
        layout.update_field(
            &id,
            &FieldUpdate {
                x_pct: Some(x_pct),
                y_pct: Some(y_pct),
                ..FieldUpdate::default()
            },
        );
        layout.get(&id).cloned().unwrap()
    }

    #[test]
    fn output_keeps_template_dimensions() {
        let renderer = bitmap_renderer();
        for (w, h) in [(1, 1), (37, 91), (300, 200)] {
            let template = white_template(w, h);
            let elements = vec![element_at("Name", 50.0, 50.0), element_at("Name", 100.0, 0.0)];
            let img = renderer
                .render(&template, &record(&[("Name", "Jane Doe")]), &elements)
                .unwrap();
            assert_eq!(img.dimensions(), (w, h));
        }
    }

    #[test]
    fn template_is_not_mutated() {
        let renderer = bitmap_renderer();
        let template = white_template(120, 60);
        let img = renderer
            .render(&template, &record(&[("Name", "Ada")]), &[element_at("Name", 50.0, 50.0)])
            .unwrap();

        assert!(dark_pixels(&img) > 0);
        assert_eq!(dark_pixels(template.image()), 0);
    }

    #[test]
    fn missing_field_draws_nothing() {
        let renderer = bitmap_renderer();
        let template = white_template(120, 60);
        let img = renderer
            .render(&template, &record(&[("Name", "Ada")]), &[element_at("Course", 50.0, 50.0)])
            .unwrap();
        assert_eq!(dark_pixels(&img), 0);
    }

    #[test]
    fn text_uses_the_element_color() {
        let renderer = bitmap_renderer();
        let template = white_template(120, 60);
        let mut element = element_at("Name", 50.0, 50.0);
        element.color = Rgb::new(200, 0, 0);

        let img = renderer
            .render(&template, &record(&[("Name", "Ada")]), &[element])
            .unwrap();
        assert!(img.pixels().any(|p| p.0 == [200, 0, 0, 255]));
    }

    #[test]
    fn edge_positions_are_clamped_not_rejected() {
        let renderer = bitmap_renderer();
        let template = white_template(50, 50);
        let elements = vec![element_at("Name", 100.0, 100.0), element_at("Name", 0.0, 0.0)];
        let img = renderer
            .render(&template, &record(&[("Name", "Jane")]), &elements)
            .unwrap();
        assert!(dark_pixels(&img) > 0);
    }

    #[test]
    fn out_of_range_percentages_fail() {
        let renderer = bitmap_renderer();
        let template = white_template(50, 50);
        let mut element = element_at("Name", 50.0, 50.0);
        element.position = NormalizedPosition {
            x_pct: 180.0,
            y_pct: 50.0,
        };
        let err = renderer
            .render(&template, &record(&[("Name", "Jane")]), &[element])
            .unwrap_err();
        assert!(matches!(err, RenderError::ElementOutOfBounds { .. }));
    }

    #[test]
    fn zero_font_size_fails() {
        let renderer = bitmap_renderer();
        let mut element = element_at("Name", 50.0, 50.0);
        element.font_size = 0;
        let err = renderer
            .render(&white_template(10, 10), &record(&[]), &[element])
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidElement { .. }));
    }

    #[test]
    fn preview_draws_sample_text() {
        let renderer = bitmap_renderer();
        let template = white_template(200, 60);
        let img = renderer
            .render_preview(&template, &[element_at("Name", 50.0, 50.0)])
            .unwrap();
        assert!(dark_pixels(&img) > 0);
    }

    #[test]
    fn undecodable_template_is_a_render_error() {
        assert!(matches!(
            Template::decode(b"definitely not an image"),
            Err(RenderError::TemplateDecode(_))
        ));
    }

    #[test]
    fn png_encoding_decodes_back_to_the_same_size() {
        let img = white_template(17, 9).image().clone();
        let bytes = encode_png(&img).unwrap();
        let template = Template::decode(&bytes).unwrap();
        assert_eq!((template.width(), template.height()), (17, 9));
    }
}
