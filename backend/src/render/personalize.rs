use crate::error::RenderError;
use crate::render::{Renderer, Template};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Side of the square a participant photo is resized to.
pub const PHOTO_SIZE: u32 = 150;

const NAME_FONT_SIZE: u32 = 48;
const EMAIL_FONT_SIZE: u32 = 36;
const EMAIL_OFFSET_Y: f32 = 60.0;

/// A one-off certificate filled in by the participant.
#[derive(Debug, Clone, Default)]
pub struct Personalization {
    pub name: String,
    pub email: String,
    /// Encoded PNG/JPEG photo.
    pub photo: Option<Vec<u8>>,
    /// Top-left corner of the photo. Defaults to `(50, height - 200)`.
    pub photo_x: Option<u32>,
    pub photo_y: Option<u32>,
}

impl Renderer {
    /// Draws the name at the center, the email 60px below it and pastes the photo
    /// (resized to [`PHOTO_SIZE`]) at its requested corner, clamped into the image.
    pub fn personalize(
        &self,
        template: &Template,
        details: &Personalization,
    ) -> Result<RgbaImage, RenderError> {
        let mut canvas = template.image().clone();
        let cx = (canvas.width() / 2) as f32;
        let cy = (canvas.height() / 2) as f32;
        let black = Rgba([0, 0, 0, 255]);

        let name = details.name.trim();
        if !name.is_empty() {
            self.face().draw_centered(&mut canvas, name, NAME_FONT_SIZE, cx, cy, black);
        }
        let email = details.email.trim();
        if !email.is_empty() {
            self.face()
                .draw_centered(&mut canvas, email, EMAIL_FONT_SIZE, cx, cy + EMAIL_OFFSET_Y, black);
        }

        if let Some(bytes) = &details.photo {
            let photo = image::load_from_memory(bytes)
                .map_err(|e| RenderError::InvalidElement {
                    field: "photo".to_string(),
                    reason: e.to_string(),
                })?
                .to_rgba8();
            let photo = imageops::resize(&photo, PHOTO_SIZE, PHOTO_SIZE, FilterType::Triangle);

            let max_x = canvas.width().saturating_sub(1);
            let max_y = canvas.height().saturating_sub(1);
            let x = details.photo_x.unwrap_or(50).min(max_x);
            let y = details
                .photo_y
                .unwrap_or_else(|| canvas.height().saturating_sub(200))
                .min(max_y);
            imageops::overlay(&mut canvas, &photo, x as i64, y as i64);
        }

        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode_png;
    use crate::render::fonts::Face;
    use crate::render::tests::white_template;

    fn red_photo() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]))).unwrap()
    }

    #[test]
    fn photo_is_resized_and_placed() {
        let renderer = Renderer::with_face(Face::Bitmap);
        let template = white_template(400, 300);
        let details = Personalization {
            photo: Some(red_photo()),
            photo_x: Some(10),
            photo_y: Some(20),
            ..Personalization::default()
        };

        let img = renderer.personalize(&template, &details).unwrap();
        assert_eq!(img.dimensions(), (400, 300));
        assert_eq!(img.get_pixel(10, 20).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(159, 169).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(160, 170).0, [255, 255, 255, 255]);
    }

    #[test]
    fn photo_position_is_clamped() {
        let renderer = Renderer::with_face(Face::Bitmap);
        let template = white_template(100, 100);
        let details = Personalization {
            photo: Some(red_photo()),
            photo_x: Some(5_000),
            photo_y: Some(5_000),
            ..Personalization::default()
        };
        let img = renderer.personalize(&template, &details).unwrap();
        assert_eq!(img.get_pixel(99, 99).0, [255, 0, 0, 255]);
    }

    #[test]
    fn name_and_email_are_drawn() {
        let renderer = Renderer::with_face(Face::Bitmap);
        let template = white_template(800, 400);
        let details = Personalization {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            ..Personalization::default()
        };
        let img = renderer.personalize(&template, &details).unwrap();
        assert!(img.pixels().any(|p| p.0[0] == 0));
    }

    #[test]
    fn broken_photo_is_an_error() {
        let renderer = Renderer::with_face(Face::Bitmap);
        let details = Personalization {
            photo: Some(b"nope".to_vec()),
            ..Personalization::default()
        };
        assert!(renderer.personalize(&white_template(10, 10), &details).is_err());
    }
}
