//! # Field Layout Model
//!
//! A certificate layout is a list of [`FieldElement`]s: text overlays bound to a
//! dataset column, positioned in percentages of the template size so the same
//! layout survives a template swap.
//!
//! The layout owns the invariant that an element's `resolved` pixel position is
//! always `(width * x_pct / 100, height * y_pct / 100)` for the current template.
//! It is recomputed on every position edit and every template-size change and is
//! never written from outside this module.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default font size for a freshly added field, in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 36;

/// An RGB color, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color: {s}"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Center-anchored position in percent of the template width and height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosition {
    pub x_pct: f64,
    pub y_pct: f64,
}

impl NormalizedPosition {
    pub const CENTER: NormalizedPosition = NormalizedPosition {
        x_pct: 50.0,
        y_pct: 50.0,
    };

    /// Pixel coordinates of this position on a `width` x `height` image.
    pub fn resolve(&self, width: u32, height: u32) -> PixelPosition {
        PixelPosition {
            x: width as f64 * self.x_pct / 100.0,
            y: height as f64 * self.y_pct / 100.0,
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        let valid = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        valid(self.x_pct) && valid(self.y_pct)
    }
}

/// Pixel coordinates derived from a [`NormalizedPosition`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

/// One data-bound text overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldElement {
    pub id: String,
    pub field_name: String,
    pub font_size: u32,
    pub color: Rgb,
    pub position: NormalizedPosition,
    /// Present once the owning layout knows the template size.
    #[serde(default)]
    pub resolved: Option<PixelPosition>,
}

impl FieldElement {
    fn resolve_for(&mut self, template_size: Option<(u32, u32)>) {
        self.resolved = template_size.map(|(w, h)| self.position.resolve(w, h));
    }
}

/// A partial edit of a [`FieldElement`]. `None` leaves the attribute untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub x_pct: Option<f64>,
    #[serde(default)]
    pub y_pct: Option<f64>,
}

/// Largest font size, in pixels, an element may carry.
pub const MAX_FONT_SIZE: u32 = 1000;

/// Ordered set of field elements over one template.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FieldLayout {
    template_size: Option<(u32, u32)>,
    elements: Vec<FieldElement>,
}

impl FieldLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template_size(width: u32, height: u32) -> Self {
        Self {
            template_size: Some((width, height)),
            elements: Vec::new(),
        }
    }

    pub fn template_size(&self) -> Option<(u32, u32)> {
        self.template_size
    }

    /// Records new template dimensions and re-resolves every element against them.
    pub fn set_template_size(&mut self, width: u32, height: u32) {
        self.template_size = Some((width, height));
        for element in &mut self.elements {
            element.resolve_for(self.template_size);
        }
    }

    /// Appends a new element centered on the template.
    pub fn add_field(
        &mut self,
        field_name: impl Into<String>,
        font_size: u32,
        color: Rgb,
    ) -> &FieldElement {
        let mut element = FieldElement {
            id: Uuid::new_v4().to_string(),
            field_name: field_name.into(),
            font_size: clamp_font_size(font_size),
            color,
            position: NormalizedPosition::CENTER,
            resolved: None,
        };
        element.resolve_for(self.template_size);
        self.elements.push(element);
        // Just pushed, so the list is non-empty.
        &self.elements[self.elements.len() - 1]
    }

    /// Applies the supplied attributes of `update` to the element `id`.
    ///
    /// Percentages are clamped into `[0, 100]` (a drag may overshoot the edge) and
    /// the font size into `1..=MAX_FONT_SIZE`. Returns `false` when `id` is unknown,
    /// in which case nothing changes.
    pub fn update_field(&mut self, id: &str, update: &FieldUpdate) -> bool {
        let template_size = self.template_size;
        let Some(element) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };

        if let Some(size) = update.font_size {
            element.font_size = clamp_font_size(size);
        }
        if let Some(color) = update.color {
            element.color = color;
        }
        if let Some(x) = update.x_pct {
            element.position.x_pct = clamp_pct(x, element.position.x_pct);
        }
        if let Some(y) = update.y_pct {
            element.position.y_pct = clamp_pct(y, element.position.y_pct);
        }
        element.resolve_for(template_size);
        true
    }

    /// Removes the element `id`. Unknown ids are a no-op returning `false`.
    pub fn remove_field(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&FieldElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn elements(&self) -> &[FieldElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn clamp_font_size(size: u32) -> u32 {
    size.clamp(1, MAX_FONT_SIZE)
}

// NaN keeps the previous value.
fn clamp_pct(value: f64, previous: f64) -> f64 {
    if value.is_nan() {
        previous
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_is_centered_and_resolved() {
        let mut layout = FieldLayout::with_template_size(2000, 1000);
        let element = layout.add_field("Name", 40, Rgb::new(10, 20, 30));

        assert_eq!(element.position, NormalizedPosition::CENTER);
        assert_eq!(element.resolved, Some(PixelPosition { x: 1000.0, y: 500.0 }));
        assert!(!element.id.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut layout = FieldLayout::new();
        let a = layout.add_field("Name", 20, Rgb::BLACK).id.clone();
        let b = layout.add_field("Name", 30, Rgb::BLACK).id.clone();
        assert_ne!(a, b);
        assert_eq!(layout.elements().len(), 2);
    }

    #[test]
    fn field_without_template_has_no_resolved_position() {
        let mut layout = FieldLayout::new();
        let id = layout.add_field("Course", 20, Rgb::BLACK).id.clone();
        assert_eq!(layout.get(&id).unwrap().resolved, None);

        layout.set_template_size(400, 300);
        assert_eq!(
            layout.get(&id).unwrap().resolved,
            Some(PixelPosition { x: 200.0, y: 150.0 })
        );
    }

    #[test]
    fn update_touches_only_supplied_attributes() {
        let mut layout = FieldLayout::with_template_size(800, 600);
        let id = layout.add_field("Name", 24, Rgb::new(1, 2, 3)).id.clone();

        let changed = layout.update_field(
            &id,
            &FieldUpdate {
                x_pct: Some(25.0),
                ..FieldUpdate::default()
            },
        );
        assert!(changed);

        let element = layout.get(&id).unwrap();
        assert_eq!(element.font_size, 24);
        assert_eq!(element.color, Rgb::new(1, 2, 3));
        assert_eq!(element.position.x_pct, 25.0);
        assert_eq!(element.position.y_pct, 50.0);
        assert_eq!(element.resolved, Some(PixelPosition { x: 200.0, y: 300.0 }));
    }

    #[test]
    fn resolved_position_tracks_every_valid_percentage() {
        let mut layout = FieldLayout::with_template_size(1234, 777);
        let id = layout.add_field("Name", 10, Rgb::BLACK).id.clone();

        for step in 0..=20 {
            let pct = step as f64 * 5.0;
            layout.update_field(
                &id,
                &FieldUpdate {
                    x_pct: Some(pct),
                    y_pct: Some(100.0 - pct),
                    ..FieldUpdate::default()
                },
            );
            let resolved = layout.get(&id).unwrap().resolved.unwrap();
            assert_eq!(resolved.x, 1234.0 * pct / 100.0);
            assert_eq!(resolved.y, 777.0 * (100.0 - pct) / 100.0);
        }
    }

    #[test]
    fn update_clamps_position_and_font_size() {
        let mut layout = FieldLayout::with_template_size(100, 100);
        let id = layout.add_field("Name", 12, Rgb::BLACK).id.clone();

        layout.update_field(
            &id,
            &FieldUpdate {
                font_size: Some(0),
                x_pct: Some(140.0),
                y_pct: Some(-3.0),
                ..FieldUpdate::default()
            },
        );
        let element = layout.get(&id).unwrap();
        assert_eq!(element.font_size, 1);
        assert_eq!(element.position.x_pct, 100.0);
        assert_eq!(element.position.y_pct, 0.0);
    }

    #[test]
    fn oversized_fonts_are_capped() {
        let mut layout = FieldLayout::with_template_size(100, 100);
        let id = layout.add_field("Name", u32::MAX, Rgb::BLACK).id.clone();
        assert_eq!(layout.get(&id).unwrap().font_size, MAX_FONT_SIZE);

        layout.update_field(
            &id,
            &FieldUpdate {
                font_size: Some(1_000_000_000),
                ..FieldUpdate::default()
            },
        );
        assert_eq!(layout.get(&id).unwrap().font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn update_is_idempotent() {
        let mut layout = FieldLayout::with_template_size(640, 480);
        let id = layout.add_field("Name", 12, Rgb::BLACK).id.clone();
        let update = FieldUpdate {
            font_size: Some(48),
            color: Some(Rgb::new(255, 0, 0)),
            x_pct: Some(10.0),
            y_pct: Some(90.0),
        };

        layout.update_field(&id, &update);
        let first = layout.get(&id).cloned();
        layout.update_field(&id, &update);
        assert_eq!(layout.get(&id).cloned(), first);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut layout = FieldLayout::with_template_size(10, 10);
        layout.add_field("Name", 12, Rgb::BLACK);

        assert!(!layout.update_field("missing", &FieldUpdate::default()));
        assert!(!layout.remove_field("missing"));
        assert_eq!(layout.elements().len(), 1);
    }

    #[test]
    fn remove_keeps_the_order_of_the_rest() {
        let mut layout = FieldLayout::new();
        let a = layout.add_field("A", 12, Rgb::BLACK).id.clone();
        let b = layout.add_field("B", 12, Rgb::BLACK).id.clone();
        let c = layout.add_field("C", 12, Rgb::BLACK).id.clone();

        assert!(layout.remove_field(&b));
        let ids: Vec<_> = layout.elements().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn template_change_re_resolves_all_elements() {
        let mut layout = FieldLayout::with_template_size(100, 100);
        let id = layout.add_field("Name", 12, Rgb::BLACK).id.clone();
        layout.update_field(
            &id,
            &FieldUpdate {
                x_pct: Some(10.0),
                y_pct: Some(20.0),
                ..FieldUpdate::default()
            },
        );

        layout.set_template_size(500, 1000);
        assert_eq!(
            layout.get(&id).unwrap().resolved,
            Some(PixelPosition { x: 50.0, y: 200.0 })
        );
    }

    #[test]
    fn color_hex_round_trip_through_serde() {
        let color: Rgb = serde_json::from_str("\"#1a2B3c\"").unwrap();
        assert_eq!(color, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#1a2b3c\"");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("zzzzzz").is_err());
    }
}
