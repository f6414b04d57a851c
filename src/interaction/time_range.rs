use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::TimeRange;
use crate::render::{FilterTag, GraphicElement, RectPrimitive, ShapeStyle, TextPrimitive, TextStyle};

/// Filter type carried by every time-range primitive.
pub const TIME_RANGE_FILTER_TYPE: &str = "timeRange";

/// Ten buttons, ten labels and one underline.
pub type OverlayPrimitives = SmallVec<[GraphicElement; 21]>;

/// Geometry of the time-range strip in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayLayout {
    pub origin_x: f64,
    pub origin_y: f64,
    /// Horizontal distance between two button origins.
    pub pitch: f64,
    pub button_width: f64,
    pub button_height: f64,
    pub border_radius: f64,
    pub font_size: f64,
    pub label_top: f64,
    pub underline_top: f64,
    pub underline_inset: f64,
    pub underline_height: f64,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            origin_x: 10.0,
            origin_y: 10.0,
            pitch: 40.0,
            button_width: 35.0,
            button_height: 28.0,
            border_radius: 4.0,
            font_size: 10.0,
            label_top: 24.0,
            underline_top: 40.0,
            underline_inset: 5.0,
            underline_height: 2.0,
        }
    }
}

impl OverlayLayout {
    #[must_use]
    pub fn button_left(&self, index: usize) -> f64 {
        self.origin_x + index as f64 * self.pitch
    }

    /// Center of the button at `index`, handy for synthesizing clicks.
    #[must_use]
    pub fn button_center(&self, index: usize) -> (f64, f64) {
        (
            self.button_left(index) + self.button_width / 2.0,
            self.origin_y + self.button_height / 2.0,
        )
    }
}

/// Builds the full primitive list for `ranges` with `selected` highlighted.
///
/// Order is buttons, then labels, then the underline. The underline is
/// omitted when `selected` is not one of `ranges`.
#[must_use]
pub fn render_overlay(
    ranges: &[TimeRange],
    selected: TimeRange,
    layout: &OverlayLayout,
) -> OverlayPrimitives {
    let mut elements = OverlayPrimitives::new();

    for (index, range) in ranges.iter().enumerate() {
        let style = if *range == selected {
            ShapeStyle::filled("#2196f3", layout.border_radius)
                .with_stroke("#1976d2", 2.5)
                .with_shadow(8.0, "rgba(33, 150, 243, 0.5)", 4.0)
        } else {
            ShapeStyle::filled("#ffffff", layout.border_radius)
                .with_stroke("#e0e0e0", 1.5)
                .with_shadow(2.0, "rgba(0, 0, 0, 0.15)", 1.0)
        };
        elements.push(GraphicElement::Rect(RectPrimitive {
            left: layout.button_left(index),
            top: layout.origin_y,
            width: layout.button_width,
            height: layout.button_height,
            style,
            tag: Some(range_tag(*range)),
        }));
    }

    for (index, range) in ranges.iter().enumerate() {
        let active = *range == selected;
        let (fill, weight, shadow) = if active {
            ("#ffffff", "bold", "0 1px 2px rgba(0,0,0,0.3)")
        } else {
            ("#333333", "600", "none")
        };
        elements.push(GraphicElement::Text(TextPrimitive {
            left: layout.button_left(index) + layout.button_width / 2.0,
            top: layout.label_top,
            style: TextStyle {
                text: range.label().to_owned(),
                fill: fill.to_owned(),
                font_size: layout.font_size,
                font_weight: weight.to_owned(),
                text_align: "center".to_owned(),
                text_vertical_align: "middle".to_owned(),
                font_family: "Verdana, Arial, sans-serif".to_owned(),
                text_shadow: shadow.to_owned(),
            },
            tag: Some(range_tag(*range)),
        }));
    }

    if let Some(index) = ranges.iter().position(|range| *range == selected) {
        elements.push(GraphicElement::Rect(RectPrimitive {
            left: layout.button_left(index) + layout.underline_inset,
            top: layout.underline_top,
            width: layout.button_width - 2.0 * layout.underline_inset,
            height: layout.underline_height,
            style: ShapeStyle::filled("#1565c0", 1.0),
            tag: None,
        }));
    }

    elements
}

fn range_tag(range: TimeRange) -> FilterTag {
    FilterTag::new(TIME_RANGE_FILTER_TYPE, range.label())
}

/// Range the primitive at `index` of `elements` stands for.
#[must_use]
pub fn range_at(elements: &[GraphicElement], index: usize) -> Option<TimeRange> {
    elements
        .get(index)
        .and_then(GraphicElement::tag)
        .and_then(|tag| tag.range.parse().ok())
}

/// Same as [`range_at`] but over the raw `graphic` list the engine reports.
#[must_use]
pub fn range_at_json(graphic: &serde_json::Value, index: usize) -> Option<TimeRange> {
    graphic
        .get(index)
        .and_then(|element| element.get("range"))
        .and_then(serde_json::Value::as_str)
        .and_then(|range| range.parse().ok())
}

/// Hit-tests container coordinates against the button rectangles.
#[must_use]
pub fn hit_test(elements: &[GraphicElement], x: f64, y: f64) -> Option<TimeRange> {
    elements.iter().find_map(|element| match element {
        GraphicElement::Rect(rect) if rect.contains(x, y) => {
            rect.tag.as_ref().and_then(|tag| tag.range.parse().ok())
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{OverlayLayout, hit_test, range_at, render_overlay};
    use crate::core::TimeRange;
    use crate::render::GraphicElement;

    #[test]
    fn strip_has_buttons_labels_and_one_underline() {
        let layout = OverlayLayout::default();
        let elements = render_overlay(&TimeRange::ALL, TimeRange::OneYear, &layout);
        assert_eq!(elements.len(), 21);
        assert!(!elements.spilled());
        let underline = match &elements[20] {
            GraphicElement::Rect(rect) => rect,
            GraphicElement::Text(_) => panic!("underline must be a rect"),
        };
        assert!(underline.tag.is_none());
        assert_eq!(underline.left, 10.0 + 6.0 * 40.0 + 5.0);
        assert_eq!(underline.width, 25.0);
    }

    #[test]
    fn label_and_button_resolve_to_the_same_range() {
        let elements = render_overlay(&TimeRange::ALL, TimeRange::OneYear, &OverlayLayout::default());
        assert_eq!(range_at(&elements, 2), Some(TimeRange::OneMonth));
        assert_eq!(range_at(&elements, 12), Some(TimeRange::OneMonth));
        assert_eq!(range_at(&elements, 20), None);
    }

    #[test]
    fn hit_test_ignores_the_gap_between_buttons() {
        let layout = OverlayLayout::default();
        let elements = render_overlay(&TimeRange::ALL, TimeRange::OneYear, &layout);
        assert_eq!(hit_test(&elements, 20.0, 20.0), Some(TimeRange::OneDay));
        assert_eq!(hit_test(&elements, 47.0, 20.0), None);
        assert_eq!(hit_test(&elements, 20.0, 60.0), None);
    }
}
