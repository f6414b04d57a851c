use serde::{Deserialize, Serialize};

use crate::error::{WidgetError, WidgetResult};

/// Logical payload carried by a clickable primitive.
///
/// Hit-testing resolves clicks through this tag, never through the label
/// text the engine draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTag {
    pub range: String,
    pub filter_type: String,
    pub filter_value: String,
    pub cursor: String,
    pub silent: bool,
}

impl FilterTag {
    #[must_use]
    pub fn new(filter_type: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            range: value.clone(),
            filter_type: filter_type.into(),
            filter_value: value,
            cursor: "pointer".to_owned(),
            silent: false,
        }
    }
}

/// Fill, stroke and shadow of a shape primitive, as CSS color strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    pub fill: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    pub border_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_offset_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_offset_y: Option<f64>,
}

impl ShapeStyle {
    #[must_use]
    pub fn filled(fill: impl Into<String>, border_radius: f64) -> Self {
        Self {
            fill: fill.into(),
            stroke: None,
            line_width: None,
            border_radius,
            shadow_blur: None,
            shadow_color: None,
            shadow_offset_x: None,
            shadow_offset_y: None,
        }
    }

    #[must_use]
    pub fn with_stroke(mut self, stroke: impl Into<String>, line_width: f64) -> Self {
        self.stroke = Some(stroke.into());
        self.line_width = Some(line_width);
        self
    }

    #[must_use]
    pub fn with_shadow(mut self, blur: f64, color: impl Into<String>, offset_y: f64) -> Self {
        self.shadow_blur = Some(blur);
        self.shadow_color = Some(color.into());
        self.shadow_offset_x = Some(0.0);
        self.shadow_offset_y = Some(offset_y);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub text: String,
    pub fill: String,
    pub font_size: f64,
    pub font_weight: String,
    pub text_align: String,
    pub text_vertical_align: String,
    pub font_family: String,
    pub text_shadow: String,
}

/// Rectangle positioned in container pixels from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectPrimitive {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub tag: Option<FilterTag>,
}

impl RectPrimitive {
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }

    pub fn validate(&self) -> WidgetResult<()> {
        if !self.left.is_finite() || !self.top.is_finite() {
            return Err(WidgetError::InvalidData(
                "rect position must be finite".to_owned(),
            ));
        }
        if !self.width.is_finite() || self.width <= 0.0 || !self.height.is_finite() || self.height <= 0.0
        {
            return Err(WidgetError::InvalidData(
                "rect size must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Label anchored at `left`/`top`; alignment lives in the style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPrimitive {
    pub left: f64,
    pub top: f64,
    pub style: TextStyle,
    #[serde(flatten)]
    pub tag: Option<FilterTag>,
}

impl TextPrimitive {
    pub fn validate(&self) -> WidgetResult<()> {
        if self.style.text.is_empty() {
            return Err(WidgetError::InvalidData(
                "text primitive must not be empty".to_owned(),
            ));
        }
        if !self.left.is_finite() || !self.top.is_finite() {
            return Err(WidgetError::InvalidData(
                "text position must be finite".to_owned(),
            ));
        }
        if !self.style.font_size.is_finite() || self.style.font_size <= 0.0 {
            return Err(WidgetError::InvalidData(
                "font size must be finite and > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// One entry of the engine's `graphic` component list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GraphicElement {
    Rect(RectPrimitive),
    Text(TextPrimitive),
}

impl GraphicElement {
    #[must_use]
    pub fn tag(&self) -> Option<&FilterTag> {
        match self {
            Self::Rect(rect) => rect.tag.as_ref(),
            Self::Text(text) => text.tag.as_ref(),
        }
    }

    pub fn validate(&self) -> WidgetResult<()> {
        match self {
            Self::Rect(rect) => rect.validate(),
            Self::Text(text) => text.validate(),
        }
    }
}
