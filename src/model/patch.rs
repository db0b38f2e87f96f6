//! Merge-patch for blocks.
//!
//! Every field is optional; absent fields leave the block untouched. Fields
//! that only exist on some variants are ignored for the others. `id` is not
//! patchable.

use serde::{Deserialize, Deserializer, Serialize};

use super::{
    Block, BlockId, BlockKind, FillType, Gradient, LayerId, LineEndType, LineEnds, LineType,
    ShapeType,
};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_type: Option<FillType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Option<Gradient>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<Option<LayerId>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub template_key: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_constant: Option<bool>,

    // text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// text, shape and line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    // image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// image and shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// image and shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    // shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeType>,

    // line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_type: Option<LineType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_ends: Option<LineEnds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end_type: Option<LineEndType>,

    // group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BlockId>>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// Merge this patch into `block`.
    pub fn apply(&self, block: &mut Block) {
        if let Some(x) = self.x {
            block.x = x;
        }
        if let Some(y) = self.y {
            block.y = y;
        }
        if let Some(z) = self.z_index {
            block.z_index = z;
        }
        if let Some(r) = self.rotation {
            block.rotation = r;
        }
        if let Some(o) = self.opacity {
            block.opacity = o.clamp(0.0, 1.0);
        }
        if let Some(f) = self.fill_type {
            block.fill_type = f;
        }
        if let Some(g) = &self.gradient {
            block.gradient = g.clone();
        }
        if let Some(l) = &self.layer_id {
            block.layer_id = l.clone();
        }
        if let Some(k) = &self.template_key {
            block.template_key = k.clone();
        }
        if let Some(c) = self.is_constant {
            block.is_constant = c;
        }

        match &mut block.kind {
            BlockKind::Text(t) => {
                if let Some(content) = &self.content {
                    t.content = content.clone();
                }
                if let Some(size) = self.font_size {
                    t.font_size = size;
                }
                if let Some(color) = &self.color {
                    t.color = color.clone();
                }
            }
            BlockKind::Image(i) => {
                if let Some(url) = &self.url {
                    i.url = url.clone();
                }
                if let Some(w) = self.width {
                    i.width = w;
                }
                if let Some(h) = self.height {
                    i.height = h;
                }
            }
            BlockKind::Shape(s) => {
                if let Some(shape) = self.shape_type {
                    s.shape_type = shape;
                }
                if let Some(w) = self.width {
                    s.width = w;
                }
                if let Some(h) = self.height {
                    s.height = h;
                }
                if let Some(color) = &self.color {
                    s.color = color.clone();
                }
            }
            BlockKind::Line(l) => {
                if let Some(w) = self.line_width {
                    l.line_width = w;
                }
                if let Some(t) = self.line_type {
                    l.line_type = t;
                }
                if let Some(len) = self.length {
                    l.length = len;
                }
                if let Some(ends) = self.line_ends {
                    l.line_ends = ends;
                }
                if let Some(end) = self.line_end_type {
                    l.line_end_type = end;
                }
                if let Some(color) = &self.color {
                    l.color = color.clone();
                }
            }
            BlockKind::Group(g) => {
                if let Some(children) = &self.children {
                    g.children = children.clone();
                }
            }
        }
    }
}
