//! Variant struct types for the block model.
//!
//! All types derive `Serialize + Deserialize` with camelCase field names so
//! the same types work for Rust construction and the editor's JSON API.
//!
//! Each variant implements [`BlockMeta`] to declare its display label and
//! toolbar default. The metadata is used when the editor adds a new block.

use serde::{Deserialize, Serialize};

use super::BlockId;

/// Metadata that every block variant must provide.
///
/// The label and editor default live next to each struct definition, so
/// adding a new block type is self-contained: implement this trait and the
/// compiler points at the remaining exhaustive matches in `BlockKind`.
pub trait BlockMeta: Sized {
    /// Human-readable display label (e.g. "Text", "Line").
    fn label() -> &'static str;

    /// Starter value used by the toolbar "add" action.
    fn editor_default() -> Self;
}

pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_SHAPE_COLOR: &str = "#cccccc";
pub const DEFAULT_IMAGE_SIZE: f64 = 200.0;

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_shape_color() -> String {
    DEFAULT_SHAPE_COLOR.to_string()
}

fn default_image_size() -> f64 {
    DEFAULT_IMAGE_SIZE
}

fn default_shape_size() -> f64 {
    100.0
}

fn default_line_width() -> f64 {
    2.0
}

fn default_line_length() -> f64 {
    100.0
}

pub(crate) fn default_opacity() -> f64 {
    1.0
}

// ============================================================================
// TEXT
// ============================================================================

/// Text block. `content` may contain `{{key}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for TextBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: default_color(),
        }
    }
}

impl BlockMeta for TextBlock {
    fn label() -> &'static str {
        "Text"
    }
    fn editor_default() -> Self {
        Self {
            content: "New text".into(),
            ..Default::default()
        }
    }
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// IMAGE
// ============================================================================

/// Image block. `url` may itself be, or contain, a `{{key}}` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_image_size")]
    pub width: f64,
    #[serde(default = "default_image_size")]
    pub height: f64,
}

impl Default for ImageBlock {
    fn default() -> Self {
        Self {
            url: String::new(),
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
        }
    }
}

impl BlockMeta for ImageBlock {
    fn label() -> &'static str {
        "Image"
    }
    fn editor_default() -> Self {
        Self::default()
    }
}

// ============================================================================
// SHAPE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Circle,
    Triangle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeBlock {
    #[serde(default)]
    pub shape_type: ShapeType,
    #[serde(default = "default_shape_size")]
    pub width: f64,
    #[serde(default = "default_shape_size")]
    pub height: f64,
    #[serde(default = "default_shape_color")]
    pub color: String,
}

impl Default for ShapeBlock {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rectangle,
            width: 100.0,
            height: 100.0,
            color: default_shape_color(),
        }
    }
}

impl BlockMeta for ShapeBlock {
    fn label() -> &'static str {
        "Shape"
    }
    fn editor_default() -> Self {
        Self::default()
    }
}

// ============================================================================
// LINE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Which ends of a line carry a marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnds {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl LineEnds {
    pub fn has_start(self) -> bool {
        matches!(self, LineEnds::Start | LineEnds::Both)
    }

    pub fn has_end(self) -> bool {
        matches!(self, LineEnds::End | LineEnds::Both)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndType {
    Circle,
    Square,
    #[default]
    Arrow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBlock {
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default)]
    pub line_type: LineType,
    #[serde(default = "default_line_length")]
    pub length: f64,
    #[serde(default)]
    pub line_ends: LineEnds,
    #[serde(default)]
    pub line_end_type: LineEndType,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for LineBlock {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            line_type: LineType::Solid,
            length: 100.0,
            line_ends: LineEnds::None,
            line_end_type: LineEndType::Arrow,
            color: default_color(),
        }
    }
}

impl BlockMeta for LineBlock {
    fn label() -> &'static str {
        "Line"
    }
    fn editor_default() -> Self {
        Self::default()
    }
}

// ============================================================================
// GROUP
// ============================================================================

/// Display aggregate over other blocks. Children keep their own absolute
/// coordinates; a group is an index, not a transform frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBlock {
    #[serde(default)]
    pub children: Vec<BlockId>,
}

impl BlockMeta for GroupBlock {
    fn label() -> &'static str {
        "Group"
    }
    fn editor_default() -> Self {
        Self::default()
    }
}

// ============================================================================
// FILL
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillType {
    #[default]
    Solid,
    Gradient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    #[default]
    Linear,
    Radial,
}

/// Gradient fill: ordered color stops spread evenly along the gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(rename = "type", default)]
    pub kind: GradientType,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Direction in degrees for linear gradients (0 = left to right).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<f64>,
}

// ============================================================================
// CANVAS & LAYERS
// ============================================================================

/// Canvas pixel dimensions and background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub fill_type: FillType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background_color: default_background(),
            opacity: 1.0,
            fill_type: FillType::Solid,
            gradient: None,
        }
    }
}

impl CanvasSettings {
    /// Gradient to paint, if the fill type asks for one and it has stops.
    pub fn effective_gradient(&self) -> Option<&Gradient> {
        effective_gradient(self.fill_type, self.gradient.as_ref())
    }
}

pub(crate) fn effective_gradient(
    fill_type: FillType,
    gradient: Option<&Gradient>,
) -> Option<&Gradient> {
    match (fill_type, gradient) {
        (FillType::Gradient, Some(g)) if !g.colors.is_empty() => Some(g),
        _ => None,
    }
}

/// Named grouping with independent visibility, lock and opacity.
///
/// `block_ids` is a reference list: blocks are owned by the store's
/// collection, a layer only indexes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: super::LayerId,
    pub name: String,
    #[serde(default)]
    pub block_ids: Vec<BlockId>,
    #[serde(default = "super::default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Layer {
    pub fn new(id: super::LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            block_ids: Vec::new(),
            visible: true,
            locked: false,
            opacity: 1.0,
        }
    }
}
