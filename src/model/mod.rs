//! # Block Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API of the
//! editor. A [`Block`] is a shared positional envelope plus a tagged
//! [`BlockKind`] variant carrying only the fields that variant uses.
//!
//! ```
//! use lienzo::model::*;
//!
//! // Rust construction
//! let block = Block::new("title", BlockKind::Text(TextBlock::new("{{name}}")))
//!     .at(50.0, 50.0)
//!     .bound_to("name");
//!
//! // JSON deserialization
//! let json = r#"{"id": "title", "type": "text", "x": 50, "y": 50, "content": "{{name}}", "templateKey": "name"}"#;
//! let parsed: Block = serde_json::from_str(json).unwrap();
//! assert_eq!(parsed, block);
//! ```

pub mod data;
pub mod patch;
pub mod state;
pub mod types;

pub use data::{CellValue, DataRow, Dataset};
pub use patch::BlockPatch;
pub use state::{EditorState, ExportStatus};
pub use types::*;

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(
    /// Block identity, unique within a block collection and immutable.
    BlockId
);
define_id!(
    /// Weak reference to a [`Layer`], resolved by lookup at use time.
    LayerId
);

impl BlockId {
    /// Fresh random id for blocks created by the editor.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, uuid::Uuid::new_v4().simple()))
    }
}

impl LayerId {
    pub fn generate() -> Self {
        Self(format!("layer-{}", uuid::Uuid::new_v4().simple()))
    }
}

/// Blocks in paint order: ascending `zIndex`, ties kept in collection order.
pub fn paint_order(blocks: &[Block]) -> Vec<&Block> {
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.z_index);
    ordered
}

// ============================================================================
// BLOCK
// ============================================================================

/// A positioned visual primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Paint order; ties keep collection order.
    #[serde(default)]
    pub z_index: i32,
    /// Degrees, clockwise, about the block's centre.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "types::default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub fill_type: FillType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<LayerId>,
    /// Data column this block's dynamic field is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_key: Option<String>,
    /// Constant blocks keep their content/url verbatim during resolution.
    #[serde(default)]
    pub is_constant: bool,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    /// Create a block at the origin with envelope defaults.
    pub fn new(id: impl Into<BlockId>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            z_index: 0,
            rotation: 0.0,
            opacity: 1.0,
            fill_type: FillType::Solid,
            gradient: None,
            layer_id: None,
            template_key: None,
            is_constant: false,
            kind,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn bound_to(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    /// Text content, for text blocks.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Text(t) => Some(&t.content),
            _ => None,
        }
    }

    /// Image source, for image blocks.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Image(i) => Some(&i.url),
            _ => None,
        }
    }

    pub fn font_size(&self) -> Option<f64> {
        match &self.kind {
            BlockKind::Text(t) => Some(t.font_size),
            _ => None,
        }
    }

    /// Gradient to paint, if the fill type asks for one and it has stops.
    pub fn effective_gradient(&self) -> Option<&Gradient> {
        types::effective_gradient(self.fill_type, self.gradient.as_ref())
    }

    /// Group children, empty for non-group blocks.
    pub fn children(&self) -> &[BlockId] {
        match &self.kind {
            BlockKind::Group(g) => &g.children,
            _ => &[],
        }
    }

    /// Multiply position by (`sx`, `sy`) and font size by `sf`.
    pub fn scale_placement(&mut self, sx: f64, sy: f64, sf: f64) {
        self.x *= sx;
        self.y *= sy;
        if let BlockKind::Text(t) = &mut self.kind {
            t.font_size *= sf;
        }
    }

    /// Multiply intrinsic geometry (width/height/length/stroke).
    pub fn scale_geometry(&mut self, sx: f64, sy: f64) {
        match &mut self.kind {
            BlockKind::Image(i) => {
                i.width *= sx;
                i.height *= sy;
            }
            BlockKind::Shape(s) => {
                s.width *= sx;
                s.height *= sy;
            }
            BlockKind::Line(l) => {
                l.length *= sx;
                l.line_width *= sx;
            }
            BlockKind::Text(_) | BlockKind::Group(_) => {}
        }
    }
}

/// Define the BlockKind enum and all dispatch methods from a single list.
///
/// Adding a new block type: add one line here, then define the struct in
/// `types.rs` with `impl BlockMeta`.
macro_rules! define_block_kinds {
    ($($variant:ident($inner:ty) => $tag:literal),+ $(,)?) => {
        /// The tagged block variant.
        ///
        /// `#[serde(tag = "type")]` gives JSON like `{"type": "text", "content": "Hi"}`.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "lowercase")]
        pub enum BlockKind {
            $($variant($inner),)+
        }

        impl BlockKind {
            /// The serde type tag (`"text"`, `"image"`, ...).
            pub fn type_name(&self) -> &'static str {
                match self { $(BlockKind::$variant(_) => $tag,)+ }
            }

            /// Human-readable display label (from [`BlockMeta::label`]).
            pub fn label(&self) -> &'static str {
                match self { $(BlockKind::$variant(_) => <$inner>::label(),)+ }
            }

            /// Toolbar defaults for every block type.
            pub fn all_editor_defaults() -> Vec<Self> {
                vec![$(BlockKind::$variant(<$inner>::editor_default()),)+]
            }

            /// Toolbar default for a type tag, `None` for unknown tags.
            pub fn editor_default(type_name: &str) -> Option<Self> {
                match type_name {
                    $($tag => Some(BlockKind::$variant(<$inner>::editor_default())),)+
                    _ => None,
                }
            }
        }
    };
}

define_block_kinds! {
    Text(TextBlock) => "text",
    Image(ImageBlock) => "image",
    Shape(ShapeBlock) => "shape",
    Group(GroupBlock) => "group",
    Line(LineBlock) => "line",
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_block_json() {
        let json = r#"{"id": "t1", "type": "text", "x": 10, "y": 20, "zIndex": 3, "content": "Hi", "fontSize": 24}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.id.as_str(), "t1");
        assert_eq!(block.z_index, 3);
        assert_eq!(block.opacity, 1.0);
        assert!(!block.is_constant);
        match &block.kind {
            BlockKind::Text(t) => {
                assert_eq!(t.content, "Hi");
                assert_eq!(t.font_size, 24.0);
                assert_eq!(t.color, "#000000");
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_line_block_json_defaults() {
        let json = r#"{"id": "l1", "type": "line", "lineEnds": "both", "lineType": "dashed"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        match &block.kind {
            BlockKind::Line(l) => {
                assert_eq!(l.line_ends, LineEnds::Both);
                assert_eq!(l.line_type, LineType::Dashed);
                assert_eq!(l.line_end_type, LineEndType::Arrow);
                assert_eq!(l.length, 100.0);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_roundtrip_keeps_tag() {
        let block = Block::new(
            "s1",
            BlockKind::Shape(ShapeBlock {
                shape_type: ShapeType::Circle,
                ..Default::default()
            }),
        )
        .at(5.0, 6.0)
        .z(2);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "shape");
        assert_eq!(value["shapeType"], "circle");
        assert_eq!(value["zIndex"], 2);
        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_gradient_json() {
        let json = r##"{"id": "g", "type": "shape", "fillType": "gradient",
            "gradient": {"type": "radial", "colors": ["#ff0000", "#0000ff"]}}"##;
        let block: Block = serde_json::from_str(json).unwrap();
        let g = block.effective_gradient().unwrap();
        assert_eq!(g.kind, GradientType::Radial);
        assert_eq!(g.colors.len(), 2);
    }

    #[test]
    fn test_gradient_ignored_for_solid_fill() {
        let mut block = Block::new("g", BlockKind::Shape(ShapeBlock::default()));
        block.gradient = Some(Gradient {
            kind: GradientType::Linear,
            colors: vec!["#000".into()],
            direction: None,
        });
        assert!(block.effective_gradient().is_none());
    }

    #[test]
    fn test_editor_defaults_complete() {
        let defaults = BlockKind::all_editor_defaults();
        assert_eq!(defaults.len(), 5);
        for kind in &defaults {
            let again = BlockKind::editor_default(kind.type_name()).unwrap();
            assert_eq!(&again, kind);
        }
        assert!(BlockKind::editor_default("chart").is_none());
    }

    #[test]
    fn test_scale_placement_only_touches_text_font() {
        let mut text = Block::new("t", BlockKind::Text(TextBlock::new("x"))).at(10.0, 10.0);
        text.scale_placement(2.0, 0.5, 2.0);
        assert_eq!((text.x, text.y), (20.0, 5.0));
        assert_eq!(text.font_size(), Some(32.0));

        let mut image = Block::new("i", BlockKind::Image(ImageBlock::default())).at(1.0, 1.0);
        image.scale_placement(3.0, 3.0, 3.0);
        assert_eq!(image.url(), Some(""));
        match image.kind {
            BlockKind::Image(i) => assert_eq!(i.width, 200.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_paint_order_is_stable() {
        let blocks = vec![
            Block::new("a", BlockKind::Text(TextBlock::new("a"))).z(2),
            Block::new("b", BlockKind::Text(TextBlock::new("b"))).z(1),
            Block::new("c", BlockKind::Text(TextBlock::new("c"))).z(2),
            Block::new("d", BlockKind::Text(TextBlock::new("d"))).z(1),
        ];
        let ids: Vec<&str> = paint_order(&blocks).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = BlockId::generate("block");
        let b = BlockId::generate("block");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("block-"));
    }
}
