//! # Template Resolver
//!
//! Turns imported rows into an editable template and resolves any
//! (template, row) pair into a concrete block set.
//!
//! Everything here is pure: the same input always yields the same output,
//! and nothing errors. Missing data degrades to visible fallbacks instead.
//!
//! ## Placeholder policy
//!
//! `{{key}}` is replaced by the row value for `key`. A key the row does not
//! have is replaced by the literal key name, so missing data stays visible
//! in the rendered output.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::model::{
    Block, BlockId, BlockKind, BlockPatch, DataRow, ImageBlock, TextBlock, DEFAULT_COLOR,
    DEFAULT_FONT_SIZE, DEFAULT_IMAGE_SIZE,
};

/// Image drawn in place of a bound value that is not an image URL.
///
/// The rasterizer recognises this URL and draws a placeholder box without
/// fetching it.
pub const FALLBACK_IMAGE_URL: &str = "https://placehold.co/200x200.png";

/// Horizontal distance between inferred blocks.
const INFER_SPACING: f64 = 200.0;
/// Top-left corner of the first inferred block.
const INFER_ORIGIN: f64 = 50.0;

static IMAGE_URL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn image_url_pattern() -> &'static Regex {
    IMAGE_URL_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|webp|gif|svg)(\?.*)?$")
            .expect("Failed to compile image URL pattern")
    })
}

fn placeholder_pattern() -> &'static Regex {
    PLACEHOLDER_PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}")
            .expect("Failed to compile placeholder pattern")
    })
}

/// Whether `value` looks like a fetchable image URL.
pub fn is_image_url(value: &str) -> bool {
    image_url_pattern().is_match(value.trim())
}

/// Whether `text` contains at least one `{{key}}` placeholder.
pub fn has_placeholders(text: &str) -> bool {
    placeholder_pattern().is_match(text)
}

/// Replace every `{{key}}` in `text` with the row's value for `key`.
///
/// Keys absent from `vars` are replaced by the key name itself.
///
/// ```
/// use lienzo::model::DataRow;
/// use lienzo::template::substitute_placeholders;
///
/// let row: DataRow = [("name", "Tea")].into_iter().collect();
/// assert_eq!(substitute_placeholders("Buy {{name}} at {{price}}", &row), "Buy Tea at price");
/// ```
pub fn substitute_placeholders(text: &str, vars: &DataRow) -> String {
    placeholder_pattern()
        .replace_all(text, |caps: &Captures| {
            let key = &caps[1];
            match vars.get(key) {
                Some(value) => value.to_string(),
                None => key.to_string(),
            }
        })
        .into_owned()
}

fn placeholder(column: &str) -> String {
    format!("{{{{{}}}}}", column)
}

/// Build one template block per column of the first row, in column order.
///
/// Values that look like image URLs become image blocks, everything else
/// becomes text. Blocks are laid out left to right and bound to their column.
pub fn infer_template(rows: &[DataRow]) -> Vec<Block> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    first
        .iter()
        .enumerate()
        .map(|(i, (column, value))| {
            let kind = if is_image_url(&value.to_string()) {
                BlockKind::Image(ImageBlock {
                    url: placeholder(column),
                    width: DEFAULT_IMAGE_SIZE,
                    height: DEFAULT_IMAGE_SIZE,
                })
            } else {
                BlockKind::Text(TextBlock {
                    content: placeholder(column),
                    font_size: DEFAULT_FONT_SIZE,
                    color: DEFAULT_COLOR.to_string(),
                })
            };
            Block::new(BlockId(format!("field-{}", i + 1)), kind)
                .at(INFER_ORIGIN + i as f64 * INFER_SPACING, INFER_ORIGIN)
                .z(i as i32)
                .bound_to(column)
        })
        .collect()
}

fn validated_image(value: String) -> String {
    if is_image_url(&value) {
        value
    } else {
        FALLBACK_IMAGE_URL.to_string()
    }
}

/// Resolve the dynamic field of a single block against `row`.
///
/// Returns the content (text) or url (image) patch to apply, or `None` for
/// constant blocks and blocks with nothing to resolve.
pub fn resolve_block(block: &Block, row: &DataRow) -> Option<BlockPatch> {
    if block.is_constant {
        return None;
    }

    let bound = block.template_key.as_deref().map(|key| match row.get(key) {
        Some(value) => value.to_string(),
        None => key.to_string(),
    });

    match &block.kind {
        BlockKind::Text(text) => match bound {
            Some(value) => Some(BlockPatch::content(value)),
            None if has_placeholders(&text.content) => Some(BlockPatch::content(
                substitute_placeholders(&text.content, row),
            )),
            None => None,
        },
        BlockKind::Image(image) => match bound {
            Some(value) => Some(BlockPatch::url(validated_image(value))),
            None if has_placeholders(&image.url) => Some(BlockPatch::url(validated_image(
                substitute_placeholders(&image.url, row),
            ))),
            None => None,
        },
        BlockKind::Shape(_) | BlockKind::Line(_) | BlockKind::Group(_) => None,
    }
}

/// Resolve a whole template against one row.
///
/// Every block, constant or not, has its position and font size multiplied
/// by `scale`.
pub fn resolve_row(blocks: &[Block], row: &DataRow, scale: f64) -> Vec<Block> {
    blocks
        .iter()
        .map(|block| {
            let mut resolved = block.clone();
            if let Some(patch) = resolve_block(block, row) {
                patch.apply(&mut resolved);
            }
            resolved.scale_placement(scale, scale, scale);
            resolved
        })
        .collect()
}

/// Resolved preview sets for up to `count` rows following the first.
///
/// Row 0 seeds the template itself, so previews start at row 1.
pub fn build_previews(
    template: &[Block],
    rows: &[DataRow],
    count: usize,
    scale: f64,
) -> Vec<Vec<Block>> {
    rows.iter()
        .skip(1)
        .take(count)
        .map(|row| resolve_row(template, row, scale))
        .collect()
}
