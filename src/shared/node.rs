/**
 * Canvas Node Types
 *
 * This module defines a single positioned visual element of a canvas
 * document and the closed vocabularies its attributes draw from.
 *
 * # Wire Format
 *
 * Nodes travel as camelCase JSON objects tagged by `type`:
 * ```json
 * {"id":"r1","type":"rect","x":0,"y":0,"width":100,"height":100,"fill":"#ff0000"}
 * ```
 *
 * Hierarchy is carried by `children` (authoritative) and `parentId`
 * (a mirror the engine keeps in sync after every operation).
 */

use serde::{Deserialize, Serialize};

/// Shape variant of a node
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Filled rectangle
    Rect,
    /// Filled ellipse inscribed in the node's box
    Ellipse,
    /// Text block
    Text,
    /// Bitmap referenced by `src`
    Image,
    /// Container produced by grouping
    Frame,
}

impl NodeKind {
    /// Every accepted wire tag
    pub const ALL: [&'static str; 5] = ["rect", "ellipse", "text", "image", "frame"];

    /// Parse a wire tag
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "rect" => Some(Self::Rect),
            "ellipse" => Some(Self::Ellipse),
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "frame" => Some(Self::Frame),
            _ => None,
        }
    }

    /// Attributes that must be present for this kind
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Rect | Self::Ellipse => &["fill"],
            Self::Text => &["text"],
            Self::Image => &["src"],
            Self::Frame => &[],
        }
    }
}

/// Layout mode a container applies to its children
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Children keep their own positions
    #[default]
    None,
    /// Left-to-right flow
    Horizontal,
    /// Top-to-bottom flow
    Vertical,
    /// Left-to-right rows wrapped at the container's inner width
    Grid,
}

impl Alignment {
    pub const ALL: [&'static str; 4] = ["none", "horizontal", "vertical", "grid"];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub const ALL: [&'static str; 3] = ["left", "center", "right"];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Normal,
    Medium,
    Bold,
}

impl FontWeight {
    pub const ALL: [&'static str; 3] = ["normal", "medium", "bold"];
}

/// Named colors accepted in addition to hex triplets and `transparent`
pub const NAMED_COLORS: [&str; 9] = [
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple", "gray",
];

/// Check a color against the accepted grammar
///
/// Accepts `#rgb`, `#rrggbb`, `transparent`, or one of [`NAMED_COLORS`].
pub fn is_valid_color(value: &str) -> bool {
    if value == "transparent" || NAMED_COLORS.contains(&value) {
        return true;
    }
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// One positioned visual element of a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique id within the owning document
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Rotation in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Weak back-reference; the parent does not own this node's lifetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Ordered child ids, the authoritative membership of this node's subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl Node {
    /// Create a bare node with the given geometry and no attributes
    pub fn new(id: impl Into<String>, kind: NodeKind, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            x,
            y,
            width: width.max(1),
            height: height.max(1),
            fill: None,
            stroke: None,
            stroke_width: None,
            corner_radius: None,
            text: None,
            font_size: None,
            font_weight: None,
            text_align: None,
            label: None,
            src: None,
            rotation: None,
            parent_id: None,
            children: None,
            alignment: None,
        }
    }

    /// Create a filled rectangle
    pub fn rect(id: impl Into<String>, x: u32, y: u32, width: u32, height: u32, fill: impl Into<String>) -> Self {
        Self {
            fill: Some(fill.into()),
            ..Self::new(id, NodeKind::Rect, x, y, width, height)
        }
    }

    /// Create a text block
    pub fn text(id: impl Into<String>, x: u32, y: u32, width: u32, height: u32, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(id, NodeKind::Text, x, y, width, height)
        }
    }

    /// Create an empty container
    pub fn frame(id: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::new(id, NodeKind::Frame, x, y, width, height)
    }

    /// Child ids, empty when the node has no list
    pub fn child_ids(&self) -> &[String] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Field this node's kind requires that `patch` would set to empty
    pub fn emptied_required_field(&self, patch: &NodePatch) -> Option<&'static str> {
        let (field, patched) = match self.kind {
            NodeKind::Rect | NodeKind::Ellipse => ("fill", &patch.fill),
            NodeKind::Text => ("text", &patch.text),
            NodeKind::Image => ("src", &patch.src),
            NodeKind::Frame => return None,
        };
        patched.as_deref().filter(|value| value.is_empty()).map(|_| field)
    }

    /// Shallow-merge a patch onto this node
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = &patch.$field {
                    self.$field = value.clone();
                })*
            };
        }
        macro_rules! merge_opt {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = &patch.$field {
                    self.$field = Some(value.clone());
                })*
            };
        }
        merge!(x, y, width, height);
        merge_opt!(
            fill,
            stroke,
            stroke_width,
            corner_radius,
            text,
            font_size,
            font_weight,
            text_align,
            label,
            src,
            rotation,
            children,
            alignment,
        );
    }
}

/// Partial node attributes for an `update` operation
///
/// `id`, `type` and `parentId` are not patchable: identity is fixed and
/// parentage moves through `reparent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl NodePatch {
    /// Patch that moves a node to a new position
    pub fn position(x: u32, y: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that replaces a node's children list
    pub fn children(children: Vec<String>) -> Self {
        Self {
            children: Some(children),
            ..Self::default()
        }
    }
}
