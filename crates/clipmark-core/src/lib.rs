pub mod codec;
pub mod content;
pub mod convert;
pub mod dom;
pub mod frame;
pub mod highlight;
pub mod range;
pub mod selector;
pub mod tab;
pub mod text;

pub use codec::{decode_range, encode_range, encode_selection};
pub use content::{Capture, ContentScript, ContentSettings};
pub use convert::{ContentFormat, convert, to_html, to_markdown};
pub use dom::{Document, MarkupError, NodeId, NodeKind};
pub use frame::{FrameError, FrameId, FramePosition, Page, accepts, frame_selector};
pub use highlight::{
    HIGHLIGHT_CLASS, HighlightController, HighlightOptions, HighlightState, StaticViewport,
    TEMPORARY_HIGHLIGHT, Viewport,
};
pub use range::{BoundaryPoint, Range, RangeError, find_text};
pub use selector::{SelectorError, SelectorResolver, build_selector, css_escape, node_selector};
pub use tab::{HighlightSettings, Tab};
pub use text::{find_text_nodes, first_text_node, last_text_node};
