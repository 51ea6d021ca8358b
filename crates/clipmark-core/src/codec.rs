//! Encoding live ranges into portable selector/offset pairs and back.

use crate::dom::{Document, NodeId};
use crate::range::{Range, RangeError};
use crate::selector::node_selector;
use crate::text::find_text_nodes;
use clipmark_common::SelectionInfo;
use tracing::{debug, warn};

/// Encode a range of `doc`.
///
/// Offsets are taken verbatim from the range's containers; decoding
/// re-anchors them to the first and last text nodes of each element.
/// Returns `None` for a collapsed range or when a boundary has no selector.
pub fn encode_range(doc: &Document, range: &Range) -> Option<SelectionInfo> {
    if range.is_collapsed() {
        return None;
    }
    let start = range.start();
    let end = range.end();

    let Some(start_selector) = node_selector(doc, start.node) else {
        debug!("No selector for range start {:?}", start.node);
        return None;
    };
    let Some(end_selector) = node_selector(doc, end.node) else {
        debug!("No selector for range end {:?}", end.node);
        return None;
    };

    Some(SelectionInfo::new(
        start_selector,
        start.offset,
        end_selector,
        end.offset,
    ))
}

/// Encode the document's current selection, if any.
pub fn encode_selection(doc: &Document) -> Option<SelectionInfo> {
    doc.selection().and_then(|range| encode_range(doc, range))
}

/// Rebuild a range from its encoding and make it the document's selection.
///
/// Any failure (unresolved or malformed selector, out-of-bounds offset)
/// yields `None` and leaves the selection untouched.
pub fn decode_range(doc: &mut Document, info: &SelectionInfo) -> Option<Range> {
    if info.start_selector.is_empty() || info.end_selector.is_empty() {
        return None;
    }

    let (start_el, end_el) = match (
        doc.query_selector(&info.start_selector),
        doc.query_selector(&info.end_selector),
    ) {
        (Ok(Some(start)), Ok(Some(end))) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Selection failed: {}", e);
            return None;
        }
        _ => {
            debug!(
                "Boundary elements not found: '{}' / '{}'",
                info.start_selector, info.end_selector
            );
            return None;
        }
    };

    let start_node = find_text_nodes(doc, start_el).first().unwrap_or(start_el);
    let end_node = find_text_nodes(doc, end_el).last().unwrap_or(end_el);

    match anchor(doc, start_node, info.start_offset, end_node, info.end_offset) {
        Ok(range) => {
            doc.set_selection(range.clone());
            Some(range)
        }
        Err(e) => {
            warn!("Selection failed: {}", e);
            None
        }
    }
}

fn anchor(
    doc: &Document,
    start: NodeId,
    start_offset: u32,
    end: NodeId,
    end_offset: u32,
) -> Result<Range, RangeError> {
    let mut range = Range::collapsed(doc, start, start_offset)?;
    range.set_end(doc, end, end_offset)?;
    Ok(range)
}
