//! Code region annotation.
//!
//! Finds known tokens inside rendered code regions and turns them into
//! markers. The algorithm is written against [`CodeDocument`], so the same
//! logic runs on the browser DOM and on the in-memory tree used in tests.
//!
//! # How a region is scanned
//!
//! 1. Regions already carrying the processed flag are skipped.
//! 2. Inline fragments (highlighter spans) whose trimmed text is exactly a
//!    token are tagged in place.
//! 3. Remaining text nodes containing a token are split at match boundaries
//!    and rewritten as text + marker segments. Nodes whose parent text looks
//!    like a comment or string literal are left alone.
//! 4. The region is flagged as processed.

use std::sync::Arc;

use serde::Serialize;

use crate::error::HostError;
use crate::matcher::TokenMatcher;

#[cfg(test)]
pub(crate) mod mock;

/// A piece of a rewritten text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'t> {
    /// Plain text kept verbatim.
    Text(&'t str),
    /// A token occurrence to wrap in a marker.
    Marker(&'t str),
}

/// Host document operations needed by the annotator.
///
/// Implementations own all element creation details (marker tag name,
/// attributes, inline styles); the annotator only decides what to mark.
pub trait CodeDocument {
    type Element: Clone;
    type TextNode: Clone;

    /// Code regions below `root`, in document order.
    fn code_regions(&self, root: &Self::Element) -> Vec<Self::Element>;

    fn is_processed(&self, region: &Self::Element) -> bool;

    fn mark_processed(&mut self, region: &Self::Element) -> Result<(), HostError>;

    /// Inline markup elements inside a region (highlighter spans).
    fn inline_fragments(&self, region: &Self::Element) -> Vec<Self::Element>;

    /// Full text content of an element.
    fn element_text(&self, element: &Self::Element) -> String;

    /// Token carried by an element if it is already a marker.
    fn marker_token(&self, element: &Self::Element) -> Option<String>;

    /// Turn an existing element into a marker for `token`.
    fn tag_marker(&mut self, element: &Self::Element, token: &str) -> Result<(), HostError>;

    /// Text nodes inside a region, in document order.
    fn text_nodes(&self, region: &Self::Element) -> Vec<Self::TextNode>;

    fn text_data(&self, node: &Self::TextNode) -> String;

    fn text_parent(&self, node: &Self::TextNode) -> Option<Self::Element>;

    /// Replace a text node with the given segments, in order.
    fn replace_text(
        &mut self,
        node: &Self::TextNode,
        segments: &[Segment<'_>],
    ) -> Result<(), HostError>;
}

/// Counts from one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub regions_scanned: usize,
    pub regions_skipped: usize,
    /// Existing fragments tagged as markers.
    pub markers_tagged: usize,
    /// New markers created by splitting text.
    pub markers_wrapped: usize,
    pub errors: usize,
}

impl ScanReport {
    pub fn markers(&self) -> usize {
        self.markers_tagged + self.markers_wrapped
    }
}

/// Whether text belongs to a comment or string literal.
///
/// A heuristic on the enclosing element's text: false positives inside
/// comments and strings are worse than a missed token.
pub fn is_excluded_context(parent_text: &str) -> bool {
    let text = parent_text.trim();
    text.starts_with("//")
        || text.starts_with('"')
        || text.starts_with('\'')
        || text.starts_with("r\"")
        || text.starts_with("r#")
}

/// Split `text` at token matches. Concatenating the segments yields `text`.
pub fn plan_segments<'t>(text: &'t str, matcher: &TokenMatcher) -> Vec<Segment<'t>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in matcher.find_iter(text) {
        if m.range.start > last {
            segments.push(Segment::Text(&text[last..m.range.start]));
        }
        segments.push(Segment::Marker(m.token));
        last = m.range.end;
    }

    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }

    segments
}

/// Scans code regions and creates markers.
#[derive(Debug, Clone)]
pub struct Annotator {
    matcher: Arc<TokenMatcher>,
}

impl Annotator {
    pub fn new(matcher: Arc<TokenMatcher>) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &TokenMatcher {
        &self.matcher
    }

    /// Annotate every unprocessed code region below `root`.
    ///
    /// Safe to call repeatedly: processed regions are skipped, new ones are
    /// picked up. Host errors are logged and counted, never propagated.
    pub fn scan<D: CodeDocument>(&self, doc: &mut D, root: &D::Element) -> ScanReport {
        let mut report = ScanReport::default();

        for region in doc.code_regions(root) {
            if doc.is_processed(&region) {
                report.regions_skipped += 1;
                continue;
            }

            // Flag first so a failure part-way through never causes a rewrite loop.
            if let Err(e) = doc.mark_processed(&region) {
                tracing::warn!("failed to flag code region: {}", e);
                report.errors += 1;
                continue;
            }
            report.regions_scanned += 1;

            self.tag_fragments(doc, &region, &mut report);
            self.wrap_text(doc, &region, &mut report);
        }

        if report.regions_scanned > 0 {
            tracing::debug!(
                regions = report.regions_scanned,
                skipped = report.regions_skipped,
                tagged = report.markers_tagged,
                wrapped = report.markers_wrapped,
                errors = report.errors,
                "annotated code regions"
            );
        }

        report
    }

    fn tag_fragments<D: CodeDocument>(
        &self,
        doc: &mut D,
        region: &D::Element,
        report: &mut ScanReport,
    ) {
        for fragment in doc.inline_fragments(region) {
            if doc.marker_token(&fragment).is_some() {
                continue;
            }
            let text = doc.element_text(&fragment);
            let token = text.trim();
            if !self.matcher.is_token(token) {
                continue;
            }
            match doc.tag_marker(&fragment, token) {
                Ok(()) => report.markers_tagged += 1,
                Err(e) => {
                    tracing::warn!(token, "failed to tag marker: {}", e);
                    report.errors += 1;
                }
            }
        }
    }

    fn wrap_text<D: CodeDocument>(&self, doc: &mut D, region: &D::Element, report: &mut ScanReport) {
        let mut pending = Vec::new();

        for node in doc.text_nodes(region) {
            let data = doc.text_data(&node);
            if !self.matcher.is_match(&data) {
                continue;
            }
            if let Some(parent) = doc.text_parent(&node) {
                if is_excluded_context(&doc.element_text(&parent)) {
                    continue;
                }
            }
            pending.push((node, data));
        }

        // Reverse document order keeps earlier nodes valid while later ones are replaced.
        for (node, data) in pending.into_iter().rev() {
            let Some(parent) = doc.text_parent(&node) else {
                continue;
            };
            if doc.marker_token(&parent).is_some() {
                continue;
            }

            let segments = plan_segments(&data, &self.matcher);
            let markers = segments
                .iter()
                .filter(|s| matches!(s, Segment::Marker(_)))
                .count();

            match doc.replace_text(&node, &segments) {
                Ok(()) => report.markers_wrapped += markers,
                Err(e) => {
                    tracing::warn!("failed to wrap tokens in text node: {}", e);
                    report.errors += 1;
                }
            }
        }
    }
}
