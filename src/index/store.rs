//! Annotation index
//!
//! Holds the ordered annotation records for one document and keeps their
//! node paths, offsets and wrapper tags consistent with the tree as spans
//! are added and removed.

use std::collections::BTreeSet;

use super::rebase::{rebase, Rebase};
use super::types::{Annotation, Selection};
use crate::config::{AnchorConfig, LeafBoundary};
use crate::document::{DocumentAdapter, NodeKind, WrapOutcome, WrapperTag};
use crate::error::{AnchorError, Result};
use crate::path::{is_after, is_before, NodePath};
use crate::recovery::{self, RecoveredSpan};
use crate::text::{char_len, char_slice, matches_fragments};

/// Ordered, densely numbered annotations over one document
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    annotations: Vec<Annotation>,
    config: AnchorConfig,
}

/// The part of one text leaf covered by a span
#[derive(Debug, Clone, Copy)]
struct Piece<N> {
    node: N,
    start: usize,
    end: usize,
}

/// Wrapped pieces of one parent, in document order
type Groups<N> = Vec<(N, Vec<usize>)>;

impl AnnotationIndex {
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            annotations: Vec::new(),
            config,
        }
    }

    /// Rebuild an index from stored records, checking them against `doc`
    pub fn restore<D: DocumentAdapter>(
        doc: &D,
        annotations: Vec<Annotation>,
        config: AnchorConfig,
    ) -> Result<Self> {
        let index = Self {
            annotations,
            config,
        };
        index.check_invariants(doc)?;
        Ok(index)
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: usize) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Literal texts of all annotations in document order
    pub fn texts(&self) -> Vec<&str> {
        self.annotations.iter().map(|a| a.text.as_str()).collect()
    }

    /// The annotation the node at `path` belongs to, if any
    pub fn annotation_at<D: DocumentAdapter>(
        &self,
        doc: &D,
        path: &NodePath,
    ) -> Result<Option<&Annotation>> {
        let node = doc.resolve(path)?;
        Ok(doc
            .wrapper_ancestor(node)
            .filter(|(_, tag)| !tag.is_pending())
            .and_then(|(_, tag)| self.annotations.get(tag.annotation)))
    }

    /// Register a span of text leaves as a new annotation.
    ///
    /// `start_offset` is a char offset into the first leaf and `end_offset`
    /// an exclusive char offset into the last. The span is validated before
    /// anything is mutated; on success the new annotation's id (its position
    /// in document order) is returned.
    pub fn add<D: DocumentAdapter>(
        &mut self,
        doc: &mut D,
        text: &str,
        anchor_leaves: &[NodePath],
        start_offset: usize,
        end_offset: usize,
    ) -> Result<usize> {
        let pieces = self.plan_span(&*doc, text, anchor_leaves, start_offset, end_offset)?;
        let groups = group_by_parent(&*doc, pieces.iter().map(|p| p.node))?;

        let mut outcomes: Vec<WrapOutcome<D::Node>> = Vec::with_capacity(pieces.len());
        for (sub, piece) in pieces.iter().enumerate() {
            match doc.wrap(piece.node, piece.start, piece.end, WrapperTag::pending(sub)) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    unwind(doc, &outcomes);
                    return Err(err);
                }
            }
        }

        let mut smallest: Option<usize> = None;
        for (parent, members) in &groups {
            let Some(&last) = members.last() else {
                continue;
            };
            let inserted: usize = members.iter().map(|&i| outcomes[i].inserted).sum();
            let seen = rebase(
                &*doc,
                &mut self.annotations,
                *parent,
                Rebase {
                    depth: doc.path_of(*parent).depth(),
                    structural_delta: inserted as isize,
                    offset_delta: -(outcomes[last].consumed as isize),
                    from_child_index: outcomes[last].next_index,
                    modify_offset_once: true,
                    recurse_into_plain_children: true,
                },
            )?;
            smallest = match (smallest, seen) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }

        let leaf_paths: Vec<NodePath> = outcomes.iter().map(|o| doc.path_of(o.wrapper)).collect();
        let first_path = leaf_paths[0].clone();
        let id = smallest.unwrap_or_else(|| {
            self.annotations
                .partition_point(|a| a.first_path().is_some_and(|p| is_before(p, &first_path)))
        });

        let (start, end) = match (pieces.first(), pieces.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (start_offset, end_offset),
        };
        self.annotations.insert(
            id,
            Annotation {
                id,
                text: text.to_string(),
                start_offset: start,
                end_offset: end,
                leaf_paths,
            },
        );
        self.renumber_from(doc, id)?;
        self.verify(&*doc)?;

        tracing::debug!(
            id = id,
            leaves = pieces.len(),
            groups = groups.len(),
            first = %first_path,
            "Added annotation"
        );
        Ok(id)
    }

    /// Register the span between two selection endpoints
    pub fn add_selection<D: DocumentAdapter>(
        &mut self,
        doc: &mut D,
        text: &str,
        selection: &Selection,
    ) -> Result<usize> {
        let start = doc.resolve(&selection.start)?;
        let end = doc.resolve(&selection.end)?;
        let leaves = doc.all_leaves_under(doc.root());

        let position = |node: D::Node| {
            leaves.iter().position(|&leaf| leaf == node).ok_or_else(|| {
                AnchorError::InvalidSpan(format!("{} is not a text leaf", doc.path_of(node)))
            })
        };
        let (from, to) = (position(start)?, position(end)?);
        if from > to {
            return Err(AnchorError::InvalidSpan(format!(
                "selection end {} precedes start {}",
                selection.end, selection.start
            )));
        }

        let paths: Vec<NodePath> = leaves[from..=to].iter().map(|&n| doc.path_of(n)).collect();
        self.add(doc, text, &paths, selection.start_offset, selection.end_offset)
    }

    /// Remove an annotation, restoring its text into the surrounding leaves
    pub fn remove<D: DocumentAdapter>(&mut self, doc: &mut D, id: usize) -> Result<Annotation> {
        let annotation = self
            .annotations
            .get(id)
            .ok_or(AnchorError::UnknownAnnotation(id))?;

        let mut wrappers = Vec::with_capacity(annotation.leaf_paths.len());
        for (sub, path) in annotation.leaf_paths.iter().enumerate() {
            let node = doc.resolve(path)?;
            match doc.kind(node) {
                NodeKind::Wrapper(tag) if tag == WrapperTag::new(id, sub) => wrappers.push(node),
                NodeKind::Wrapper(tag) => {
                    return Err(AnchorError::InvariantViolation(format!(
                        "wrapper at {} carries {:?}, expected annotation {} leaf {}",
                        path, tag, id, sub
                    )))
                }
                NodeKind::Text | NodeKind::Element => {
                    return Err(AnchorError::NotAWrapper(path.clone()))
                }
            }
        }
        let groups = group_by_parent(&*doc, wrappers.iter().copied())?;

        let mut edits = Vec::with_capacity(groups.len());
        for (parent, members) in &groups {
            let mut removed = 0;
            let mut next_index = 0;
            let mut absorbed = 0;
            // Index of the leaf that now ends right before `next_index`
            let mut merged_at: Option<usize> = None;

            for (k, &i) in members.iter().rev().enumerate() {
                let index = doc
                    .index_in_parent(wrappers[i])
                    .ok_or_else(|| AnchorError::DetachedNode(format!("{:?}", wrappers[i])))?;
                let outcome = doc.unwrap(wrappers[i])?;
                removed += outcome.removed;

                let merged_index = outcome.merged.map(|_| outcome.next_index - 1);
                if k == 0 {
                    next_index = outcome.next_index;
                    absorbed = outcome.absorbed;
                    merged_at = merged_index;
                } else {
                    next_index = next_index.saturating_sub(outcome.removed);
                    if outcome.merged_right && merged_at == Some(index + 1) {
                        absorbed += outcome.absorbed;
                        merged_at = merged_index;
                    } else {
                        merged_at = None;
                    }
                }
            }
            edits.push((*parent, removed, absorbed, next_index));
        }

        for (parent, removed, absorbed, next_index) in edits {
            rebase(
                &*doc,
                &mut self.annotations,
                parent,
                Rebase {
                    depth: doc.path_of(parent).depth(),
                    structural_delta: -(removed as isize),
                    offset_delta: absorbed as isize,
                    from_child_index: next_index,
                    modify_offset_once: true,
                    recurse_into_plain_children: true,
                },
            )?;
        }

        let removed = self.annotations.remove(id);
        self.renumber_from(doc, id)?;
        self.verify(&*doc)?;

        tracing::debug!(id = id, leaves = removed.leaf_paths.len(), "Removed annotation");
        Ok(removed)
    }

    /// Locate each target in the document text and register every match.
    ///
    /// Returns `None` when all targets were found, otherwise the original
    /// spellings of those that were not.
    pub fn recover<D, I, S>(&mut self, doc: &mut D, targets: I) -> Result<Option<BTreeSet<String>>>
    where
        D: DocumentAdapter,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = self.config.clone();
        recovery::recover(doc, targets, &config, |doc, span: RecoveredSpan| {
            self.add(
                doc,
                &span.text,
                &span.leaf_paths,
                span.start_offset,
                span.end_offset,
            )
            .map(|_| ())
        })
    }

    /// Verify every structural invariant of the index against `doc`
    pub fn check_invariants<D: DocumentAdapter>(&self, doc: &D) -> Result<()> {
        let mut previous_first: Option<&NodePath> = None;
        let mut expected_wrappers = 0;

        for (position, annotation) in self.annotations.iter().enumerate() {
            if annotation.id != position {
                return violation(format!(
                    "annotation at position {} has id {}",
                    position, annotation.id
                ));
            }
            let Some(first) = annotation.first_path() else {
                return violation(format!("annotation {} has no leaves", position));
            };
            if previous_first.is_some_and(|previous| !is_before(previous, first)) {
                return violation(format!(
                    "annotation {} at {} is out of document order",
                    position, first
                ));
            }
            previous_first = Some(first);

            for (sub, path) in annotation.leaf_paths.iter().enumerate() {
                if sub > 0 && !is_after(path, &annotation.leaf_paths[sub - 1]) {
                    return violation(format!(
                        "leaves of annotation {} are out of order at {}",
                        position, path
                    ));
                }
                let node = match doc.resolve(path) {
                    Ok(node) => node,
                    Err(_) => {
                        return violation(format!(
                            "leaf {} of annotation {} does not resolve",
                            path, position
                        ))
                    }
                };
                match doc.kind(node) {
                    NodeKind::Wrapper(tag) if tag == WrapperTag::new(position, sub) => {}
                    other => {
                        return violation(format!(
                            "leaf {} of annotation {} resolves to {:?}",
                            path, position, other
                        ))
                    }
                }
            }
            expected_wrappers += annotation.leaf_paths.len();
        }

        let found = count_wrappers(doc)?;
        if found != expected_wrappers {
            return violation(format!(
                "document holds {} wrappers, index expects {}",
                found, expected_wrappers
            ));
        }
        Ok(())
    }

    fn verify<D: DocumentAdapter>(&self, doc: &D) -> Result<()> {
        if cfg!(debug_assertions) || self.config.verify_invariants {
            self.check_invariants(doc)?;
        }
        Ok(())
    }

    /// Reassign ids from `from` on and retag their wrappers to match
    fn renumber_from<D: DocumentAdapter>(&mut self, doc: &mut D, from: usize) -> Result<()> {
        for (position, annotation) in self.annotations.iter_mut().enumerate().skip(from) {
            annotation.id = position;
            for (sub, path) in annotation.leaf_paths.iter().enumerate() {
                let node = doc.resolve(path)?;
                if !matches!(doc.kind(node), NodeKind::Wrapper(_)) {
                    return Err(AnchorError::NotAWrapper(path.clone()));
                }
                doc.retag(node, WrapperTag::new(position, sub))?;
            }
        }
        Ok(())
    }

    /// Resolve and validate a span without touching the document
    fn plan_span<D: DocumentAdapter>(
        &self,
        doc: &D,
        text: &str,
        anchor_leaves: &[NodePath],
        start_offset: usize,
        end_offset: usize,
    ) -> Result<Vec<Piece<D::Node>>> {
        if anchor_leaves.is_empty() {
            return Err(AnchorError::InvalidSpan("no anchor leaves".to_string()));
        }

        let last = anchor_leaves.len() - 1;
        let mut pieces = Vec::with_capacity(anchor_leaves.len());
        for (i, path) in anchor_leaves.iter().enumerate() {
            let node = doc.resolve(path)?;
            if doc.wrapper_ancestor(node).is_some() {
                return Err(AnchorError::Overlap(path.clone()));
            }
            let Some(leaf_text) = doc.text(node) else {
                return Err(AnchorError::InvalidSpan(format!("{} is not a text leaf", path)));
            };
            let len = char_len(leaf_text);
            let start = if i == 0 { start_offset } else { 0 };
            let end = if i == last { end_offset } else { len };
            if start > len || end > len {
                return Err(AnchorError::InvalidSpan(format!(
                    "offsets {}..{} out of range for {} ({} chars)",
                    start, end, path, len
                )));
            }
            pieces.push(Piece { node, start, end });
        }

        if pieces.len() > 1 && pieces[0].start == pieces[0].end {
            pieces.remove(0);
        }
        if pieces.len() > 1 && pieces[pieces.len() - 1].end == 0 {
            pieces.pop();
        }
        if let Some(piece) = pieces.iter().find(|p| p.start >= p.end) {
            return Err(AnchorError::InvalidSpan(format!(
                "empty span in {}",
                doc.path_of(piece.node)
            )));
        }

        let order = doc.all_leaves_under(doc.root());
        let base = order
            .iter()
            .position(|&leaf| leaf == pieces[0].node)
            .ok_or_else(|| {
                AnchorError::InvalidSpan(format!("{} is not reachable", doc.path_of(pieces[0].node)))
            })?;
        for (i, piece) in pieces.iter().enumerate() {
            match order.get(base + i) {
                Some(&leaf) if leaf == piece.node => {}
                Some(&gap) if doc.enclosing_wrapper(gap).is_some() => {
                    return Err(AnchorError::Overlap(doc.path_of(gap)));
                }
                _ => {
                    return Err(AnchorError::InvalidSpan(format!(
                        "{} does not follow the previous leaf",
                        doc.path_of(piece.node)
                    )));
                }
            }
        }

        let fragments: Vec<&str> = pieces
            .iter()
            .map(|p| char_slice(doc.text(p.node).unwrap_or_default(), p.start, p.end))
            .collect();
        let boundary_space = self.config.leaf_boundary == LeafBoundary::Space;
        if !matches_fragments(&fragments, text, boundary_space) {
            let found = fragments.concat();
            tracing::warn!(expected = %text, found = %found, "Span text mismatch");
            return Err(AnchorError::SpanMismatch {
                expected: text.to_string(),
                found,
            });
        }

        Ok(pieces)
    }
}

/// Group nodes by parent, parents in order of first appearance
fn group_by_parent<D: DocumentAdapter>(
    doc: &D,
    nodes: impl Iterator<Item = D::Node>,
) -> Result<Groups<D::Node>> {
    let mut groups: Groups<D::Node> = Vec::new();
    for (i, node) in nodes.enumerate() {
        let parent = doc
            .parent(node)
            .ok_or_else(|| AnchorError::DetachedNode(format!("{:?}", node)))?;
        match groups.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, members)) => members.push(i),
            None => groups.push((parent, vec![i])),
        }
    }
    Ok(groups)
}

/// Undo the wraps of a failed add, newest first
fn unwind<D: DocumentAdapter>(doc: &mut D, outcomes: &[WrapOutcome<D::Node>]) {
    for outcome in outcomes.iter().rev() {
        if let Err(err) = doc.unwrap(outcome.wrapper) {
            tracing::error!(error = %err, "Failed to unwind wrapper");
        }
    }
}

fn count_wrappers<D: DocumentAdapter>(doc: &D) -> Result<usize> {
    let mut count = 0;
    let mut stack = vec![doc.root()];
    while let Some(node) = stack.pop() {
        if let NodeKind::Wrapper(_) = doc.kind(node) {
            if let Some(outer) = doc.parent(node).and_then(|p| doc.wrapper_ancestor(p)) {
                return violation(format!(
                    "wrapper at {} is nested in {}",
                    doc.path_of(node),
                    doc.path_of(outer.0)
                ));
            }
            count += 1;
        }
        stack.extend(doc.children(node));
    }
    Ok(count)
}

fn violation<T>(message: String) -> Result<T> {
    tracing::error!(message = %message, "Annotation index invariant violated");
    Err(AnchorError::InvariantViolation(message))
}
