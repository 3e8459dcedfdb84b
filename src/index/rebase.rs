//! Offset rebaser
//!
//! After a wrap or unwrap changes a parent's child list, every annotation
//! whose wrappers sit after the edit point (in that parent or below one of
//! its later children) needs its stored paths shifted, and the annotation
//! immediately after the edit may need its start offset adjusted.

use super::types::Annotation;
use crate::document::{DocumentAdapter, NodeKind};
use crate::error::{AnchorError, Result};

/// Parameters of one rebase walk
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rebase {
    /// Path component being shifted (the depth of the edited parent's path)
    pub depth: usize,
    /// Sibling slots added (positive) or removed (negative) by the edit
    pub structural_delta: isize,
    /// Char delta for the start offset of the annotation right after the edit
    pub offset_delta: isize,
    /// First child of the parent to visit
    pub from_child_index: usize,
    /// Apply `offset_delta` at most once, to the first wrapper visited
    pub modify_offset_once: bool,
    /// Descend into element children
    pub recurse_into_plain_children: bool,
}

/// Walk `parent`'s children from `params.from_child_index`, shifting the
/// stored paths of every registered annotation found.
///
/// Returns the smallest annotation id encountered.
pub(crate) fn rebase<D: DocumentAdapter>(
    doc: &D,
    annotations: &mut [Annotation],
    parent: D::Node,
    params: Rebase,
) -> Result<Option<usize>> {
    let mut smallest: Option<usize> = None;
    let mut modify_offset = params.modify_offset_once;

    for child in doc.children(parent).into_iter().skip(params.from_child_index) {
        match doc.kind(child) {
            NodeKind::Wrapper(tag) if tag.is_pending() => {
                modify_offset = false;
            }
            NodeKind::Wrapper(tag) => {
                let annotation = annotations.get_mut(tag.annotation).ok_or_else(|| {
                    AnchorError::InvariantViolation(format!(
                        "wrapper at {} names unknown annotation {}",
                        doc.path_of(child),
                        tag.annotation
                    ))
                })?;
                shift_leaf(annotation, tag.sub_index, &params, modify_offset)?;
                modify_offset = false;
                smallest = min_id(smallest, Some(tag.annotation));
            }
            NodeKind::Element => {
                modify_offset = false;
                if params.recurse_into_plain_children {
                    let nested = rebase(
                        doc,
                        annotations,
                        child,
                        Rebase {
                            offset_delta: 0,
                            from_child_index: 0,
                            modify_offset_once: false,
                            ..params
                        },
                    )?;
                    smallest = min_id(smallest, nested);
                }
            }
            NodeKind::Text => {}
        }
    }

    if params.structural_delta != 0 || params.offset_delta != 0 {
        tracing::trace!(
            depth = params.depth,
            structural_delta = params.structural_delta,
            offset_delta = params.offset_delta,
            from = params.from_child_index,
            smallest = ?smallest,
            "Rebased siblings"
        );
    }
    Ok(smallest)
}

fn shift_leaf(
    annotation: &mut Annotation,
    sub_index: usize,
    params: &Rebase,
    modify_offset: bool,
) -> Result<()> {
    let id = annotation.id;
    let single_leaf = annotation.is_single_leaf();
    let path = annotation.leaf_paths.get_mut(sub_index).ok_or_else(|| {
        AnchorError::InvariantViolation(format!(
            "annotation {} has no leaf {}",
            id, sub_index
        ))
    })?;
    if !path.shift(params.depth, params.structural_delta) {
        return Err(AnchorError::InvariantViolation(format!(
            "cannot shift {} of annotation {} by {} at depth {}",
            path, id, params.structural_delta, params.depth
        )));
    }

    if modify_offset && sub_index == 0 {
        annotation.start_offset = apply(annotation.start_offset, params.offset_delta, id)?;
        if single_leaf {
            annotation.end_offset = apply(annotation.end_offset, params.offset_delta, id)?;
        }
    }
    Ok(())
}

fn apply(offset: usize, delta: isize, id: usize) -> Result<usize> {
    offset.checked_add_signed(delta).ok_or_else(|| {
        AnchorError::InvariantViolation(format!(
            "offset {} of annotation {} cannot move by {}",
            offset, id, delta
        ))
    })
}

fn min_id(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, WrapperTag};
    use crate::path::NodePath;

    fn record(id: usize, start: usize, end: usize, paths: Vec<Vec<usize>>) -> Annotation {
        Annotation {
            id,
            text: String::new(),
            start_offset: start,
            end_offset: end,
            leaf_paths: paths.into_iter().map(NodePath::new).collect(),
        }
    }

    #[test]
    fn test_shifts_following_wrappers_and_first_offset() {
        // <p>abcde<W0>fg</W0>h<em><W1>ij</W1></em></p>
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let leaf = doc.append_text(p, "abcdefgh").unwrap().unwrap();
        doc.wrap(leaf, 5, 7, WrapperTag::new(0, 0)).unwrap();
        let em = doc.append_element(p, "em").unwrap();
        let inner = doc.append_text(em, "ij").unwrap().unwrap();
        doc.wrap(inner, 0, 2, WrapperTag::new(1, 0)).unwrap();

        let mut annotations = vec![
            record(0, 5, 7, vec![vec![0, 1]]),
            record(1, 0, 2, vec![vec![0, 3, 0]]),
        ];

        let smallest = rebase(
            &doc,
            &mut annotations,
            p,
            Rebase {
                depth: 1,
                structural_delta: 2,
                offset_delta: -3,
                from_child_index: 1,
                modify_offset_once: true,
                recurse_into_plain_children: true,
            },
        )
        .unwrap();

        assert_eq!(smallest, Some(0));
        assert_eq!(annotations[0].leaf_paths[0].steps(), &[0, 3]);
        assert_eq!((annotations[0].start_offset, annotations[0].end_offset), (2, 4));
        assert_eq!(annotations[1].leaf_paths[0].steps(), &[0, 5, 0]);
        assert_eq!((annotations[1].start_offset, annotations[1].end_offset), (0, 2));
    }

    #[test]
    fn test_skips_pending_wrappers() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let leaf = doc.append_text(p, "abc").unwrap().unwrap();
        doc.wrap(leaf, 0, 3, WrapperTag::pending(0)).unwrap();

        let mut annotations = Vec::new();
        let smallest = rebase(
            &doc,
            &mut annotations,
            p,
            Rebase {
                depth: 1,
                structural_delta: 1,
                offset_delta: 0,
                from_child_index: 0,
                modify_offset_once: false,
                recurse_into_plain_children: true,
            },
        )
        .unwrap();
        assert_eq!(smallest, None);
    }

    #[test]
    fn test_unknown_annotation_is_an_invariant_violation() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let leaf = doc.append_text(p, "abc").unwrap().unwrap();
        doc.wrap(leaf, 0, 3, WrapperTag::new(4, 0)).unwrap();

        let result = rebase(
            &doc,
            &mut [],
            p,
            Rebase {
                depth: 1,
                structural_delta: 1,
                offset_delta: 0,
                from_child_index: 0,
                modify_offset_once: false,
                recurse_into_plain_children: false,
            },
        );
        assert!(matches!(result, Err(AnchorError::InvariantViolation(_))));
    }
}
