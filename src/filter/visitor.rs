//! The filter visitor protocol (§4.1.2) and its traversal semantics.
//!
//! Evaluators want post-order (children results feed the parent);
//! printers and cost estimators want pre-order; an optimizer wants to
//! reorder a branch's children before they are visited (e.g. evaluate
//! the most selective child of an `Or` first). One trait expresses all
//! three needs, mirroring the "one trait, default no-op callbacks, one
//! required traversal entry point" shape used throughout the retrieval
//! pack's AST visitors.

use super::Filter;

/// A visitor over a [`Filter`] tree.
///
/// Default implementations visit every node in pre-order without
/// reordering children — override only what you need.
pub trait FilterVisitor {
    /// Whether `visit` should be called for this node at all.
    fn can_visit(&mut self, _node: &Filter) -> bool {
        true
    }

    /// The visitation callback itself.
    fn visit(&mut self, node: &Filter);

    /// Traversal order: `true` for pre-order (visit self, then
    /// children), `false` for post-order (children, then self).
    fn is_prefix(&self) -> bool {
        true
    }

    /// Optional reordering hook invoked for every branch node before
    /// its children are visited. The default is the identity
    /// permutation. Implementations MUST return a permutation of the
    /// input — they may reorder but must not drop or duplicate
    /// entries (§8 invariant 4).
    fn reorder_children<'a>(&mut self, _parent: &Filter, children: Vec<&'a Filter>) -> Vec<&'a Filter> {
        children
    }
}

/// Walks `node` with `visitor`, honoring [`FilterVisitor::is_prefix`],
/// [`FilterVisitor::can_visit`], and [`FilterVisitor::reorder_children`].
pub fn walk<V: FilterVisitor + ?Sized>(node: &Filter, visitor: &mut V) {
    let prefix = visitor.is_prefix();

    if prefix && visitor.can_visit(node) {
        visitor.visit(node);
    }

    match node {
        Filter::And { .. } | Filter::Or { .. } => {
            let children: Vec<&Filter> = node.children().iter().collect();
            let ordered = visitor.reorder_children(node, children);
            for child in ordered {
                walk(child, visitor);
            }
        }
        Filter::Not { child, .. } => walk(child, visitor),
        _ => {}
    }

    if !prefix && visitor.can_visit(node) {
        visitor.visit(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    struct RecordingVisitor {
        prefix: bool,
        seen: Vec<String>,
    }

    impl FilterVisitor for RecordingVisitor {
        fn visit(&mut self, node: &Filter) {
            self.seen.push(node.kind_name().to_string());
        }

        fn is_prefix(&self) -> bool {
            self.prefix
        }
    }

    fn sample_tree() -> Filter {
        Filter::and(vec![
            Filter::equality("cn", "alice").unwrap(),
            Filter::presence("mail").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn prefix_visits_self_before_children() {
        let tree = sample_tree();
        let mut v = RecordingVisitor {
            prefix: true,
            seen: Vec::new(),
        };
        walk(&tree, &mut v);
        assert_eq!(v.seen, vec!["And", "Equality", "Presence"]);
    }

    #[test]
    fn postfix_visits_self_after_children() {
        let tree = sample_tree();
        let mut v = RecordingVisitor {
            prefix: false,
            seen: Vec::new(),
        };
        walk(&tree, &mut v);
        assert_eq!(v.seen, vec!["Equality", "Presence", "And"]);
    }

    #[test]
    fn postorder_visits_exactly_n_plus_one_nodes() {
        let tree = Filter::and(vec![
            Filter::equality("cn", "alice").unwrap(),
            Filter::presence("mail").unwrap(),
            Filter::greater("uidNumber", "1000").unwrap(),
        ])
        .unwrap();
        let mut v = RecordingVisitor {
            prefix: false,
            seen: Vec::new(),
        };
        walk(&tree, &mut v);
        assert_eq!(v.seen.len(), 4); // n=3 children + 1 branch
    }

    #[test]
    fn can_visit_filters_out_nodes() {
        struct SkipPresence {
            seen: Vec<String>,
        }
        impl FilterVisitor for SkipPresence {
            fn can_visit(&mut self, node: &Filter) -> bool {
                !matches!(node, Filter::Presence { .. })
            }
            fn visit(&mut self, node: &Filter) {
                self.seen.push(node.kind_name().to_string());
            }
        }
        let tree = sample_tree();
        let mut v = SkipPresence { seen: Vec::new() };
        walk(&tree, &mut v);
        assert_eq!(v.seen, vec!["And", "Equality"]);
    }

    #[test]
    fn reorder_children_can_reverse_without_dropping() {
        struct Reverse {
            seen: Vec<String>,
        }
        impl FilterVisitor for Reverse {
            fn visit(&mut self, node: &Filter) {
                self.seen.push(node.kind_name().to_string());
            }
            fn reorder_children<'a>(
                &mut self,
                _parent: &Filter,
                mut children: Vec<&'a Filter>,
            ) -> Vec<&'a Filter> {
                children.reverse();
                children
            }
        }
        let tree = sample_tree();
        let mut v = Reverse { seen: Vec::new() };
        walk(&tree, &mut v);
        assert_eq!(v.seen, vec!["And", "Presence", "Equality"]);
    }

    #[test]
    fn not_node_visits_single_child() {
        let tree = Filter::not(Filter::equality("disabled", "true").unwrap());
        let mut v = RecordingVisitor {
            prefix: true,
            seen: Vec::new(),
        };
        walk(&tree, &mut v);
        assert_eq!(v.seen, vec!["Not", "Equality"]);
    }
}
