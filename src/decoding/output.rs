//! Decision-record serialization: one tab-separated line per predicate
//! instance.

use super::RoleAssignment;
use crate::Span;

/// Render `<joint-flag> TAB <filled-count> TAB (<role> TAB <span> TAB)*`.
///
/// Null-selecting slots are omitted from the repeated segment and from
/// the count. A single-token span renders as `start`, a longer one as
/// `start:end`.
pub fn decision_line(assignment: &RoleAssignment) -> String {
    let mut line = String::new();
    let mut filled = 0usize;
    for (slot, span) in assignment.roles() {
        if span.is_null() {
            continue;
        }
        filled += 1;
        line.push('\t');
        line.push_str(slot);
        line.push('\t');
        line.push_str(&span_repr(span));
    }
    let flag = if assignment.is_joint() { 1 } else { 0 };
    format!("{}\t{}{}", flag, filled, line)
}

fn span_repr(span: Span) -> String {
    if span.start == span.end {
        format!("{}", span.start)
    } else {
        format!("{}:{}", span.start, span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_repr() {
        assert_eq!(span_repr(Span::new(4, 4)), "4");
        assert_eq!(span_repr(Span::new(4, 7)), "4:7");
    }

    #[test]
    fn test_decision_line_omits_nulls() {
        let mut a = RoleAssignment::default();
        a.insert("Agent".into(), Span::new(2, 2));
        a.insert("Goal".into(), Span::NULL);
        a.insert("Theme".into(), Span::new(4, 6));
        a.mark_joint();
        assert_eq!(decision_line(&a), "1\t2\tAgent\t2\tTheme\t4:6");
    }

    #[test]
    fn test_decision_line_empty() {
        let a = RoleAssignment::default();
        assert_eq!(decision_line(&a), "0\t0");
    }
}
