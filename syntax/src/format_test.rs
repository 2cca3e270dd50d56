#[cfg(test)]
mod tests {
    use crate::format::{normalize, text_changes, TextChange};
    use crate::kind::NodeKind;
    use crate::parser::parse;
    use crate::source::TextRange;
    use crate::tree::{NodeId, SyntaxTree};

    fn fmt(source: &str) -> String {
        let tree = parse(source, "fmt.lua");
        normalize(&tree, tree.root(), "  ", "\n")
    }

    #[test]
    fn test_spacing_normalized() {
        assert_eq!(fmt("local x=1+2"), "local x = 1 + 2\n");
        assert_eq!(fmt("local   x   =   1"), "local x = 1\n");
    }

    #[test]
    fn test_calls_stay_tight() {
        assert_eq!(fmt("print( x ,y )"), "print(x, y)\n");
        assert_eq!(fmt("t [ 1 ] = t . field"), "t[1] = t.field\n");
    }

    #[test]
    fn test_block_indentation() {
        assert_eq!(
            fmt("while x<10 do x=x+1 end"),
            "while x < 10 do\n  x = x + 1\nend\n"
        );
    }

    #[test]
    fn test_if_chain_layout() {
        assert_eq!(
            fmt("if a then x() elseif b then y() else z() end"),
            "if a then\n  x()\nelseif b then\n  y()\nelse\n  z()\nend\n"
        );
    }

    #[test]
    fn test_function_body_indents() {
        assert_eq!(
            fmt("function f(a,b) return a+b end"),
            "function f(a, b)\n  return a + b\nend\n"
        );
    }

    #[test]
    fn test_one_statement_per_line() {
        assert_eq!(fmt("local a = 1 local b = 2"), "local a = 1\nlocal b = 2\n");
    }

    #[test]
    fn test_unary_operators_stick() {
        assert_eq!(fmt("x = -y + #t"), "x = -y + #t\n");
    }

    #[test]
    fn test_comments_survive() {
        let out = fmt("-- keep me\nlocal x = 1");
        assert_eq!(out, "-- keep me\nlocal x = 1\n");
    }

    #[test]
    fn test_statement_normalize_has_no_trailing_newline() {
        let tree = parse("local  x  =  1", "fmt.lua");
        let stmt = find_kind(&tree, NodeKind::LocalDeclStmt);
        assert_eq!(normalize(&tree, stmt, "  ", "\n"), "local x = 1");
    }

    #[test]
    fn test_diff_empty_when_equal() {
        assert!(text_changes("local x = 1", "local x = 1", 0).is_empty());
    }

    #[test]
    fn test_diff_minimal_replacement() {
        let changes = text_changes("a  =  1", "a = 1", 0);
        assert_eq!(
            changes,
            vec![TextChange {
                range: TextRange::new(2, 5),
                text: "=".to_string(),
            }]
        );
    }

    #[test]
    fn test_diff_respects_base_offset() {
        let changes = text_changes("x=1", "x = 1", 10);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].range.start >= 10);
        assert!(changes[0].range.end <= 13);
    }

    fn find_kind(tree: &SyntaxTree, kind: NodeKind) -> NodeId {
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if tree.kind(node) == kind {
                return node;
            }
            stack.extend(tree.child_nodes(node));
        }
        panic!("no {kind:?} in tree");
    }
}
