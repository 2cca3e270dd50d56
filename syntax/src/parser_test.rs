#[cfg(test)]
mod tests {
    use crate::kind::NodeKind;
    use crate::parser::parse;
    use crate::tree::{NodeId, SyntaxTree};

    fn tree(source: &str) -> SyntaxTree {
        parse(source, "test.lua")
    }

    fn collect(tree: &SyntaxTree, kind: NodeKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if tree.kind(node) == kind {
                out.push(node);
            }
            stack.extend(tree.child_nodes(node));
        }
        out
    }

    #[test]
    fn test_local_declaration() {
        let t = tree("local a, b = 1, 2");
        assert!(t.diagnostics().is_empty());
        let decls = collect(&t, NodeKind::LocalDeclStmt);
        assert_eq!(decls.len(), 1);
        assert_eq!(collect(&t, NodeKind::NameExpr).len(), 2);
    }

    #[test]
    fn test_assignment_wraps_targets() {
        let t = tree("x, y = y, x");
        assert!(t.diagnostics().is_empty());
        let assigns = collect(&t, NodeKind::AssignStmt);
        assert_eq!(assigns.len(), 1);
        assert_eq!(t.node_text(assigns[0]), "x, y = y, x");
    }

    #[test]
    fn test_call_statement() {
        let t = tree("print('hi')");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::CallStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::CallExpr).len(), 1);
    }

    #[test]
    fn test_method_call_chain() {
        let t = tree("obj.field:method(1)[2].x = 3");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::MethodCallExpr).len(), 1);
        assert_eq!(collect(&t, NodeKind::MemberExpr).len(), 2);
        assert_eq!(collect(&t, NodeKind::IndexExpr).len(), 1);
    }

    #[test]
    fn test_string_and_table_call_sugar() {
        let t = tree("require 'mod'\nsetmetatable {x = 1}");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::CallStmt).len(), 2);
        assert_eq!(collect(&t, NodeKind::TableExpr).len(), 1);
    }

    #[test]
    fn test_binary_precedence() {
        // `1 + 2 * 3` groups as `1 + (2 * 3)`.
        let t = tree("x = 1 + 2 * 3");
        let binaries = collect(&t, NodeKind::BinaryExpr);
        assert_eq!(binaries.len(), 2);
        let texts: Vec<&str> = binaries.iter().map(|&n| t.node_text(n)).collect();
        assert!(texts.contains(&"2 * 3"));
        assert!(texts.contains(&"1 + 2 * 3"));
    }

    #[test]
    fn test_concat_right_associative() {
        let t = tree("x = 'a' .. 'b' .. 'c'");
        let binaries = collect(&t, NodeKind::BinaryExpr);
        let texts: Vec<&str> = binaries.iter().map(|&n| t.node_text(n)).collect();
        assert!(texts.contains(&"'b' .. 'c'"));
    }

    #[test]
    fn test_unary_binds_looser_than_power() {
        // `-a^b` is `-(a^b)`.
        let t = tree("x = -a^b");
        let unary = collect(&t, NodeKind::UnaryExpr);
        assert_eq!(unary.len(), 1);
        assert_eq!(t.node_text(unary[0]), "-a^b");
        let binary = collect(&t, NodeKind::BinaryExpr);
        assert_eq!(t.node_text(binary[0]), "a^b");
    }

    #[test]
    fn test_function_declaration_with_method_name() {
        let t = tree("function obj.sub:go(a, ...) return a end");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::FunctionDeclStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::FunctionName).len(), 1);
        assert_eq!(collect(&t, NodeKind::ParamList).len(), 1);
        assert_eq!(collect(&t, NodeKind::ReturnStmt).len(), 1);
    }

    #[test]
    fn test_numeric_vs_generic_for() {
        let t = tree("for i = 1, 10 do end\nfor k, v in pairs(t) do end");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::NumericForStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::GenericForStmt).len(), 1);
    }

    #[test]
    fn test_if_elseif_else() {
        let t = tree("if a then x() elseif b then y() else z() end");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::IfStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::ElseifClause).len(), 1);
        assert_eq!(collect(&t, NodeKind::ElseClause).len(), 1);
    }

    #[test]
    fn test_goto_and_label() {
        let t = tree("do goto done end\n::done::");
        assert_eq!(collect(&t, NodeKind::GotoStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::LabelStmt).len(), 1);
    }

    #[test]
    fn test_local_attribute() {
        let t = tree("local x <const> = 1");
        assert!(t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::LocalDeclStmt).len(), 1);
    }

    #[test]
    fn test_missing_end_recovers() {
        let t = tree("function f()\nprint(1)");
        assert!(!t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::FunctionDeclStmt).len(), 1);
        assert_eq!(collect(&t, NodeKind::CallStmt).len(), 1);
    }

    #[test]
    fn test_garbage_makes_progress() {
        let t = tree("+ + + local x = 1");
        assert!(!t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::LocalDeclStmt).len(), 1);
    }

    #[test]
    fn test_expression_statement_is_diagnosed() {
        let t = tree("a.b");
        assert!(!t.diagnostics().is_empty());
        assert_eq!(collect(&t, NodeKind::ExprStmt).len(), 1);
    }

    #[test]
    fn test_node_ranges_nest() {
        let t = tree("while x < 10 do x = x + 1 end");
        let whiles = collect(&t, NodeKind::WhileStmt);
        let assigns = collect(&t, NodeKind::AssignStmt);
        assert!(t.range(whiles[0]).contains_range(t.range(assigns[0])));
    }

    #[test]
    fn test_covering_node() {
        let source = "local value = other";
        let t = tree(source);
        let pos = source.find("other").unwrap();
        let covering = t.covering_node(crate::source::TextRange::new(pos, pos + 1));
        assert_eq!(t.kind(covering), NodeKind::NameExpr);
        assert_eq!(t.node_text(covering), "other");
    }
}
