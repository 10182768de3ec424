//! @ai:module:intent Node-kind syntax trees and subtree matching for CodeBLEU
//! @ai:module:layer domain
//! @ai:module:public_api SyntaxNode, build_tree, match_score
//! @ai:module:stateless true

use rustpython_parser::ast;
use std::collections::HashSet;

/// @ai:intent Parse tree reduced to node kinds; identifiers, literals and operators are dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    fn leaf(kind: &'static str) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    fn new(kind: &'static str, children: Vec<SyntaxNode>) -> Self {
        Self { kind, children }
    }

    /// @ai:intent S-expression of this node, e.g. `(Return (BinOp (Name) (Int)))`
    /// @ai:effects pure
    pub fn sexp(&self) -> String {
        let mut out = Vec::new();
        self.collect(&mut out, false)
    }

    /// @ai:intent S-expressions of the root and every interior node
    /// @ai:effects pure
    pub fn subtrees(&self) -> Vec<String> {
        let mut out = Vec::new();
        let root = self.collect(&mut out, false);
        if self.children.is_empty() {
            out.push(root);
        }
        out
    }

    fn collect(&self, out: &mut Vec<String>, record_leaves: bool) -> String {
        let mut sexp = format!("({}", self.kind);
        for child in &self.children {
            sexp.push(' ');
            sexp.push_str(&child.collect(out, record_leaves));
        }
        sexp.push(')');

        if record_leaves || !self.children.is_empty() {
            out.push(sexp.clone());
        }
        sexp
    }
}

/// @ai:intent Build the kind tree of a parsed module
/// @ai:effects pure
pub fn build_tree(suite: &[ast::Stmt]) -> SyntaxNode {
    SyntaxNode::new("Module", suite.iter().map(stmt).collect())
}

/// @ai:intent Share of reference subtrees that also occur in the candidate
/// @ai:post 0.0 when the candidate did not parse
/// @ai:effects pure
pub fn match_score(reference: &SyntaxNode, candidate: Option<&SyntaxNode>) -> f64 {
    let Some(candidate) = candidate else {
        return 0.0;
    };

    let reference = reference.subtrees();
    let candidate: HashSet<String> = candidate.subtrees().into_iter().collect();

    let matched = reference.iter().filter(|s| candidate.contains(*s)).count();
    matched as f64 / reference.len() as f64
}

fn block(body: &[ast::Stmt]) -> SyntaxNode {
    SyntaxNode::new("Block", body.iter().map(stmt).collect())
}

fn exprs<'a>(items: impl IntoIterator<Item = &'a ast::Expr>) -> Vec<SyntaxNode> {
    items.into_iter().map(expr).collect()
}

fn parameters(args: &ast::Arguments) -> SyntaxNode {
    let mut children = Vec::new();
    for arg in args
        .posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs)
    {
        match &arg.default {
            Some(default) => children.push(SyntaxNode::new("DefaultArg", vec![expr(default)])),
            None => children.push(SyntaxNode::leaf("Arg")),
        }
    }
    if args.vararg.is_some() {
        children.push(SyntaxNode::leaf("VarArg"));
    }
    if args.kwarg.is_some() {
        children.push(SyntaxNode::leaf("KwArg"));
    }
    SyntaxNode::new("Parameters", children)
}

fn function(
    kind: &'static str,
    args: &ast::Arguments,
    body: &[ast::Stmt],
    decorators: &[ast::Expr],
    returns: Option<&ast::Expr>,
) -> SyntaxNode {
    let mut children = exprs(decorators);
    children.push(SyntaxNode::leaf("Identifier"));
    children.push(parameters(args));
    if let Some(returns) = returns {
        children.push(expr(returns));
    }
    children.push(block(body));
    SyntaxNode::new(kind, children)
}

fn loop_node(
    kind: &'static str,
    head: Vec<SyntaxNode>,
    body: &[ast::Stmt],
    orelse: &[ast::Stmt],
) -> SyntaxNode {
    let mut children = head;
    children.push(block(body));
    if !orelse.is_empty() {
        children.push(SyntaxNode::new("Else", vec![block(orelse)]));
    }
    SyntaxNode::new(kind, children)
}

fn with_node(kind: &'static str, items: &[ast::WithItem], body: &[ast::Stmt]) -> SyntaxNode {
    let mut children = Vec::new();
    for item in items {
        let mut item_children = vec![expr(&item.context_expr)];
        if let Some(vars) = &item.optional_vars {
            item_children.push(expr(vars));
        }
        children.push(SyntaxNode::new("WithItem", item_children));
    }
    children.push(block(body));
    SyntaxNode::new(kind, children)
}

fn try_node(
    kind: &'static str,
    body: &[ast::Stmt],
    handlers: &[ast::ExceptHandler],
    orelse: &[ast::Stmt],
    finalbody: &[ast::Stmt],
) -> SyntaxNode {
    let mut children = vec![block(body)];
    for handler in handlers {
        let ast::ExceptHandler::ExceptHandler(h) = handler;
        let mut handler_children = Vec::new();
        if let Some(type_) = &h.type_ {
            handler_children.push(expr(type_));
        }
        handler_children.push(block(&h.body));
        children.push(SyntaxNode::new("ExceptHandler", handler_children));
    }
    if !orelse.is_empty() {
        children.push(SyntaxNode::new("Else", vec![block(orelse)]));
    }
    if !finalbody.is_empty() {
        children.push(SyntaxNode::new("Finally", vec![block(finalbody)]));
    }
    SyntaxNode::new(kind, children)
}

fn stmt(stmt: &ast::Stmt) -> SyntaxNode {
    use ast::Stmt::*;
    match stmt {
        FunctionDef(f) => function(
            "FunctionDef",
            &f.args,
            &f.body,
            &f.decorator_list,
            f.returns.as_deref(),
        ),
        AsyncFunctionDef(f) => function(
            "AsyncFunctionDef",
            &f.args,
            &f.body,
            &f.decorator_list,
            f.returns.as_deref(),
        ),
        ClassDef(c) => {
            let mut children = exprs(&c.decorator_list);
            children.push(SyntaxNode::leaf("Identifier"));
            if !c.bases.is_empty() {
                children.push(SyntaxNode::new("Bases", exprs(&c.bases)));
            }
            children.push(block(&c.body));
            SyntaxNode::new("ClassDef", children)
        }
        Return(r) => SyntaxNode::new("Return", exprs(r.value.as_deref())),
        Delete(d) => SyntaxNode::new("Delete", exprs(&d.targets)),
        Assign(a) => {
            let mut children = exprs(&a.targets);
            children.push(expr(&a.value));
            SyntaxNode::new("Assign", children)
        }
        AugAssign(a) => SyntaxNode::new("AugAssign", vec![expr(&a.target), expr(&a.value)]),
        AnnAssign(a) => {
            let mut children = vec![expr(&a.target), expr(&a.annotation)];
            children.extend(exprs(a.value.as_deref()));
            SyntaxNode::new("AnnAssign", children)
        }
        For(f) => loop_node("For", vec![expr(&f.target), expr(&f.iter)], &f.body, &f.orelse),
        AsyncFor(f) => loop_node(
            "AsyncFor",
            vec![expr(&f.target), expr(&f.iter)],
            &f.body,
            &f.orelse,
        ),
        While(w) => loop_node("While", vec![expr(&w.test)], &w.body, &w.orelse),
        If(i) => loop_node("If", vec![expr(&i.test)], &i.body, &i.orelse),
        With(w) => with_node("With", &w.items, &w.body),
        AsyncWith(w) => with_node("AsyncWith", &w.items, &w.body),
        Match(m) => {
            let mut children = vec![expr(&m.subject)];
            for case in &m.cases {
                let mut case_children = vec![SyntaxNode::leaf("Pattern")];
                case_children.extend(exprs(case.guard.as_deref()));
                case_children.push(block(&case.body));
                children.push(SyntaxNode::new("MatchCase", case_children));
            }
            SyntaxNode::new("Match", children)
        }
        Raise(r) => {
            let mut children = exprs(r.exc.as_deref());
            children.extend(exprs(r.cause.as_deref()));
            SyntaxNode::new("Raise", children)
        }
        Try(t) => try_node("Try", &t.body, &t.handlers, &t.orelse, &t.finalbody),
        TryStar(t) => try_node("TryStar", &t.body, &t.handlers, &t.orelse, &t.finalbody),
        Assert(a) => {
            let mut children = vec![expr(&a.test)];
            children.extend(exprs(a.msg.as_deref()));
            SyntaxNode::new("Assert", children)
        }
        Import(i) => SyntaxNode::new(
            "Import",
            i.names.iter().map(|_| SyntaxNode::leaf("Alias")).collect(),
        ),
        ImportFrom(i) => SyntaxNode::new(
            "ImportFrom",
            i.names.iter().map(|_| SyntaxNode::leaf("Alias")).collect(),
        ),
        Global(_) => SyntaxNode::leaf("Global"),
        Nonlocal(_) => SyntaxNode::leaf("Nonlocal"),
        Expr(e) => SyntaxNode::new("ExprStmt", vec![expr(&e.value)]),
        Pass(_) => SyntaxNode::leaf("Pass"),
        Break(_) => SyntaxNode::leaf("Break"),
        Continue(_) => SyntaxNode::leaf("Continue"),
        TypeAlias(t) => SyntaxNode::new("TypeAlias", vec![expr(&t.name), expr(&t.value)]),
    }
}

fn comprehension(
    kind: &'static str,
    heads: Vec<SyntaxNode>,
    generators: &[ast::Comprehension],
) -> SyntaxNode {
    let mut children = heads;
    for generator in generators {
        let mut clause = vec![expr(&generator.target), expr(&generator.iter)];
        for cond in &generator.ifs {
            clause.push(SyntaxNode::new("IfClause", vec![expr(cond)]));
        }
        children.push(SyntaxNode::new("ForClause", clause));
    }
    SyntaxNode::new(kind, children)
}

fn expr(expr_node: &ast::Expr) -> SyntaxNode {
    use ast::Expr::*;
    match expr_node {
        BoolOp(b) => SyntaxNode::new("BoolOp", exprs(&b.values)),
        NamedExpr(n) => SyntaxNode::new("NamedExpr", vec![expr(&n.target), expr(&n.value)]),
        BinOp(b) => SyntaxNode::new("BinOp", vec![expr(&b.left), expr(&b.right)]),
        UnaryOp(u) => SyntaxNode::new("UnaryOp", vec![expr(&u.operand)]),
        Lambda(l) => SyntaxNode::new("Lambda", vec![parameters(&l.args), expr(&l.body)]),
        IfExp(i) => SyntaxNode::new(
            "IfExp",
            vec![expr(&i.body), expr(&i.test), expr(&i.orelse)],
        ),
        Dict(d) => {
            let children = d
                .keys
                .iter()
                .zip(&d.values)
                .map(|(key, value)| match key {
                    Some(key) => SyntaxNode::new("Pair", vec![expr(key), expr(value)]),
                    None => SyntaxNode::new("DictSplat", vec![expr(value)]),
                })
                .collect();
            SyntaxNode::new("Dict", children)
        }
        Set(s) => SyntaxNode::new("Set", exprs(&s.elts)),
        ListComp(l) => comprehension("ListComp", vec![expr(&l.elt)], &l.generators),
        SetComp(s) => comprehension("SetComp", vec![expr(&s.elt)], &s.generators),
        DictComp(d) => comprehension(
            "DictComp",
            vec![expr(&d.key), expr(&d.value)],
            &d.generators,
        ),
        GeneratorExp(g) => comprehension("GeneratorExp", vec![expr(&g.elt)], &g.generators),
        Await(a) => SyntaxNode::new("Await", vec![expr(&a.value)]),
        Yield(y) => SyntaxNode::new("Yield", exprs(y.value.as_deref())),
        YieldFrom(y) => SyntaxNode::new("YieldFrom", vec![expr(&y.value)]),
        Compare(c) => {
            let mut children = vec![expr(&c.left)];
            children.extend(exprs(&c.comparators));
            SyntaxNode::new("Compare", children)
        }
        Call(c) => {
            let mut arguments = exprs(&c.args);
            for keyword in &c.keywords {
                arguments.push(SyntaxNode::new("Keyword", vec![expr(&keyword.value)]));
            }
            SyntaxNode::new(
                "Call",
                vec![expr(&c.func), SyntaxNode::new("Arguments", arguments)],
            )
        }
        FormattedValue(f) => SyntaxNode::new("FormattedValue", vec![expr(&f.value)]),
        JoinedStr(j) => SyntaxNode::new("JoinedStr", exprs(&j.values)),
        Constant(c) => SyntaxNode::leaf(match &c.value {
            ast::Constant::Int(_) => "Int",
            ast::Constant::Float(_) => "Float",
            ast::Constant::Complex { .. } => "Complex",
            ast::Constant::Str(_) => "Str",
            ast::Constant::Bytes(_) => "Bytes",
            ast::Constant::Bool(_) => "Bool",
            ast::Constant::None => "None",
            ast::Constant::Ellipsis => "Ellipsis",
            _ => "Constant",
        }),
        Attribute(a) => SyntaxNode::new(
            "Attribute",
            vec![expr(&a.value), SyntaxNode::leaf("Identifier")],
        ),
        Subscript(s) => SyntaxNode::new("Subscript", vec![expr(&s.value), expr(&s.slice)]),
        Starred(s) => SyntaxNode::new("Starred", vec![expr(&s.value)]),
        Name(_) => SyntaxNode::leaf("Name"),
        List(l) => SyntaxNode::new("List", exprs(&l.elts)),
        Tuple(t) => SyntaxNode::new("Tuple", exprs(&t.elts)),
        Slice(s) => {
            let mut children = exprs(s.lower.as_deref());
            children.extend(exprs(s.upper.as_deref()));
            children.extend(exprs(s.step.as_deref()));
            SyntaxNode::new("Slice", children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_parser::Parse;

    fn tree(source: &str) -> SyntaxNode {
        build_tree(&ast::Suite::parse(source, "<test>").unwrap())
    }

    #[test]
    fn test_sexp_drops_names_and_operators() {
        let a = tree("def f(x):\n    return x + 1");
        let b = tree("def g(y):\n    return y - 2");
        assert_eq!(a.sexp(), b.sexp());
        assert_eq!(
            a.sexp(),
            "(Module (FunctionDef (Identifier) (Parameters (Arg)) (Block (Return (BinOp (Name) (Int))))))"
        );
    }

    #[test]
    fn test_subtrees_include_root_and_interior_nodes_only() {
        let subtrees = tree("x = 1").subtrees();
        assert_eq!(subtrees, vec!["(Assign (Name) (Int))", "(Module (Assign (Name) (Int)))"]);
    }

    #[test]
    fn test_empty_module_has_one_subtree() {
        assert_eq!(tree("").subtrees(), vec!["(Module)"]);
    }

    #[test]
    fn test_identical_structure_scores_one() {
        let reference = tree("def f(x):\n    while x:\n        x -= 1\n    return x");
        let candidate = tree("def g(a):\n    while a:\n        a -= 2\n    return a");
        assert_eq!(match_score(&reference, Some(&candidate)), 1.0);
    }

    #[test]
    fn test_partial_structure() {
        let reference = tree("def f(x):\n    if x:\n        return 1\n    return 0");
        let candidate = tree("def f(x):\n    return 0");
        let score = match_score(&reference, Some(&candidate));
        assert!(score > 0.0 && score < 1.0, "{score}");
    }

    #[test]
    fn test_missing_candidate_scores_zero() {
        assert_eq!(match_score(&tree("x = 1"), None), 0.0);
    }
}
