//! @ai:module:intent Def-use data-flow edges for CodeBLEU's semantic component
//! @ai:module:layer domain
//! @ai:module:public_api DataflowEdge, Relation, extract, match_score
//! @ai:module:stateless true

use rustpython_parser::ast;
use rustpython_parser::text_size::TextRange;
use std::collections::{BTreeMap, HashMap, HashSet};

/// @ai:intent How a variable occurrence obtains its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// A read takes the value of the reaching definitions
    ComesFrom,
    /// An assignment target is computed from the names read on its right-hand side
    ComputedFrom,
}

/// @ai:intent Edge with variables renamed `var_N` in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataflowEdge {
    pub variable: String,
    pub relation: Relation,
    pub parents: Vec<String>,
}

/// Occurrence: identifier text and its source offset.
type Occurrence = (String, usize);

/// Reaching definitions per name.
type Definitions = HashMap<String, Vec<usize>>;

#[derive(Debug, Clone)]
struct RawEdge {
    name: String,
    offset: usize,
    relation: Relation,
    parents: Vec<String>,
    parent_offsets: Vec<usize>,
}

fn offset(range: TextRange) -> usize {
    u32::from(range.start()) as usize
}

/// @ai:intent Extract normalized def-use edges from a parsed module
/// @ai:effects pure
pub fn extract(suite: &[ast::Stmt]) -> Vec<DataflowEdge> {
    let mut builder = FlowBuilder::default();
    let mut definitions = Definitions::new();
    builder.suite(suite, &mut definitions);
    normalize(merge(builder.edges))
}

/// @ai:intent Share of reference edges found in the candidate, each candidate edge used once
/// @ai:post 0.0 when the reference has no edges
/// @ai:effects pure
pub fn match_score(reference: &[DataflowEdge], candidate: &[DataflowEdge]) -> f64 {
    if reference.is_empty() {
        tracing::debug!("Reference has no data-flow edges, data-flow match degenerates to 0");
        return 0.0;
    }

    let mut remaining = candidate.to_vec();
    let mut matched = 0;
    for edge in reference {
        if let Some(position) = remaining.iter().position(|c| c == edge) {
            remaining.swap_remove(position);
            matched += 1;
        }
    }

    matched as f64 / reference.len() as f64
}

/// Keeps edges that carry flow, then folds repeated visits of one occurrence together.
fn merge(edges: Vec<RawEdge>) -> Vec<RawEdge> {
    let connected: HashSet<usize> = edges
        .iter()
        .filter(|e| !e.parent_offsets.is_empty())
        .flat_map(|e| std::iter::once(e.offset).chain(e.parent_offsets.iter().copied()))
        .collect();

    let mut by_offset: BTreeMap<usize, RawEdge> = BTreeMap::new();
    for edge in edges.into_iter().filter(|e| connected.contains(&e.offset)) {
        match by_offset.get_mut(&edge.offset) {
            Some(existing) => {
                for parent in edge.parents {
                    if !existing.parents.contains(&parent) {
                        existing.parents.push(parent);
                    }
                }
                for parent_offset in edge.parent_offsets {
                    if !existing.parent_offsets.contains(&parent_offset) {
                        existing.parent_offsets.push(parent_offset);
                    }
                }
            }
            None => {
                by_offset.insert(edge.offset, edge);
            }
        }
    }

    by_offset.into_values().collect()
}

fn normalize(edges: Vec<RawEdge>) -> Vec<DataflowEdge> {
    let mut names: HashMap<String, String> = HashMap::new();
    let mut rename = |name: &str| -> String {
        let next = names.len();
        names
            .entry(name.to_string())
            .or_insert_with(|| format!("var_{next}"))
            .clone()
    };

    edges
        .into_iter()
        .map(|edge| {
            let parents: Vec<String> = edge.parents.iter().map(|p| rename(p)).collect();
            DataflowEdge {
                variable: rename(&edge.name),
                relation: edge.relation,
                parents,
            }
        })
        .collect()
}

fn union(mut left: Definitions, right: Definitions) -> Definitions {
    for (name, offsets) in right {
        let entry = left.entry(name).or_default();
        for offset in offsets {
            if !entry.contains(&offset) {
                entry.push(offset);
            }
        }
        entry.sort_unstable();
    }
    left
}

fn dedup_names(occurrences: &[Occurrence]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in occurrences {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

#[derive(Debug, Default)]
struct FlowBuilder {
    edges: Vec<RawEdge>,
}

impl FlowBuilder {
    /// A read; the first sighting of a name also counts as its definition.
    fn read(&mut self, name: &str, at: usize, definitions: &mut Definitions) {
        let edge = match definitions.get(name) {
            Some(previous) => RawEdge {
                name: name.to_string(),
                offset: at,
                relation: Relation::ComesFrom,
                parents: vec![name.to_string()],
                parent_offsets: previous.clone(),
            },
            None => {
                definitions.insert(name.to_string(), vec![at]);
                RawEdge {
                    name: name.to_string(),
                    offset: at,
                    relation: Relation::ComesFrom,
                    parents: Vec::new(),
                    parent_offsets: Vec::new(),
                }
            }
        };
        self.edges.push(edge);
    }

    fn define(&mut self, name: &str, at: usize, sources: &[Occurrence], definitions: &mut Definitions) {
        self.edges.push(RawEdge {
            name: name.to_string(),
            offset: at,
            relation: Relation::ComputedFrom,
            parents: dedup_names(sources),
            parent_offsets: sources.iter().map(|(_, o)| *o).collect(),
        });
        definitions.insert(name.to_string(), vec![at]);
    }

    /// Names appearing in an expression, without recording any edge.
    fn names_in(expr: &ast::Expr, definitions: &Definitions) -> Vec<Occurrence> {
        let mut scratch = FlowBuilder::default();
        scratch.expr(expr, &mut definitions.clone())
    }

    fn assign_target(&mut self, target: &ast::Expr, sources: &[Occurrence], definitions: &mut Definitions) {
        match target {
            ast::Expr::Name(n) => self.define(n.id.as_str(), offset(n.range), sources, definitions),
            ast::Expr::Tuple(t) => {
                for element in &t.elts {
                    self.assign_target(element, sources, definitions);
                }
            }
            ast::Expr::List(l) => {
                for element in &l.elts {
                    self.assign_target(element, sources, definitions);
                }
            }
            ast::Expr::Starred(s) => self.assign_target(&s.value, sources, definitions),
            other => {
                // x[i] = v and x.y = v: every name in the target is written
                for (name, at) in Self::names_in(other, definitions) {
                    self.define(&name, at, sources, definitions);
                }
            }
        }
    }

    fn assign(&mut self, targets: &[ast::Expr], value: &ast::Expr, definitions: &mut Definitions) {
        if let (Some(target_elts), Some(value_elts)) = (sequence(targets), sequence_of(value)) {
            if target_elts.len() == value_elts.len() {
                // a, b = b, a: every right side is read before any target is written
                let sources: Vec<Vec<Occurrence>> = value_elts
                    .iter()
                    .map(|v| self.expr(v, definitions))
                    .collect();
                for (target, source) in target_elts.iter().zip(&sources) {
                    self.assign_target(target, source, definitions);
                }
                return;
            }
        }

        let sources = self.expr(value, definitions);
        for target in targets {
            self.assign_target(target, &sources, definitions);
        }
    }

    fn parameters(&mut self, args: &ast::Arguments, definitions: &mut Definitions) {
        for arg in args
            .posonlyargs
            .iter()
            .chain(&args.args)
            .chain(&args.kwonlyargs)
        {
            self.read(arg.def.arg.as_str(), offset(arg.def.range), definitions);
        }
        for arg in args.vararg.iter().chain(args.kwarg.iter()) {
            self.read(arg.arg.as_str(), offset(arg.range), definitions);
        }
    }

    fn function(
        &mut self,
        name: &str,
        at: usize,
        args: &ast::Arguments,
        body: &[ast::Stmt],
        definitions: &mut Definitions,
    ) {
        for arg in args
            .posonlyargs
            .iter()
            .chain(&args.args)
            .chain(&args.kwonlyargs)
        {
            if let Some(default) = &arg.default {
                self.expr(default, definitions);
            }
        }
        self.read(name, at, definitions);

        let mut scope = definitions.clone();
        self.parameters(args, &mut scope);
        self.suite(body, &mut scope);
    }

    fn suite(&mut self, body: &[ast::Stmt], definitions: &mut Definitions) {
        for statement in body {
            self.stmt(statement, definitions);
        }
    }

    fn stmt(&mut self, statement: &ast::Stmt, definitions: &mut Definitions) {
        use ast::Stmt::*;
        match statement {
            FunctionDef(f) => self.function(f.name.as_str(), offset(f.range), &f.args, &f.body, definitions),
            AsyncFunctionDef(f) => {
                self.function(f.name.as_str(), offset(f.range), &f.args, &f.body, definitions)
            }
            ClassDef(c) => {
                for base in &c.bases {
                    self.expr(base, definitions);
                }
                self.read(c.name.as_str(), offset(c.range), definitions);
                let mut scope = definitions.clone();
                self.suite(&c.body, &mut scope);
            }
            Return(r) => {
                if let Some(value) = &r.value {
                    self.expr(value, definitions);
                }
            }
            Delete(d) => {
                for target in &d.targets {
                    self.expr(target, definitions);
                }
            }
            Assign(a) => self.assign(&a.targets, &a.value, definitions),
            AugAssign(a) => {
                let sources = self.expr(&a.value, definitions);
                self.assign_target(&a.target, &sources, definitions);
            }
            AnnAssign(a) => {
                if let Some(value) = &a.value {
                    self.assign(std::slice::from_ref(&*a.target), value, definitions);
                }
            }
            For(f) => self.for_loop(&f.target, &f.iter, &f.body, &f.orelse, definitions),
            AsyncFor(f) => self.for_loop(&f.target, &f.iter, &f.body, &f.orelse, definitions),
            While(w) => {
                // twice, so definitions at the end of the body reach reads at its start
                for _ in 0..2 {
                    self.expr(&w.test, definitions);
                    self.suite(&w.body, definitions);
                }
                self.suite(&w.orelse, definitions);
            }
            If(i) => {
                self.expr(&i.test, definitions);
                let mut then_branch = definitions.clone();
                self.suite(&i.body, &mut then_branch);
                let mut else_branch = definitions.clone();
                self.suite(&i.orelse, &mut else_branch);
                *definitions = union(then_branch, else_branch);
            }
            With(w) => self.with(&w.items, &w.body, definitions),
            AsyncWith(w) => self.with(&w.items, &w.body, definitions),
            Match(m) => {
                self.expr(&m.subject, definitions);
                let before = definitions.clone();
                for case in &m.cases {
                    let mut branch = before.clone();
                    if let Some(guard) = &case.guard {
                        self.expr(guard, &mut branch);
                    }
                    self.suite(&case.body, &mut branch);
                    *definitions = union(std::mem::take(definitions), branch);
                }
            }
            Raise(r) => {
                if let Some(exc) = &r.exc {
                    self.expr(exc, definitions);
                }
                if let Some(cause) = &r.cause {
                    self.expr(cause, definitions);
                }
            }
            Try(t) => self.try_block(&t.body, &t.handlers, &t.orelse, &t.finalbody, definitions),
            TryStar(t) => self.try_block(&t.body, &t.handlers, &t.orelse, &t.finalbody, definitions),
            Assert(a) => {
                self.expr(&a.test, definitions);
                if let Some(msg) = &a.msg {
                    self.expr(msg, definitions);
                }
            }
            Expr(e) => {
                self.expr(&e.value, definitions);
            }
            TypeAlias(t) => {
                self.expr(&t.value, definitions);
            }
            Import(_) | ImportFrom(_) | Global(_) | Nonlocal(_) | Pass(_) | Break(_) | Continue(_) => {}
        }
    }

    fn for_loop(
        &mut self,
        target: &ast::Expr,
        iter: &ast::Expr,
        body: &[ast::Stmt],
        orelse: &[ast::Stmt],
        definitions: &mut Definitions,
    ) {
        for _ in 0..2 {
            let sources = self.expr(iter, definitions);
            self.assign_target(target, &sources, definitions);
            self.suite(body, definitions);
        }
        self.suite(orelse, definitions);
    }

    fn with(&mut self, items: &[ast::WithItem], body: &[ast::Stmt], definitions: &mut Definitions) {
        for item in items {
            let sources = self.expr(&item.context_expr, definitions);
            if let Some(vars) = &item.optional_vars {
                self.assign_target(vars, &sources, definitions);
            }
        }
        self.suite(body, definitions);
    }

    fn try_block(
        &mut self,
        body: &[ast::Stmt],
        handlers: &[ast::ExceptHandler],
        orelse: &[ast::Stmt],
        finalbody: &[ast::Stmt],
        definitions: &mut Definitions,
    ) {
        self.suite(body, definitions);
        let after_body = definitions.clone();
        for handler in handlers {
            let ast::ExceptHandler::ExceptHandler(h) = handler;
            let mut branch = after_body.clone();
            if let Some(type_) = &h.type_ {
                self.expr(type_, &mut branch);
            }
            self.suite(&h.body, &mut branch);
            *definitions = union(std::mem::take(definitions), branch);
        }
        self.suite(orelse, definitions);
        self.suite(finalbody, definitions);
    }

    fn comprehension(
        &mut self,
        generators: &[ast::Comprehension],
        elements: &[&ast::Expr],
        definitions: &mut Definitions,
    ) -> Vec<Occurrence> {
        let mut scope = definitions.clone();
        let mut reads = Vec::new();

        for generator in generators {
            let sources = self.expr(&generator.iter, &mut scope);
            self.assign_target(&generator.target, &sources, &mut scope);
            reads.extend(sources);
            for condition in &generator.ifs {
                reads.extend(self.expr(condition, &mut scope));
            }
        }
        for element in elements {
            reads.extend(self.expr(element, &mut scope));
        }

        reads
    }

    fn all(&mut self, items: &[ast::Expr], definitions: &mut Definitions) -> Vec<Occurrence> {
        items
            .iter()
            .flat_map(|item| self.expr(item, definitions))
            .collect()
    }

    /// Records reads and returns every name occurrence in the expression.
    fn expr(&mut self, expr: &ast::Expr, definitions: &mut Definitions) -> Vec<Occurrence> {
        use ast::Expr::*;
        match expr {
            Name(n) => {
                let at = offset(n.range);
                self.read(n.id.as_str(), at, definitions);
                vec![(n.id.to_string(), at)]
            }
            BoolOp(b) => self.all(&b.values, definitions),
            NamedExpr(n) => {
                let sources = self.expr(&n.value, definitions);
                self.assign_target(&n.target, &sources, definitions);
                sources
            }
            BinOp(b) => {
                let mut reads = self.expr(&b.left, definitions);
                reads.extend(self.expr(&b.right, definitions));
                reads
            }
            UnaryOp(u) => self.expr(&u.operand, definitions),
            Lambda(l) => {
                let mut scope = definitions.clone();
                self.parameters(&l.args, &mut scope);
                self.expr(&l.body, &mut scope)
            }
            IfExp(i) => {
                let mut reads = self.expr(&i.body, definitions);
                reads.extend(self.expr(&i.test, definitions));
                reads.extend(self.expr(&i.orelse, definitions));
                reads
            }
            Dict(d) => {
                let mut reads = Vec::new();
                for (key, value) in d.keys.iter().zip(&d.values) {
                    if let Some(key) = key {
                        reads.extend(self.expr(key, definitions));
                    }
                    reads.extend(self.expr(value, definitions));
                }
                reads
            }
            Set(s) => self.all(&s.elts, definitions),
            ListComp(l) => self.comprehension(&l.generators, &[&l.elt], definitions),
            SetComp(s) => self.comprehension(&s.generators, &[&s.elt], definitions),
            DictComp(d) => self.comprehension(&d.generators, &[&d.key, &d.value], definitions),
            GeneratorExp(g) => self.comprehension(&g.generators, &[&g.elt], definitions),
            Await(a) => self.expr(&a.value, definitions),
            Yield(y) => match &y.value {
                Some(value) => self.expr(value, definitions),
                None => Vec::new(),
            },
            YieldFrom(y) => self.expr(&y.value, definitions),
            Compare(c) => {
                let mut reads = self.expr(&c.left, definitions);
                reads.extend(self.all(&c.comparators, definitions));
                reads
            }
            Call(c) => {
                let mut reads = self.expr(&c.func, definitions);
                reads.extend(self.all(&c.args, definitions));
                for keyword in &c.keywords {
                    reads.extend(self.expr(&keyword.value, definitions));
                }
                reads
            }
            FormattedValue(f) => self.expr(&f.value, definitions),
            JoinedStr(j) => self.all(&j.values, definitions),
            Constant(_) => Vec::new(),
            Attribute(a) => self.expr(&a.value, definitions),
            Subscript(s) => {
                let mut reads = self.expr(&s.value, definitions);
                reads.extend(self.expr(&s.slice, definitions));
                reads
            }
            Starred(s) => self.expr(&s.value, definitions),
            List(l) => self.all(&l.elts, definitions),
            Tuple(t) => self.all(&t.elts, definitions),
            Slice(s) => {
                let mut reads = Vec::new();
                for part in [&s.lower, &s.upper, &s.step].into_iter().flatten() {
                    reads.extend(self.expr(part, definitions));
                }
                reads
            }
        }
    }
}

fn sequence(targets: &[ast::Expr]) -> Option<&[ast::Expr]> {
    match targets {
        [single] => sequence_of(single),
        _ => None,
    }
}

fn sequence_of(expr: &ast::Expr) -> Option<&[ast::Expr]> {
    match expr {
        ast::Expr::Tuple(t) => Some(&t.elts),
        ast::Expr::List(l) => Some(&l.elts),
        _ => None,
    }
}
