use super::base::NodeIndex;
use super::node::{HashKey, Node, NodeKind, Pattern, StringPart};

/// Flat storage for the nodes of one file.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, kind: NodeKind, pos: u32, end: u32) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { kind, pos, end });
        index
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get(index.0 as usize)
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.get(index).map(|node| &node.kind)
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get_mut(index.0 as usize)
    }

    pub fn span(&self, index: NodeIndex) -> (u32, u32) {
        self.get(index).map_or((0, 0), |node| (node.pos, node.end))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i as u32), node))
    }

    /// Visit the direct child nodes of `index` in source order.
    ///
    /// Parameter defaults, pattern sub-expressions and interpolated string
    /// parts count as children; type annotations are not nodes.
    pub fn for_each_child(&self, index: NodeIndex, f: &mut impl FnMut(NodeIndex)) {
        let Some(kind) = self.kind(index) else {
            return;
        };
        let mut visit = |child: NodeIndex| {
            if child.is_some() {
                f(child);
            }
        };
        match kind {
            NodeKind::SourceFile { statements } | NodeKind::Paren { statements } => {
                statements.iter().copied().for_each(&mut visit)
            }
            NodeKind::Interface { members: body, .. }
            | NodeKind::Class { body, .. }
            | NodeKind::Module { body, .. } => body.iter().copied().for_each(&mut visit),
            NodeKind::Method(decl) => {
                decl.params.iter().for_each(|p| visit(p.default));
                decl.body.iter().copied().for_each(&mut visit);
            }
            NodeKind::IvarDecl { value, .. } | NodeKind::TypedLocal { value, .. } => visit(*value),
            NodeKind::Assign { target, value } | NodeKind::OpAssign { target, value, .. } => {
                visit(*target);
                visit(*value);
            }
            NodeKind::MultiAssign { targets, value } => {
                targets.iter().copied().for_each(&mut visit);
                visit(*value);
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                visit(*condition);
                then_branch.iter().copied().for_each(&mut visit);
                else_branch.iter().copied().for_each(&mut visit);
            }
            NodeKind::While { condition, body, .. } => {
                visit(*condition);
                body.iter().copied().for_each(&mut visit);
            }
            NodeKind::Case {
                subject,
                whens,
                else_branch,
            } => {
                visit(*subject);
                for clause in whens {
                    clause.values.iter().copied().for_each(&mut visit);
                    clause.body.iter().copied().for_each(&mut visit);
                }
                else_branch.iter().flatten().copied().for_each(&mut visit);
            }
            NodeKind::CaseIn {
                subject,
                clauses,
                else_branch,
            } => {
                visit(*subject);
                for clause in clauses {
                    pattern_children(&clause.pattern, &mut visit);
                    if let Some(guard) = &clause.guard {
                        visit(guard.condition);
                    }
                    clause.body.iter().copied().for_each(&mut visit);
                }
                else_branch.iter().flatten().copied().for_each(&mut visit);
            }
            NodeKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
                ..
            } => {
                body.iter().copied().for_each(&mut visit);
                for rescue in rescues {
                    rescue.classes.iter().copied().for_each(&mut visit);
                    rescue.body.iter().copied().for_each(&mut visit);
                }
                else_branch.iter().flatten().copied().for_each(&mut visit);
                ensure.iter().flatten().copied().for_each(&mut visit);
            }
            NodeKind::Return { value }
            | NodeKind::Break { value }
            | NodeKind::Next { value }
            | NodeKind::BlockPass { value }
            | NodeKind::Splat { value }
            | NodeKind::DoubleSplat { value } => visit(*value),
            NodeKind::Yield { args, .. } | NodeKind::Array { elements: args } => {
                args.iter().copied().for_each(&mut visit)
            }
            NodeKind::Str { parts, .. } => {
                for part in parts {
                    if let StringPart::Code(code) = part {
                        visit(*code);
                    }
                }
            }
            NodeKind::Hash { entries, .. } => {
                for entry in entries {
                    if let HashKey::Expr(key) = &entry.key {
                        visit(*key);
                    }
                    visit(entry.value);
                }
            }
            NodeKind::Range { start, end, .. } => {
                visit(*start);
                visit(*end);
            }
            NodeKind::Constant { scope, .. } => visit(*scope),
            NodeKind::Call(call) => {
                visit(call.receiver);
                call.args.iter().copied().for_each(&mut visit);
                visit(call.block);
            }
            NodeKind::Index { receiver, args } => {
                visit(*receiver);
                args.iter().copied().for_each(&mut visit);
            }
            NodeKind::Super { args, block, .. } => {
                args.iter().copied().for_each(&mut visit);
                visit(*block);
            }
            NodeKind::Block { params, body, .. } | NodeKind::Lambda { params, body, .. } => {
                params.iter().for_each(|p| visit(p.default));
                body.iter().copied().for_each(&mut visit);
            }
            NodeKind::Binary { left, right, .. } => {
                visit(*left);
                visit(*right);
            }
            NodeKind::Unary { operand, .. } => visit(*operand),
            NodeKind::TypeAlias { .. }
            | NodeKind::Attr { .. }
            | NodeKind::VisibilityMarker(_)
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
            | NodeKind::SelfRef
            | NodeKind::Integer { .. }
            | NodeKind::Float { .. }
            | NodeKind::Symbol { .. }
            | NodeKind::Regex
            | NodeKind::Identifier { .. }
            | NodeKind::InstanceVar { .. }
            | NodeKind::ClassVar { .. }
            | NodeKind::GlobalVar { .. }
            | NodeKind::Error => {}
        }
    }

    /// Visit `index` and every node below it, parents first.
    pub fn walk(&self, index: NodeIndex, f: &mut impl FnMut(NodeIndex, &NodeKind)) {
        let Some(kind) = self.kind(index) else {
            return;
        };
        f(index, kind);
        let mut children = Vec::new();
        self.for_each_child(index, &mut |child| children.push(child));
        for child in children {
            self.walk(child, f);
        }
    }
}

fn pattern_children(pattern: &Pattern, visit: &mut impl FnMut(NodeIndex)) {
    match pattern {
        Pattern::Value(node) | Pattern::Pin(node) => visit(*node),
        Pattern::Const { constant, sub } => {
            visit(*constant);
            if let Some(sub) = sub {
                pattern_children(sub, visit);
            }
        }
        Pattern::Bind { .. } => {}
        Pattern::Array { pre, post, .. } => {
            pre.iter().chain(post).for_each(|p| pattern_children(p, visit));
        }
        Pattern::Hash { entries, .. } => {
            for entry in entries {
                if let Some(value) = &entry.value {
                    pattern_children(value, visit);
                }
            }
        }
        Pattern::Alternatives(alternatives) => {
            alternatives.iter().for_each(|p| pattern_children(p, visit));
        }
        Pattern::Capture { pattern, .. } => pattern_children(pattern, visit),
    }
}
