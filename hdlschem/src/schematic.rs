// schematic.rs — Schematic model
//
// The node/edge graph the traversal engine builds and the renderer
// consumes: nodes keyed by unique name, typed by role, with outgoing-edge
// lists; gate trees are attached to combinational nodes as they're
// discovered.
//
// Graph storage is name-keyed (a `Vec<Node>` plus a `name -> index` map)
// rather than nodes holding owned references to each other — that would
// create ownership cycles the moment a feedback path exists.

use std::collections::{HashMap, HashSet};

use crate::gate::Gate;

/// The disjoint roles a node can have (spec §3's role table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A top-module input port.
    Input,
    /// A top-module bidirectional port.
    Inout,
    /// An intermediate named net.
    Wire,
    /// A top-module output port.
    Output,
    /// A storage element driven by a clocked non-blocking update.
    Reg,
    /// An instantiated submodule.
    Block {
        module_name: String,
        clocked: bool,
        inputs_nums: Vec<i64>,
    },
}

/// A directed edge to a consumer, labelled implicitly by the owning
/// node's own name (the driver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub outgoing: Vec<Edge>,
    pub gate: Option<Gate>,
}

impl Node {
    /// Whether a signal reaching this node should be further expanded by
    /// the traversal engine (spec §4.6: "Wire, Reg, Block, Inout").
    pub fn is_input_capable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Wire | NodeKind::Reg | NodeKind::Inout | NodeKind::Block { .. }
        )
    }
}

/// The node/edge graph for one top-module traversal.
#[derive(Debug, Clone)]
pub struct Schematic {
    pub module_name: String,
    /// Primary inputs/inouts of the top module, in declaration order —
    /// the traversal's entry points.
    pub inputs: Vec<String>,
    index: HashMap<String, usize>,
    nodes: Vec<Node>,
    pub visited: HashSet<String>,
}

impl Schematic {
    pub fn new(module_name: impl Into<String>) -> Self {
        Schematic {
            module_name: module_name.into(),
            inputs: Vec::new(),
            index: HashMap::new(),
            nodes: Vec::new(),
            visited: HashSet::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        if let Some(&i) = self.index.get(name) {
            Some(&mut self.nodes[i])
        } else {
            None
        }
    }

    /// Nodes in the order they were first created.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn insert_node(&mut self, name: &str, kind: NodeKind) {
        let idx = self.nodes.len();
        self.index.insert(name.to_string(), idx);
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
            outgoing: Vec::new(),
            gate: None,
        });
    }

    /// Registers a primary input/inout entry point, creating its node if
    /// this is the first mention.
    pub fn add_primary(&mut self, name: &str, kind: NodeKind) {
        if !self.contains(name) {
            self.insert_node(name, kind);
        }
        if !self.inputs.iter().any(|n| n == name) {
            self.inputs.push(name.to_string());
        }
    }

    /// Connects `source` to `dest`, creating `dest`'s node (with `kind`)
    /// if this is its first mention. Returns whether `dest` already
    /// existed — per spec §3, visitation is idempotent: a pre-existing
    /// destination still gets a new incoming edge, but is not recreated.
    pub fn connect(&mut self, source: &str, dest: &str, kind: NodeKind) -> bool {
        let existed = self.contains(dest);
        if !existed {
            self.insert_node(dest, kind);
        }
        if let Some(&src_idx) = self.index.get(source) {
            self.nodes[src_idx].outgoing.push(Edge {
                to: dest.to_string(),
            });
        }
        existed
    }

    /// Attaches a gate tree to an already-created node (wire/output/inout).
    pub fn set_gate(&mut self, name: &str, gate: Gate) {
        if let Some(node) = self.node_mut(name) {
            node.gate = Some(gate);
        }
    }
}

impl std::fmt::Display for Schematic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "module {}", self.module_name)?;
        writeln!(f, "inputs: {}", self.inputs.join(", "))?;
        for node in &self.nodes {
            let role = match &node.kind {
                NodeKind::Input => "input".to_string(),
                NodeKind::Inout => "inout".to_string(),
                NodeKind::Wire => "wire".to_string(),
                NodeKind::Output => "output".to_string(),
                NodeKind::Reg => "reg".to_string(),
                NodeKind::Block {
                    module_name,
                    clocked,
                    ..
                } => format!("block({module_name}, clocked={clocked})"),
            };
            let targets: Vec<&str> = node.outgoing.iter().map(|e| e.to.as_str()).collect();
            writeln!(f, "  {} : {role} -> [{}]", node.name, targets.join(", "))?;
        }
        Ok(())
    }
}
