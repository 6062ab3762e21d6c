// traversal.rs — Traversal engine
//
// The core of this crate: starting from each primary input/inout of the
// top module, performs depth-first discovery of every dependent signal,
// classifying continuous assignments, register updates, and submodule
// port-bindings, and descending into newly-discovered submodule
// instances to continue the walk from their own output/inout ports.
//
// Two re-architecture points from the design notes land here:
// - `visited` is an explicit field on the schematic (the traversal
//   context), not implicit/global state.
// - Submodule descent is a single forward pass over the slice per node,
//   rather than a cursor that can move backwards in and out of a
//   "descend mode" — see `find_instances` below, which pre-scans a
//   slice's instantiations once instead of hunting for a module-name
//   line relative to a port-binding line.

use std::collections::HashSet;
use std::rc::Rc;

use crate::diag::HdlError;
use crate::gate::build_gate;
use crate::lexer::tokenize_text;
use crate::ports::{declared_names, Keyword};
use crate::schematic::{NodeKind, Schematic};
use crate::slice::module_slice;

/// One submodule instantiation found in a module slice.
#[derive(Debug, Clone)]
struct Instance {
    header_idx: usize,
    end_idx: usize,
    module_name: String,
    instance_name: String,
    /// `(port, signal)` bindings, in source order.
    bindings: Vec<(String, String)>,
    inputs_nums: Vec<i64>,
}

const RESERVED: &[&str] = &[
    "input",
    "output",
    "inout",
    "wire",
    "reg",
    "assign",
    "module",
    "endmodule",
];

/// Builds the schematic for `top_module`, walking from each of its
/// primary inputs/inouts (other than `clk`).
pub fn build_schematic(corpus: &[String], top_module: &str) -> Result<Schematic, HdlError> {
    let mut ctx = TraversalCtx::new(corpus);
    let top_slice = ctx.slice_of(top_module)?;
    let top_inputs = declared_names(&top_slice, Keyword::Input);
    let top_inouts = declared_names(&top_slice, Keyword::Inout);

    let mut schem = Schematic::new(top_module);
    for name in top_inputs.iter() {
        if name != "clk" {
            schem.add_primary(name, NodeKind::Input);
        }
    }
    for name in top_inouts.iter() {
        if name != "clk" {
            schem.add_primary(name, NodeKind::Inout);
        }
    }
    for name in top_inputs.iter().chain(top_inouts.iter()) {
        if name != "clk" {
            walk(&mut ctx, &mut schem, top_module, name)?;
        }
    }
    Ok(schem)
}

struct TraversalCtx<'a> {
    corpus: &'a [String],
    slices: std::collections::HashMap<String, Rc<Vec<String>>>,
    instances: std::collections::HashMap<String, Rc<Vec<Instance>>>,
}

impl<'a> TraversalCtx<'a> {
    fn new(corpus: &'a [String]) -> Self {
        TraversalCtx {
            corpus,
            slices: std::collections::HashMap::new(),
            instances: std::collections::HashMap::new(),
        }
    }

    fn slice_of(&mut self, module_name: &str) -> Result<Rc<Vec<String>>, HdlError> {
        if let Some(s) = self.slices.get(module_name) {
            return Ok(Rc::clone(s));
        }
        let s = Rc::new(module_slice(self.corpus, module_name)?);
        self.slices.insert(module_name.to_string(), Rc::clone(&s));
        Ok(s)
    }

    fn instances_of(&mut self, module_name: &str) -> Result<Rc<Vec<Instance>>, HdlError> {
        if let Some(v) = self.instances.get(module_name) {
            return Ok(Rc::clone(v));
        }
        let slice = self.slice_of(module_name)?;
        let found = Rc::new(find_instances(&slice));
        self.instances
            .insert(module_name.to_string(), Rc::clone(&found));
        Ok(found)
    }
}

/// Statement shapes the traversal engine recognises within a module
/// slice, once a (possibly stitched) line's tokens are classified.
enum Stmt<'t> {
    WireDecl { name: &'t str, tokens: &'t [String] },
    Assign { name: &'t str, tokens: &'t [String] },
    NonBlocking { name: &'t str, tokens: &'t [String] },
    Other,
}

fn classify(tokens: &[String]) -> Stmt<'_> {
    if tokens.len() >= 3 && tokens[0] == "wire" && tokens[2] == "=" {
        return Stmt::WireDecl {
            name: &tokens[1],
            tokens,
        };
    }
    if tokens.len() >= 3 && tokens[0] == "assign" && tokens[2] == "=" {
        return Stmt::Assign {
            name: &tokens[1],
            tokens,
        };
    }
    if tokens.len() >= 3 && tokens[1] == "<" && tokens[2] == "=" {
        return Stmt::NonBlocking {
            name: &tokens[0],
            tokens,
        };
    }
    Stmt::Other
}

/// RHS tokens, with the trailing `;` removed (if present).
fn rhs_tokens(tokens: &[String]) -> &[String] {
    let body = &tokens[3..];
    match body.last() {
        Some(t) if t == ";" => &body[..body.len() - 1],
        _ => body,
    }
}

fn stitch(slice: &[String], i: usize) -> String {
    let mut combined = String::new();
    let mut j = i;
    loop {
        if j >= slice.len() {
            break;
        }
        if !combined.is_empty() {
            combined.push(' ');
        }
        combined.push_str(&slice[j]);
        if slice[j].trim_end().ends_with(';') {
            break;
        }
        j += 1;
    }
    combined
}

fn walk(
    ctx: &mut TraversalCtx,
    schem: &mut Schematic,
    module_name: &str,
    signal_name: &str,
) -> Result<(), HdlError> {
    if signal_name == "clk" {
        return Ok(());
    }
    if schem.visited.contains(signal_name) {
        return Ok(());
    }
    schem.visited.insert(signal_name.to_string());

    let slice = ctx.slice_of(module_name)?;
    let instances = ctx.instances_of(module_name)?;

    let wire_names: HashSet<String> = declared_names(&slice, Keyword::Wire).into_iter().collect();
    let inout_names: HashSet<String> =
        declared_names(&slice, Keyword::Inout).into_iter().collect();
    let output_names: HashSet<String> = declared_names(&slice, Keyword::Output)
        .into_iter()
        .collect();

    let mut i = 0usize;
    while i < slice.len() {
        if let Some(inst) = instances.iter().find(|inst| inst.header_idx == i) {
            handle_instance(
                ctx,
                schem,
                module_name,
                signal_name,
                inst,
                &wire_names,
                &inout_names,
                &output_names,
            )?;
            i = inst.end_idx + 1;
            continue;
        }

        let combined = stitch(&slice, i);
        let tokens = tokenize_text(&combined);
        match classify(&tokens) {
            Stmt::WireDecl { name, tokens } => {
                let rhs = rhs_tokens(tokens);
                if rhs.iter().any(|t| t == signal_name) {
                    schem.connect(signal_name, name, NodeKind::Wire);
                    if tokens.len() > 5 {
                        let gate = build_gate(rhs)?;
                        schem.set_gate(name, gate);
                    }
                    recurse_if_input_capable(ctx, schem, module_name, name)?;
                }
            }
            Stmt::Assign { name, tokens } => {
                let rhs = rhs_tokens(tokens);
                if rhs.iter().any(|t| t == signal_name) {
                    let kind = if wire_names.contains(name) {
                        NodeKind::Wire
                    } else if inout_names.contains(name) {
                        NodeKind::Inout
                    } else if output_names.contains(name) {
                        NodeKind::Output
                    } else {
                        NodeKind::Wire
                    };
                    schem.connect(signal_name, name, kind);
                    if tokens.len() > 5 {
                        let gate = build_gate(rhs)?;
                        schem.set_gate(name, gate);
                    }
                    recurse_if_input_capable(ctx, schem, module_name, name)?;
                }
            }
            Stmt::NonBlocking { name, tokens } => {
                let rhs = rhs_tokens(tokens);
                if rhs.iter().any(|t| t == signal_name) {
                    schem.connect(signal_name, name, NodeKind::Reg);
                    recurse_if_input_capable(ctx, schem, module_name, name)?;
                }
            }
            Stmt::Other => {}
        }
        i += 1;
    }
    Ok(())
}

/// Continues the walk from `signal_name` only if the node just connected
/// is one the spec's §4.6 recursion rule covers (Wire/Reg/Block/Inout) —
/// an Output is a sink, so the walk stops there rather than searching
/// the slice again for a driver that, by construction, does not exist.
fn recurse_if_input_capable(
    ctx: &mut TraversalCtx,
    schem: &mut Schematic,
    module_name: &str,
    signal_name: &str,
) -> Result<(), HdlError> {
    if schem.node(signal_name).is_some_and(|n| n.is_input_capable()) {
        walk(ctx, schem, module_name, signal_name)?;
    }
    Ok(())
}

fn handle_instance(
    ctx: &mut TraversalCtx,
    schem: &mut Schematic,
    module_name: &str,
    signal_name: &str,
    inst: &Instance,
    outer_wires: &HashSet<String>,
    outer_inouts: &HashSet<String>,
    outer_outputs: &HashSet<String>,
) -> Result<(), HdlError> {
    let sub_slice = ctx.slice_of(&inst.module_name)?;
    let sub_inputs: HashSet<String> = declared_names(&sub_slice, Keyword::Input)
        .into_iter()
        .collect();
    let sub_inouts: HashSet<String> = declared_names(&sub_slice, Keyword::Inout)
        .into_iter()
        .collect();
    let sub_outputs: HashSet<String> = declared_names(&sub_slice, Keyword::Output)
        .into_iter()
        .collect();
    let clocked = sub_inputs.contains("clk");

    let mut created = false;
    for (port, sig) in &inst.bindings {
        if port == "clk" || sig != signal_name {
            continue;
        }
        if !(sub_inputs.contains(port) || sub_inouts.contains(port)) {
            // bound only to a non-input port: no edge (spec §3, §4.6).
            continue;
        }
        let existed = schem.connect(
            signal_name,
            &inst.instance_name,
            NodeKind::Block {
                module_name: inst.module_name.clone(),
                clocked,
                inputs_nums: inst.inputs_nums.clone(),
            },
        );
        created = created || !existed;
    }

    // Only the first time this instance is created do we wire its
    // output/inout-bound signals back out of it and continue the walk
    // from each — later hits from a second input signal just add
    // another incoming edge into the already-created instance.
    if created {
        for (port, sig) in &inst.bindings {
            if port == "clk" {
                continue;
            }
            if sub_outputs.contains(port) || sub_inouts.contains(port) {
                let kind = if outer_wires.contains(sig) {
                    NodeKind::Wire
                } else if outer_inouts.contains(sig) {
                    NodeKind::Inout
                } else if outer_outputs.contains(sig) {
                    NodeKind::Output
                } else {
                    NodeKind::Wire
                };
                schem.connect(&inst.instance_name, sig, kind);
                recurse_if_input_capable(ctx, schem, module_name, sig)?;
            }
        }
    }
    Ok(())
}

/// Pre-scans `slice` for every submodule instantiation: a line shaped
/// `ModuleName instanceName(` (two bare identifiers, the second followed
/// by `(`), possibly continuing over further lines until one ends in
/// `);`.
fn find_instances(slice: &[String]) -> Vec<Instance> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < slice.len() {
        if let Some((module_name, instance_name, after)) = parse_header(&slice[i]) {
            let mut combined = after;
            let mut j = i;
            while !balanced_and_terminated(&combined) {
                j += 1;
                if j >= slice.len() {
                    break;
                }
                combined.push(' ');
                combined.push_str(&slice[j]);
            }
            let (bindings, inputs_nums) = parse_args(&combined);
            out.push(Instance {
                header_idx: i,
                end_idx: j,
                module_name,
                instance_name,
                bindings,
                inputs_nums,
            });
            i = j + 1;
        } else {
            i += 1;
        }
    }
    out
}

fn parse_header(line: &str) -> Option<(String, String, String)> {
    let trimmed = line.trim_start();
    let module_end = trimmed.find(char::is_whitespace)?;
    let module_name = &trimmed[..module_end];
    if RESERVED.contains(&module_name) {
        return None;
    }
    let rest = trimmed[module_end..].trim_start();
    let inst_end = rest.find(|c: char| c.is_whitespace() || c == '(')?;
    let instance_name = &rest[..inst_end];
    if instance_name.is_empty() || RESERVED.contains(&instance_name) {
        return None;
    }
    let after = &rest[inst_end..];
    let paren_idx = after.find('(')?;
    Some((
        module_name.to_string(),
        instance_name.to_string(),
        after[paren_idx..].to_string(),
    ))
}

fn balanced_and_terminated(s: &str) -> bool {
    let trimmed = s.trim_end();
    if !trimmed.ends_with(';') {
        return false;
    }
    let body = &trimmed[..trimmed.len() - 1];
    let mut depth = 0i32;
    for c in body.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

fn parse_args(combined: &str) -> (Vec<(String, String)>, Vec<i64>) {
    let trimmed = combined.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    let inner = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let mut bindings = Vec::new();
    let mut nums = Vec::new();
    for arg in split_top_level_commas(inner) {
        let arg = arg.trim();
        if arg.is_empty() {
            continue;
        }
        if let Some(rest) = arg.strip_prefix('.') {
            if let Some(open) = rest.find('(') {
                if rest.ends_with(')') {
                    let port = &rest[..open];
                    let sig = &rest[open + 1..rest.len() - 1];
                    bindings.push((port.to_string(), sig.trim().to_string()));
                    continue;
                }
            }
        }
        if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = arg.parse::<i64>() {
                nums.push(n);
            }
        }
    }
    (bindings, nums)
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut buf = String::new();
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                buf.push(c);
            }
            ')' => {
                depth -= 1;
                buf.push(c);
            }
            ',' if depth == 0 => {
                out.push(buf.clone());
                buf.clear();
            }
            _ => buf.push(c),
        }
    }
    if !buf.trim().is_empty() {
        out.push(buf);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn scenario_1_pass_through() {
        let corpus = lines(&[
            "module top(input a, output y);",
            "assign y = a;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        assert_eq!(schem.inputs, vec!["a"]);
        let y = schem.node("y").unwrap();
        assert_eq!(y.kind, NodeKind::Output);
        assert!(y.gate.is_none());
        assert_eq!(schem.node("a").unwrap().outgoing.len(), 1);
        assert_eq!(schem.node("a").unwrap().outgoing[0].to, "y");
    }

    #[test]
    fn scenario_2_and_gate() {
        let corpus = lines(&[
            "module top(input a, input b, output y);",
            "assign y = a & b;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        let y = schem.node("y").unwrap();
        assert_eq!(
            y.gate,
            Some(Gate::Multi {
                op: '&',
                operands: vec![Gate::Signal("a".into()), Gate::Signal("b".into())],
            })
        );
    }

    #[test]
    fn scenario_3_negated_or() {
        let corpus = lines(&[
            "module top(input a, input b, output y);",
            "assign y = ~(a | b);",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        let y = schem.node("y").unwrap();
        assert_eq!(
            y.gate,
            Some(Gate::Not(Box::new(Gate::Multi {
                op: '|',
                operands: vec![Gate::Signal("a".into()), Gate::Signal("b".into())],
            })))
        );
    }

    #[test]
    fn scenario_4_tri_state() {
        let corpus = lines(&[
            "module top(input en, input d, output bus);",
            "assign bus = en ? d : 1'bz;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        let bus = schem.node("bus").unwrap();
        assert_eq!(
            bus.gate,
            Some(Gate::Tsb {
                input: Box::new(Gate::Signal("d".into())),
                enable: Box::new(Gate::Signal("en".into())),
            })
        );
    }

    #[test]
    fn scenario_5_submodule() {
        let corpus = lines(&[
            "module sub(input in, output out);",
            "assign out = in;",
            "endmodule",
            "module top(input a, output y);",
            "sub u1(.in(a), .out(y));",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        let u1 = schem.node("u1").unwrap();
        match &u1.kind {
            NodeKind::Block {
                module_name,
                clocked,
                ..
            } => {
                assert_eq!(module_name, "sub");
                assert!(!clocked);
            }
            other => panic!("expected Block, got {other:?}"),
        }
        assert!(schem.node("a").unwrap().outgoing.iter().any(|e| e.to == "u1"));
        assert!(schem.contains("y"));
    }

    #[test]
    fn scenario_6_clocked_block_detection() {
        let corpus = lines(&[
            "module sub(input clk, input d, output q);",
            "reg q;",
            "q <= d;",
            "endmodule",
            "module top(input a, output y);",
            "sub u1(.clk(a), .d(a), .q(y));",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        // `a` feeds u1's `d` port, not `clk`; the binding to `clk` itself
        // produces no edge since clk is never a traversal source, but
        // u1 is still marked clocked because sub declares `input clk`.
        let u1 = schem.node("u1").unwrap();
        match &u1.kind {
            NodeKind::Block { clocked, .. } => assert!(clocked),
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn scenario_7_parse_rejection() {
        let corpus = lines(&[
            "module top(input a, input b, input c, output y);",
            "assign y = a & b | c;",
            "endmodule",
        ]);
        let err = build_schematic(&corpus, "top").unwrap_err();
        assert!(matches!(err, HdlError::Parse { .. }));
    }

    #[test]
    fn output_bound_only_to_submodule_output_produces_no_inbound_edge() {
        let corpus = lines(&[
            "module sub(input in, output out);",
            "assign out = in;",
            "endmodule",
            "module top(input a, output y);",
            "sub u1(.in(a), .out(y));",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        // y is bound to sub's `out` port; `y` itself is never the
        // signal argument to an *input* port, so nothing should produce
        // an edge terminating in u1 other than through `a`.
        assert!(!schem
            .node("y")
            .map(|n| n.outgoing.iter().any(|e| e.to == "u1"))
            .unwrap_or(false));
    }

    #[test]
    fn single_identifier_assign_has_no_gate() {
        let corpus = lines(&[
            "module top(input a, output y);",
            "assign y = a;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        assert!(schem.node("y").unwrap().gate.is_none());
    }

    #[test]
    fn clk_input_is_not_a_traversal_source() {
        let corpus = lines(&[
            "module top(input clk, input a, output y);",
            "reg y;",
            "y <= a;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        assert!(!schem.inputs.contains(&"clk".to_string()));
        assert!(!schem.visited.contains("clk"));
    }

    #[test]
    fn wire_declaration_with_initializer_chains_into_consumer() {
        let corpus = lines(&[
            "module top(input a, input b, output y);",
            "wire w = a & b;",
            "assign y = w;",
            "endmodule",
        ]);
        let schem = build_schematic(&corpus, "top").unwrap();
        let w = schem.node("w").unwrap();
        assert_eq!(w.kind, NodeKind::Wire);
        assert!(w.gate.is_some());
        assert!(w.outgoing.iter().any(|e| e.to == "y"));
    }
}
