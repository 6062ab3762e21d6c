// dot.rs — Graphviz DOT output
//
// Transforms a Schematic into DOT format suitable for rendering with
// `dot`, `neato`, or other Graphviz layout engines.
//
// Every node in the schematic gets a uniform drawable at its sanitized
// name, whether or not it carries a gate: this avoids the fragile
// alternative of eliding ungated wires and re-routing edges across
// them. A gated node additionally grows an internal tree of auxiliary
// gate boxes (one per `Gate` tree node) that feed into that same
// outer id, so the rest of the graph only ever needs to reference a
// signal's own name.
//
// Preconditions: `schematic` was built by the traversal engine.
// Postconditions: returns a valid DOT string representing the graph.
// Failure modes: none (pure string formatting).
// Side effects: none.

use std::collections::HashMap;
use std::fmt::Write;

use crate::gate::Gate;
use crate::schematic::{NodeKind, Schematic};

/// Emit the schematic as a Graphviz DOT string.
pub fn emit_dot(schematic: &Schematic) -> String {
    let mut buf = String::new();
    let sanitized_module = sanitize(&schematic.module_name);
    writeln!(buf, "digraph {sanitized_module} {{").unwrap();
    writeln!(buf, "    rankdir=LR;").unwrap();
    writeln!(buf, "    node [fontname=\"Helvetica\", fontsize=10];").unwrap();
    writeln!(buf, "    edge [fontname=\"Helvetica\", fontsize=9];").unwrap();

    let mut aux_counter = 0u32;

    for node in schematic.nodes() {
        let id = sanitize(&node.name);
        let attrs = node_attrs(&node.name, &node.kind);
        writeln!(buf).unwrap();
        writeln!(buf, "    {id} [{attrs}];").unwrap();
        if let Some(gate) = &node.gate {
            emit_gate_tree(&mut buf, &id, gate, &mut aux_counter);
        }
    }

    writeln!(buf).unwrap();
    let fanout = fanout_counts(schematic);
    let mut junction_counter = 0u32;
    for node in schematic.nodes() {
        let src = sanitize(&node.name);
        if fanout.get(node.name.as_str()).copied().unwrap_or(0) > 1 {
            let junction = format!("{src}_j{junction_counter}");
            junction_counter += 1;
            writeln!(
                buf,
                "    {junction} [shape=point, width=0.05, label=\"\"];"
            )
            .unwrap();
            writeln!(buf, "    {src} -> {junction} [arrowhead=none];").unwrap();
            for edge in &node.outgoing {
                let tgt = sanitize(&edge.to);
                writeln!(buf, "    {junction} -> {tgt};").unwrap();
            }
        } else {
            for edge in &node.outgoing {
                let tgt = sanitize(&edge.to);
                writeln!(buf, "    {src} -> {tgt};").unwrap();
            }
        }
    }

    writeln!(buf, "}}").unwrap();
    buf
}

fn fanout_counts(schematic: &Schematic) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for node in schematic.nodes() {
        counts.insert(node.name.as_str(), node.outgoing.len());
    }
    counts
}

/// Sanitize a name to valid DOT identifier characters.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn node_attrs(name: &str, kind: &NodeKind) -> String {
    let (shape, color, label) = match kind {
        NodeKind::Input => ("invhouse", "lightgreen", name.to_string()),
        NodeKind::Inout => ("diamond", "lightyellow", name.to_string()),
        NodeKind::Wire => ("ellipse", "white", name.to_string()),
        NodeKind::Output => ("house", "lightpink", name.to_string()),
        NodeKind::Reg => ("box", "lightblue", format!("{name}\\n[reg]")),
        NodeKind::Block {
            module_name,
            clocked,
            ..
        } => (
            "box3d",
            "lightsalmon",
            if *clocked {
                format!("{name}\\n({module_name}, clk)")
            } else {
                format!("{name}\\n({module_name})")
            },
        ),
    };
    format!("shape={shape}, style=filled, fillcolor={color}, label=\"{label}\"")
}

/// Recursively draws the auxiliary gate-tree boxes for `gate`, wiring
/// its root into `outer_id`, and returns nothing — the tree is only
/// ever referenced from its parent by construction order.
fn emit_gate_tree(buf: &mut String, outer_id: &str, gate: &Gate, counter: &mut u32) {
    match gate {
        Gate::Signal(name) => {
            let src = sanitize(name);
            writeln!(buf, "    {src} -> {outer_id};").unwrap();
        }
        Gate::Not(inner) => {
            let id = next_aux_id(outer_id, counter);
            writeln!(buf, "    {id} [shape=invtriangle, style=filled, fillcolor=gray90, label=\"NOT\"];").unwrap();
            writeln!(buf, "    {id} -> {outer_id};").unwrap();
            emit_gate_tree(buf, &id, inner, counter);
        }
        Gate::Multi { op, operands } => {
            let id = next_aux_id(outer_id, counter);
            let label = gate_label(*op);
            writeln!(
                buf,
                "    {id} [shape=invtrapezium, style=filled, fillcolor=gray90, label=\"{label}\"];"
            )
            .unwrap();
            writeln!(buf, "    {id} -> {outer_id};").unwrap();
            for operand in operands {
                emit_gate_tree(buf, &id, operand, counter);
            }
        }
        Gate::Tsb { input, enable } => {
            let id = next_aux_id(outer_id, counter);
            writeln!(
                buf,
                "    {id} [shape=trapezium, style=filled, fillcolor=gray90, label=\"TSB\"];"
            )
            .unwrap();
            writeln!(buf, "    {id} -> {outer_id};").unwrap();
            emit_gate_tree(buf, &id, enable, counter);
            emit_gate_tree(buf, &id, input, counter);
        }
    }
}

fn next_aux_id(outer_id: &str, counter: &mut u32) -> String {
    let id = format!("{outer_id}_g{counter}");
    *counter += 1;
    id
}

fn gate_label(op: char) -> &'static str {
    match op {
        '&' => "AND",
        '|' => "OR",
        '+' => "ADD",
        '-' => "SUB",
        '*' => "MUL",
        '=' => "EQ",
        '.' => "CONCAT",
        _ => "GATE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::build_schematic;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    fn build(corpus: &[&str], top: &str) -> Schematic {
        build_schematic(&lines(corpus), top).unwrap()
    }

    #[test]
    fn valid_dot_structure() {
        let schem = build(
            &["module top(input a, output y);", "assign y = a;", "endmodule"],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.starts_with("digraph top {"));
        assert!(dot.trim_end().ends_with('}'));
        assert!(dot.contains("rankdir=LR;"));
    }

    #[test]
    fn every_node_gets_a_uniform_drawable() {
        let schem = build(
            &[
                "module top(input a, input b, output y);",
                "assign y = a & b;",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("a [shape=invhouse"));
        assert!(dot.contains("b [shape=invhouse"));
        assert!(dot.contains("y [shape=house"));
    }

    #[test]
    fn gate_tree_draws_auxiliary_and_box() {
        let schem = build(
            &[
                "module top(input a, input b, output y);",
                "assign y = a & b;",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("label=\"AND\""));
        assert!(dot.contains("-> y;"));
    }

    #[test]
    fn negated_or_gate_draws_both_auxiliary_boxes() {
        let schem = build(
            &[
                "module top(input a, input b, output y);",
                "assign y = ~(a | b);",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("label=\"NOT\""));
        assert!(dot.contains("label=\"OR\""));
    }

    #[test]
    fn tsb_draws_a_single_trapezium_with_both_operands() {
        let schem = build(
            &[
                "module top(input en, input d, output bus);",
                "assign bus = en ? d : 1'bz;",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("label=\"TSB\""));
    }

    #[test]
    fn block_node_is_labelled_with_submodule_name() {
        let schem = build(
            &[
                "module sub(input in, output out);",
                "assign out = in;",
                "endmodule",
                "module top(input a, output y);",
                "sub u1(.in(a), .out(y));",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("shape=box3d"));
        assert!(dot.contains("(sub)"));
    }

    #[test]
    fn fan_out_node_gets_a_junction() {
        let schem = build(
            &[
                "module top(input a, output y, output z);",
                "assign y = a;",
                "assign z = a;",
                "endmodule",
            ],
            "top",
        );
        let dot = emit_dot(&schem);
        assert!(dot.contains("shape=point"));
    }

    #[test]
    fn deterministic_output() {
        let corpus = [
            "module top(input a, input b, output y);",
            "assign y = a & b;",
            "endmodule",
        ];
        let dot1 = emit_dot(&build(&corpus, "top"));
        let dot2 = emit_dot(&build(&corpus, "top"));
        assert_eq!(dot1, dot2, "DOT output is not deterministic");
    }
}
