//! LP file format emission (SCIP-compatible), for handing an assembled
//! program to an external engine or for diagnostics.

use super::linear::{Ilp, LinearExpr, Sense, VarId};

pub fn emit_lp(ilp: &Ilp) -> String {
    let mut out = String::new();
    out.push_str("Maximize\n obj: ");
    out.push_str(&fmt_lin(ilp, &ilp.objective));
    out.push('\n');
    out.push_str("Subject To\n");
    for c in &ilp.constraints {
        out.push_str(&format!(
            " {}: {} {} {}\n",
            c.name,
            fmt_lin(ilp, &c.expr),
            fmt_sense(c.sense),
            fmt_num(c.rhs)
        ));
    }
    out.push_str("Binary\n");
    for i in 0..ilp.num_vars() {
        out.push_str(&format!(" {}\n", ilp.var_name(VarId(i))));
    }
    out.push_str("End\n");
    out
}

fn fmt_sense(s: Sense) -> &'static str {
    match s {
        Sense::Le => "<=",
        Sense::Ge => ">=",
        Sense::Eq => "=",
    }
}

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.6}", v)
    }
}

fn fmt_lin(ilp: &Ilp, e: &LinearExpr) -> String {
    let mut parts: Vec<String> = vec![];
    for (v, c) in e.terms() {
        let name = ilp.var_name(v);
        if (c - 1.0).abs() < 1e-12 {
            parts.push(format!("+1 {}", name));
        } else if (c + 1.0).abs() < 1e-12 {
            parts.push(format!("-1 {}", name));
        } else {
            parts.push(format!("{:+.6} {}", c, name));
        }
    }
    if parts.is_empty() {
        parts.push("+0".to_string());
    }
    parts.join(" ")
}
