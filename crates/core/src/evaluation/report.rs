use std::fmt::Write;

use crate::evaluation::Evaluation;
use crate::model::CLASS_COUNT;

/// Render the human-readable evaluation summary printed by the CLI.
pub fn render_report(eval: &Evaluation) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "==================== EVALUATION SUMMARY ====================");
    let _ = writeln!(out, "Total functions evaluated (overlap subset): {}", eval.total());
    let _ = writeln!(out, "Overall accuracy: {:.2}%", eval.accuracy * 100.0);
    let _ = writeln!(out);
    let _ = writeln!(out, "Per-class metrics (label: 0=Safe, 1-5=attacks):");
    for m in &eval.per_class {
        let _ = writeln!(
            out,
            "  Class {}: TP={}, FP={}, FN={}, Prec={:.3}, Rec={:.3}, F1={:.3}",
            m.class, m.tp, m.fp, m.fn_, m.precision, m.recall, m.f1
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Confusion Matrix (rows=true, cols=pred):");
    let mut header = format!("{:<10}", "true\\pred");
    for p in 0..CLASS_COUNT {
        let _ = write!(header, "{p:>8}");
    }
    let _ = writeln!(out, "{header}");
    for t in 0..CLASS_COUNT as u8 {
        let mut row = format!("{t:<10}");
        for p in 0..CLASS_COUNT as u8 {
            let _ = write!(row, "{:>8}", eval.confusion.get(t, p));
        }
        let _ = writeln!(out, "{row}");
    }

    out
}
