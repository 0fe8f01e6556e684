//! Textual rendering of interleavings.
//!
//! One column per process. Each step is printed in the column of the
//! process that performed it, as the operation name followed by a
//! one-character target label (`'a'` for atomic id 1, `'b'` for id 2,
//! a space when the step has no target). Columns are three tab stops
//! wide.

use std::fmt::Write as _;

use crate::driver::Step;

const COLUMN_WIDTH: usize = 24;

/// Render one interleaving as a column-per-process block.
pub fn format_interleaving(steps: &[Step], num_procs: usize) -> String {
    let mut out = String::new();
    let bar = "-".repeat(num_procs * COLUMN_WIDTH);

    writeln!(out, "{bar}").unwrap();
    let header: String = (0..num_procs).map(|i| format!("P{i}\t\t\t")).collect();
    writeln!(out, "{header}").unwrap();
    writeln!(out, "{bar}").unwrap();

    for step in steps {
        let tabs = "\t\t\t".repeat(step.process.0);
        let label = step.target.map_or(' ', |t| t.label());
        writeln!(out, "{tabs}{} {label}", step.op.name()).unwrap();
    }

    writeln!(out, "{bar}").unwrap();
    out
}

/// Render one interleaving with its `sequence N` heading.
pub fn format_sequence(number: u64, steps: &[Step], num_procs: usize) -> String {
    format!("sequence {number}\n{}", format_interleaving(steps, num_procs))
}
