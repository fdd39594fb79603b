// ASCII mountain diagrams of step sequences.
// Each step occupies one column: up-steps draw '/', down-steps draw '\'. The
// row holding y = 0 is filled with '_' so the baseline stays visible.

use rand::seq::IteratorRandom;
use rand::Rng;

use crate::frequency::FrequencyTable;
use crate::sequence::{Sequence, Step};

/// Blank columns on either side of a diagram.
const PADDING: usize = 2;

/// Terminal width the pasted layout aims for.
pub const TERMINAL_WIDTH: usize = 80;

/// Draw `sequence` as a mountain diagram, highest row first.
pub fn graph(sequence: &Sequence) -> String {
    let (high, low) = sequence.hilo_extent();
    let width = sequence.len() + 2 * PADDING;
    let height = (high - low) as usize;
    let baseline = (-low) as usize;

    let mut rows = vec![vec![' '; width]; height];
    let mut row = baseline;
    for (offset, &step) in sequence.steps().iter().enumerate() {
        let column = PADDING + offset;
        match step {
            Step::Up => {
                rows[row][column] = '/';
                row += 1;
            }
            Step::Down => {
                row -= 1;
                rows[row][column] = '\\';
            }
        }
    }

    if baseline == rows.len() {
        rows.push(vec!['_'; width]);
    } else {
        for cell in rows[baseline].iter_mut().filter(|cell| **cell == ' ') {
            *cell = '_';
        }
    }

    let mut out = String::with_capacity((width + 1) * rows.len());
    for row in rows.iter().rev() {
        out.extend(row.iter());
        out.push('\n');
    }
    out
}

/// Place two diagrams next to each other, separated by `|`.
///
/// The shorter one is padded with blank rows on top so both share a bottom line.
pub fn merge_side_by_side(lhs: &str, rhs: &str) -> String {
    let left: Vec<&str> = lhs.lines().filter(|line| !line.is_empty()).collect();
    let right: Vec<&str> = rhs.lines().filter(|line| !line.is_empty()).collect();

    let left_filler = " ".repeat(left.first().map_or(0, |line| line.len()));
    let right_filler = " ".repeat(right.first().map_or(0, |line| line.len()));
    let rows = left.len().max(right.len());
    let left = pad_top(left, &left_filler, rows);
    let right = pad_top(right, &right_filler, rows);

    let mut out = String::new();
    for (l, r) in left.iter().zip(&right) {
        out.push_str(l);
        out.push('|');
        out.push_str(r);
        out.push('\n');
    }
    out
}

fn pad_top<'a>(lines: Vec<&'a str>, filler: &'a str, rows: usize) -> Vec<&'a str> {
    let mut padded = vec![filler; rows.saturating_sub(lines.len())];
    padded.extend(lines);
    padded
}

/// Lay diagrams out in rows of `columns`, rows separated by a blank line.
pub fn paste_graphs(sequences: &[&Sequence], columns: usize) -> String {
    sequences
        .chunks(columns.max(1))
        .map(|chunk| {
            let mut graphs = chunk.iter().map(|sequence| graph(sequence));
            let first = graphs.next().unwrap_or_default();
            graphs.fold(first, |acc, next| merge_side_by_side(&acc, &next))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// How many diagrams of `sequence_len` steps fit across the terminal.
pub fn columns_for(sequence_len: usize) -> usize {
    (TERMINAL_WIDTH / (sequence_len + 2 * PADDING)).max(1)
}

/// Up to `count` distinct entries of `table`, chosen at random.
pub fn select<'a, R: Rng + ?Sized>(
    table: &'a FrequencyTable,
    count: usize,
    rng: &mut R,
) -> Vec<(&'a Sequence, u64)> {
    table
        .iter()
        .map(|(sequence, &occurrences)| (sequence, occurrences))
        .choose_multiple(rng, count)
}
