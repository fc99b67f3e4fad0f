//! Suffix index sample.
//!
//! Builds a full in-memory suffix index over a text by inserting every
//! suffix, longest first, into a [`PersistentAvlSet`], then answers a
//! substring-prefix query with a single `lower_bound` call.
//!
//! Usage:
//!
//! ```text
//! suffix-index [TEXT_FILE] [QUERY]
//! ```
//!
//! With no arguments a built-in text and the query "the Roman Empire"
//! are used.

use avlars::persistent::PersistentAvlSet;
use std::env;
use std::fs;
use std::process::ExitCode;

const DEFAULT_QUERY: &str = "the Roman Empire";

const DEFAULT_TEXT: &str = "\
For centuries the Roman Empire bound the Mediterranean world into a \
single political order. Roads, aqueducts, and garrisons carried its \
administration from Britannia to Syria, and Latin became the common \
tongue of law and trade. Historians still argue about when the Roman \
Empire truly ended: the deposition of the last western emperor, the \
fall of Constantinople, or some slower unravelling in between. What is \
certain is that the institutions of the Roman Empire outlived the \
state itself, surviving in churches, codes of law, and the very roads \
beneath later kingdoms.";

/// How many bytes of surrounding text to print around a match.
const CONTEXT_BYTES: usize = 60;

fn main() -> ExitCode {
    let mut args = env::args().skip(1);

    let text = match args.next() {
        Some(path) => match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) => {
                eprintln!("failed to read {path}: {error}");
                return ExitCode::FAILURE;
            }
        },
        None => DEFAULT_TEXT.to_string(),
    };
    let query = args.next().unwrap_or_else(|| DEFAULT_QUERY.to_string());

    let bytes = text.as_bytes();
    let mut index = PersistentAvlSet::new();
    for position in (0..bytes.len()).rev() {
        index = index.insert(&bytes[position..]);

        // Validate often while the tree is small, then back off to
        // powers of two to avoid an O(N^2) pass over large texts.
        let inserted = bytes.len() - position;
        if inserted < 128 || inserted.is_power_of_two() {
            index.validate();
        }
    }

    let stats = index.validate();
    println!(
        "total node count: {}, average depth: {:.3}, max height: {}",
        stats.node_count, stats.average_depth, stats.max_height
    );
    println!("AVL tree height = {}", index.height());

    match index.lower_bound(query.as_bytes()) {
        Some(suffix) if suffix.starts_with(query.as_bytes()) => {
            // Suffix offsets are determined by their lengths.
            let offset = bytes.len() - suffix.len();
            println!("occurrence of '{query}' at offset {offset}, in context:");
            print_occurrence_context(bytes, offset, query.len());
        }
        Some(suffix) => {
            let offset = bytes.len() - suffix.len();
            println!("'{query}' does not occur; nearest suffix starts at offset {offset}");
        }
        None => {
            println!("every suffix of the text sorts before '{query}'");
        }
    }

    ExitCode::SUCCESS
}

fn print_occurrence_context(bytes: &[u8], offset: usize, match_length: usize) {
    let start = offset.saturating_sub(CONTEXT_BYTES);
    let end = (offset + match_length + CONTEXT_BYTES).min(bytes.len());
    println!("...{}...", String::from_utf8_lossy(&bytes[start..end]));
}
