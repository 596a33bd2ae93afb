//! `patch-steps-diff` — generate a patch-step sequence from two JSON
//! documents.
//!
//! Usage:
//!   patch-steps-diff <a.json> <b.json> [settings.json]
//!
//! The step array is written to stdout. The optional settings file is a
//! partial settings object merged over the defaults.

use std::fs;

use patch_steps::patch_cli::diff_documents;

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let (a_path, b_path) = match (args.get(1), args.get(2)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            eprintln!("Usage: patch-steps-diff <a.json> <b.json> [settings.json]");
            std::process::exit(2);
        }
    };

    let a = read(a_path);
    let b = read(b_path);
    let settings = args.get(3).map(|path| read(path));

    match diff_documents(&a, &b, settings.as_deref()) {
        Ok(steps) => println!("{steps}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn read(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}
