//! `patch-steps-patch` — apply a patch-step document to a JSON document.
//!
//! Usage:
//!   patch-steps-patch <doc.json> <patch.json> [game-dir [mod-dir]]
//!
//! The patched document is written to stdout. IMPORT/INCLUDE references
//! resolve against the given directories; without them, any external
//! reference fails the run.

use std::fs;

use patch_steps::patch::{DenyLoader, Loader};
use patch_steps::patch_cli::{patch_document, FsLoader};

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let (doc_path, patch_path) = match (args.get(1), args.get(2)) {
        (Some(doc), Some(patch)) => (doc, patch),
        _ => {
            eprintln!("Usage: patch-steps-patch <doc.json> <patch.json> [game-dir [mod-dir]]");
            std::process::exit(2);
        }
    };

    let doc = read(doc_path);
    let patch = read(patch_path);

    let loader: Box<dyn Loader> = match args.get(3) {
        Some(game_dir) => {
            let mod_dir = args.get(4).unwrap_or(game_dir);
            Box::new(FsLoader::new(game_dir, mod_dir))
        }
        None => Box::new(DenyLoader),
    };

    match patch_document(&doc, &patch, loader.as_ref()) {
        Ok(result) => println!("{result}"),
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
