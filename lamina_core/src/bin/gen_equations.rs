//! Regenerate the equations reference from the registry.
//!
//! ```bash
//! cargo run --bin gen-equations [OUTPUT]
//! ```
//!
//! OUTPUT defaults to `lamina_core/src/equations/EQUATIONS.md`, relative to
//! the workspace root.

use std::path::PathBuf;
use std::process::ExitCode;

use lamina_core::equations::{generate_equations_markdown, ALL_EQUATIONS};

const DEFAULT_OUTPUT: &str = "lamina_core/src/equations/EQUATIONS.md";

fn main() -> ExitCode {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let markdown = generate_equations_markdown();

    match std::fs::write(&output, &markdown) {
        Ok(()) => {
            println!(
                "Wrote {} equations ({} bytes) to {}",
                ALL_EQUATIONS.len(),
                markdown.len(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {}", output.display(), e);
            ExitCode::FAILURE
        }
    }
}
