//! # World Tools Entry Point
//!
//! Relights every chunk of a world directory.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- <world-dir> [config.json]
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match world_tools::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
