//! repolens CLI binary
//!
//! All logic is in the library; main.rs only invokes cli::run().

fn main() {
    // cli::run() handles all output, including failure envelopes
    if let Err(code) = repolens::cli::run() {
        std::process::exit(code.as_i32());
    }
}
