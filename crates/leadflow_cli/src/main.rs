//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `leadflow_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("leadflow_core ping={}", leadflow_core::ping());
    println!("leadflow_core version={}", leadflow_core::core_version());
}
