//! Robots.txt handling
//!
//! The policy model is intentionally permissive rather than a full
//! specification-compliant matcher: per-block `User-agent` then `Disallow`
//! lines, with a URL considered disallowed when it ends with or contains a
//! disallowed path string. A policy that cannot be loaded allows everything.

mod parser;

pub use parser::RobotsPolicy;
