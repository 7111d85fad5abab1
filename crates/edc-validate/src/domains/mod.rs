//! Per-domain validators.
//!
//! Each submodule exposes `validate(table) -> Findings` for one domain and
//! owns that domain's rule registry. Validators are pure and mutually
//! independent; callers may run them concurrently over shared table
//! references.

pub mod ae;
pub mod cm;
pub mod dm;
pub mod vs;
