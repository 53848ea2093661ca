//! Workflow orchestration for the push gate.
//!
//! Each command loads its inputs, delegates to a pure step, and prints a
//! report. Runs are independent: everything a run needs arrives through its
//! arguments.
mod classify;
mod run;

pub use classify::{run_classify, run_rules};
pub use run::run_run;
