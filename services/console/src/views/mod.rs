//! The view layer.
//!
//! One module per gated view. Views are thin: they read input lines, call
//! store operations, and write synchronously to the injected writer. Which
//! view runs is decided by the gate in `app`, never in here.

pub mod login;
pub mod shell;
pub mod verification;
