//! Popperian Falsification Tests for ledgerload
//!
//! # Reference
//! Popper, K. (1959). *The Logic of Scientific Discovery*. Routledge.
//!
//! > "A theory which is not refutable by any conceivable event is non-scientific."
//!
//! Each test in this module attempts to falsify a specific claim about the
//! harness. A passing test means the claim survived the falsification attempt.

mod falsification_tests;
