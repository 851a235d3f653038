//! Test suites for the Tether worker.
