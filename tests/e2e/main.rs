//! End-to-end tests over the full capture pipeline.

mod scenarios;
