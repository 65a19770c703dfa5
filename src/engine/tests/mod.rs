//! Unit tests for the engine module.
//!
//! Tests are organised by concern: domain rules for tasks, project
//! states, and run bookkeeping; priority-ordered selection; handler
//! behaviour against a scripted generator; the in-memory coordination
//! adapter; and the orchestrator's run loop over in-memory adapters.

mod support;

mod coordination_tests;
