//! Cross-subsystem integration tests.

mod fork_choice;
mod ledger_flows;
mod protocol;
