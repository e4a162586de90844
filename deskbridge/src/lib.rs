//! UI-process library: the typed bridge client, argument parsing, and the
//! local failure simulations. The UI never touches the log file or OS
//! resource counters directly; everything goes over the bridge.

pub mod bridge;
pub mod cli;
pub mod simulate;
