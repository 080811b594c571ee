//! State graph: nodes + explicit and conditional edges, compile and run.
//!
//! `StateGraph`: add nodes and edges, compile, then invoke with state or
//! stream per-node events. Conditional edge routers are async and fallible so
//! branch decisions can be delegated to external oracles.

mod build_error;
mod compiled;
mod conditional;
mod next;
mod node;
mod state_graph;

pub use build_error::GraphBuildError;
pub use compiled::CompiledGraph;
pub use conditional::{EdgeRouter, EdgeRouterFn, NextEntry};
pub use next::Next;
pub use node::Node;
pub use state_graph::{StateGraph, END, START};
