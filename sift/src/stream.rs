//! Streaming types for graph runs.
//!
//! `CompiledGraph::stream` emits one event per node execution, in execution
//! order, through a channel-backed stream. Observability is an explicit
//! event channel, not stdout narration.

use std::collections::HashSet;
use std::fmt::Debug;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit the full state after each node completes.
    Values,
    /// Emit the node id together with the state after that node.
    Updates,
}

impl From<StreamMode> for HashSet<StreamMode> {
    fn from(mode: StreamMode) -> Self {
        HashSet::from_iter([mode])
    }
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// The node that just ran and the state after it.
    Updates { node: String, state: S },
    /// The run failed at `node`; this is the final event of the stream.
    Error { node: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct DummyState(i32);

    /// **Scenario**: both modes are distinct and usable in a HashSet.
    #[test]
    fn stream_modes_distinct() {
        let set: HashSet<StreamMode> =
            [StreamMode::Values, StreamMode::Updates].into_iter().collect();
        assert_eq!(set.len(), 2);
        let single: HashSet<StreamMode> = StreamMode::Updates.into();
        assert!(single.contains(&StreamMode::Updates));
        assert_eq!(single.len(), 1);
    }

    /// **Scenario**: event variants carry their data.
    #[test]
    fn stream_event_variants_hold_data() {
        match StreamEvent::Values(DummyState(1)) {
            StreamEvent::Values(DummyState(v)) => assert_eq!(v, 1),
            _ => panic!("expected Values"),
        }
        let ev: StreamEvent<DummyState> = StreamEvent::Updates {
            node: "generate".into(),
            state: DummyState(2),
        };
        match ev {
            StreamEvent::Updates { node, state } => {
                assert_eq!(node, "generate");
                assert_eq!(state, DummyState(2));
            }
            _ => panic!("expected Updates"),
        }
        let err: StreamEvent<DummyState> = StreamEvent::Error {
            node: "retrieve".into(),
            message: "index not ready".into(),
        };
        match err {
            StreamEvent::Error { node, message } => {
                assert_eq!(node, "retrieve");
                assert!(message.contains("index"));
            }
            _ => panic!("expected Error"),
        }
    }
}
