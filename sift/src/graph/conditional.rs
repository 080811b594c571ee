//! Conditional edges: route to the next node based on state, asynchronously.
//!
//! A source node (or the graph entry) carries a routing function that inspects
//! the current state and resolves a key; the key is either used as the next
//! node id directly or looked up in an optional path map. Routing functions
//! are async and fallible because branch decisions in this domain are
//! delegated to external oracles (a router or grader call per decision); a
//! routing failure aborts the run.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::WorkflowError;

/// Router function: reads the state, returns a routing key.
///
/// The closure must clone whatever it needs out of `&S` before entering its
/// async block, so the returned future is `'static`.
pub type EdgeRouterFn<S> =
    Arc<dyn Fn(&S) -> BoxFuture<'static, Result<String, WorkflowError>> + Send + Sync>;

/// Conditional edge definition: routing function plus optional path map.
///
/// - `path_map` of `None`: the router's key is the next node id (or END).
/// - `path_map` of `Some(map)`: next id is `map[key]` when present, otherwise
///   the key itself.
#[derive(Clone)]
pub struct EdgeRouter<S> {
    path: EdgeRouterFn<S>,
    pub(super) path_map: Option<HashMap<String, String>>,
}

impl<S> EdgeRouter<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Builds a conditional router with an optional path map.
    pub fn new(path: EdgeRouterFn<S>, path_map: Option<HashMap<String, String>>) -> Self {
        Self { path, path_map }
    }

    /// Resolves the next node id (or END) from the current state.
    pub async fn resolve_next(&self, state: &S) -> Result<String, WorkflowError> {
        let key = (self.path)(state).await?;
        Ok(self
            .path_map
            .as_ref()
            .and_then(|m| m.get(&key))
            .cloned()
            .unwrap_or(key))
    }
}

/// How the next node is determined after a given node runs.
#[derive(Clone)]
pub enum NextEntry<S> {
    /// Single declared next node (or END). The node's `Next` is still honored.
    Unconditional(String),
    /// Next node is decided by the router from state; the node's `Next` is ignored.
    Conditional(EdgeRouter<S>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_router(key: &'static str) -> EdgeRouterFn<i32> {
        Arc::new(move |_s: &i32| Box::pin(async move { Ok(key.to_string()) }))
    }

    /// **Scenario**: without a path map the key is the next node id.
    #[tokio::test]
    async fn resolve_without_path_map_uses_key() {
        let router = EdgeRouter::new(key_router("generate"), None);
        assert_eq!(router.resolve_next(&0).await.unwrap(), "generate");
    }

    /// **Scenario**: with a path map the key is translated; unknown keys pass through.
    #[tokio::test]
    async fn resolve_with_path_map_translates_key() {
        let map: HashMap<String, String> =
            [("useful".to_string(), "__end__".to_string())].into_iter().collect();
        let router = EdgeRouter::new(key_router("useful"), Some(map.clone()));
        assert_eq!(router.resolve_next(&0).await.unwrap(), "__end__");
        let router = EdgeRouter::new(key_router("generate"), Some(map));
        assert_eq!(router.resolve_next(&0).await.unwrap(), "generate");
    }

    /// **Scenario**: router errors propagate out of resolve_next.
    #[tokio::test]
    async fn resolve_propagates_router_error() {
        let failing: EdgeRouterFn<i32> = Arc::new(|_s: &i32| {
            Box::pin(async { Err(WorkflowError::RoutingContract("bad label".into())) })
        });
        let router = EdgeRouter::new(failing, None);
        let err = router.resolve_next(&0).await.unwrap_err();
        assert!(matches!(err, WorkflowError::RoutingContract(_)));
    }
}
