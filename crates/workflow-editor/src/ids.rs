//! Identifier minting for dropped nodes and drawn edges

use uuid::Uuid;
use workflow_types::NodeType;

use crate::config::IdStrategy;

/// Mints `<type>-<suffix>` node ids and `edge-<suffix>` edge ids
#[derive(Debug, Clone)]
pub struct IdAllocator {
    strategy: IdStrategy,
    counter: u64,
}

impl IdAllocator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self { strategy, counter: 0 }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Restart the sequential counter
    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// A fresh node id not rejected by `taken`
    pub fn node_id(&mut self, node_type: NodeType, taken: impl Fn(&str) -> bool) -> String {
        self.mint(node_type.as_str(), taken)
    }

    /// A fresh edge id not rejected by `taken`
    pub fn edge_id(&mut self, taken: impl Fn(&str) -> bool) -> String {
        self.mint("edge", taken)
    }

    fn mint(&mut self, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = format!("{}-{}", prefix, self.next_suffix());
            if !taken(&id) {
                return id;
            }
            log::trace!("Skipping taken id '{}'", id);
        }
    }

    fn next_suffix(&mut self) -> String {
        match self.strategy {
            IdStrategy::Uuid => Uuid::new_v4().simple().to_string(),
            IdStrategy::Sequential => {
                self.counter += 1;
                self.counter.to_string()
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}
