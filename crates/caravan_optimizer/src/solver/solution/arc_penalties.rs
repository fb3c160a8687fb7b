use crate::problem::node::NodeIdx;

/// Penalty counters of directed arcs, used by guided local search.
#[derive(Debug, Clone)]
pub struct ArcPenalties {
    counts: Vec<u32>,
    num_nodes: usize,
}

impl ArcPenalties {
    pub fn new(num_nodes: usize) -> Self {
        ArcPenalties {
            counts: vec![0; num_nodes * num_nodes],
            num_nodes,
        }
    }

    #[inline(always)]
    pub fn get(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.counts[from.get() * self.num_nodes + to.get()] as i64
    }

    pub fn increment(&mut self, from: NodeIdx, to: NodeIdx) {
        self.counts[from.get() * self.num_nodes + to.get()] += 1;
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&count| count as u64).sum()
    }
}
