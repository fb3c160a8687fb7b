use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::Timestamp;
use parking_lot::RwLock;

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        search::{Search, SolveOutcome, SolverStatus},
        search_params::SearchParameters,
    },
};

pub struct Solver {
    search: Search,
    is_stopped: Arc<AtomicBool>,
    status: Arc<RwLock<SolverStatus>>,
    created_at: Timestamp,
}

impl Solver {
    pub fn new(model: Arc<RoutingModel>, params: SearchParameters) -> Self {
        let is_stopped = Arc::new(AtomicBool::new(false));
        let status = Arc::new(RwLock::new(SolverStatus::Configured));

        Solver {
            search: Search::new(model, params, Arc::clone(&is_stopped), Arc::clone(&status)),
            is_stopped,
            status,
            created_at: Timestamp::now(),
        }
    }

    pub fn solve(&self) -> SolveOutcome {
        self.search.run()
    }

    /// Asks a running search to return its best assignment.
    pub fn stop(&self) {
        self.is_stopped.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> SolverStatus {
        *self.status.read()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
