use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::solver::search_params::SearchParameters;

#[derive(Clone, Debug)]
pub enum Termination {
    Duration(SignedDuration),
    Iterations(usize),
    IterationsWithoutImprovement(usize),
}

/// Decides when the search stops: limits from the parameters or an external stop request.
pub struct Terminator {
    terminations: Vec<Termination>,
    is_stopped: Arc<AtomicBool>,
    start: Timestamp,
}

impl Terminator {
    pub fn new(params: &SearchParameters, is_stopped: Arc<AtomicBool>) -> Self {
        let mut terminations = vec![
            Termination::Iterations(params.max_iterations),
            Termination::IterationsWithoutImprovement(params.max_iterations_without_improvement),
        ];
        if let Some(time_limit) = params.time_limit {
            terminations.push(Termination::Duration(time_limit));
        }

        Terminator {
            terminations,
            is_stopped,
            start: Timestamp::now(),
        }
    }

    pub fn elapsed(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.start)
    }

    pub fn is_stopped(&self) -> bool {
        self.is_stopped.load(Ordering::Relaxed)
    }

    pub fn is_time_limit_reached(&self) -> bool {
        self.terminations.iter().any(|termination| match termination {
            Termination::Duration(max_duration) => self.elapsed() >= *max_duration,
            _ => false,
        })
    }

    /// Stop request or time limit: the search must return what it has.
    pub fn is_interrupted(&self) -> bool {
        self.is_stopped() || self.is_time_limit_reached()
    }

    pub fn should_terminate(
        &self,
        iteration: usize,
        iterations_without_improvement: usize,
    ) -> bool {
        if self.is_stopped() {
            debug!(iteration, "Search stopped");
            return true;
        }

        self.terminations.iter().any(|termination| {
            let reached = match *termination {
                Termination::Iterations(max_iterations) => iteration >= max_iterations,
                Termination::IterationsWithoutImprovement(max_iterations) => {
                    iterations_without_improvement >= max_iterations
                }
                Termination::Duration(max_duration) => self.elapsed() >= max_duration,
            };

            if reached {
                debug!(iteration, "Termination condition met: {:?}", termination);
            }

            reached
        })
    }
}
