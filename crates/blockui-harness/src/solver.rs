#![forbid(unsafe_code)]

//! Position solver fixtures with test-controlled completion.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blockui_float::{
    ComputedPosition, PositionCallback, PositionRequest, PositionSolver, SolverError,
};

struct Parked {
    id: u64,
    request: PositionRequest,
    done: PositionCallback,
}

/// Solver that parks every request until the test resolves it.
///
/// Requests can be resolved in any order, which is how out-of-order and
/// late completions are simulated.
#[derive(Default)]
pub struct ManualSolver {
    parked: RefCell<Vec<Parked>>,
    next_id: Cell<u64>,
    received: RefCell<Vec<PositionRequest>>,
}

impl ManualSolver {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Requests not yet resolved.
    pub fn pending(&self) -> usize {
        self.parked.borrow().len()
    }

    /// Ids of parked requests, oldest first.
    pub fn pending_ids(&self) -> Vec<u64> {
        self.parked.borrow().iter().map(|p| p.id).collect()
    }

    /// Every request seen, in arrival order.
    pub fn requests(&self) -> Vec<PositionRequest> {
        self.received.borrow().clone()
    }

    /// Complete request `id` with `result`. Returns `false` if unknown.
    pub fn resolve(&self, id: u64, result: Result<ComputedPosition, SolverError>) -> bool {
        let parked = {
            let mut queue = self.parked.borrow_mut();
            let Some(index) = queue.iter().position(|p| p.id == id) else {
                return false;
            };
            queue.remove(index)
        };
        (parked.done)(result);
        true
    }

    /// Complete request `id` at the reference rectangle's origin.
    pub fn resolve_at_reference(&self, id: u64) -> bool {
        let position = self.parked.borrow().iter().find(|p| p.id == id).map(|p| {
            ComputedPosition {
                x: p.request.reference.x,
                y: p.request.reference.y,
                placement: p.request.placement,
            }
        });
        match position {
            Some(position) => self.resolve(id, Ok(position)),
            None => false,
        }
    }

    /// Complete every parked request, oldest first, at its reference origin.
    pub fn resolve_all(&self) -> usize {
        let ids = self.pending_ids();
        ids.into_iter()
            .filter(|&id| self.resolve_at_reference(id))
            .count()
    }
}

impl PositionSolver for ManualSolver {
    fn compute_position(&self, request: PositionRequest, done: PositionCallback) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.received.borrow_mut().push(request.clone());
        self.parked.borrow_mut().push(Parked { id, request, done });
    }
}

/// Solver that rejects every request immediately.
#[derive(Debug, Clone)]
pub struct FailingSolver {
    message: String,
}

impl FailingSolver {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl PositionSolver for FailingSolver {
    fn compute_position(&self, _request: PositionRequest, done: PositionCallback) {
        done(Err(SolverError::Other(self.message.clone())));
    }
}

#[cfg(test)]
mod tests {
    use blockui_core::Rect;
    use blockui_float::Placement;

    use super::*;
    use crate::mock::MockElement;

    fn request(y: f64) -> PositionRequest {
        PositionRequest {
            reference: Rect::new(100.0, y, 50.0, 20.0),
            floating: MockElement::sized(1, 10.0, 10.0),
            placement: Placement::Left,
            middleware: Vec::new(),
            overrides: Default::default(),
        }
    }

    #[test]
    fn resolves_out_of_order() {
        let solver = ManualSolver::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for y in [1.0, 2.0] {
            let seen = seen.clone();
            solver.compute_position(
                request(y),
                Box::new(move |r| seen.borrow_mut().push(r.map(|p| p.y))),
            );
        }
        assert_eq!(solver.pending_ids(), vec![0, 1]);
        assert!(solver.resolve_at_reference(1));
        assert!(solver.resolve_at_reference(0));
        assert!(!solver.resolve_at_reference(0));
        assert_eq!(*seen.borrow(), vec![Ok(2.0), Ok(1.0)]);
    }

    #[test]
    fn failing_solver_reports_message() {
        let out = Rc::new(RefCell::new(None));
        let sink = out.clone();
        FailingSolver::new("no layout").compute_position(
            request(0.0),
            Box::new(move |r| *sink.borrow_mut() = Some(r)),
        );
        assert_eq!(
            *out.borrow(),
            Some(Err(SolverError::Other("no layout".into())))
        );
    }
}
