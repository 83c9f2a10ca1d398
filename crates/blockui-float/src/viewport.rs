// SPDX-License-Identifier: Apache-2.0
//! Reference position solver over a fixed viewport.
//!
//! [`ViewportSolver`] positions floating content next to a reference
//! rectangle and keeps it inside a viewport. It is what hosts without a
//! layout engine of their own plug into the floating handle controller, and
//! what the test suite uses as a realistic solver.
//!
//! # Middleware semantics
//!
//! The chain is applied in order:
//!
//! - **Flip**: if the preferred side lacks room for the content plus every
//!   offset in the chain, use the opposite side when it has room; otherwise
//!   keep whichever side has more room.
//! - **Offset(d)**: move the content `d` further away from the reference.
//! - **Shift { padding }**: clamp the cross axis into the viewport, keeping
//!   `padding` from the edges.
//! - **Custom**: the rule edits the [`LayoutState`] directly.
//!
//! [`DeferredSolver`] wraps any solver so its completion arrives on the next
//! frame, the way a host's asynchronous layout engine would behave.

#![forbid(unsafe_code)]

use blockui_core::{FrameScheduler, Rect};

use crate::middleware::{LayoutState, Middleware, total_offset};
use crate::placement::Placement;
use crate::solver::{
    ComputedPosition, PositionCallback, PositionRequest, PositionSolver, SolverError, SolverResult,
};

/// Synchronous solver that resolves against a viewport rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSolver {
    viewport: Rect,
}

impl ViewportSolver {
    pub fn new(viewport: Rect) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Solve a request without going through a callback.
    ///
    /// # Errors
    ///
    /// [`SolverError::EmptyReference`] when the reference has neither width
    /// nor height, [`SolverError::Unmeasurable`] when the floating element
    /// reports an empty box.
    pub fn solve(&self, request: &PositionRequest) -> SolverResult {
        let reference = request.reference;
        if reference.width <= 0.0 && reference.height <= 0.0 {
            return Err(SolverError::EmptyReference(reference));
        }
        let floating = request.floating.bounding_rect();
        if floating.is_empty() {
            return Err(SolverError::Unmeasurable);
        }
        let viewport = request.overrides.boundary.unwrap_or(self.viewport);

        let mut state = LayoutState {
            reference,
            floating: Rect::from_size(floating.width, floating.height),
            viewport,
            placement: request.placement,
            x: 0.0,
            y: 0.0,
        };
        place(&mut state);

        let gap = total_offset(&request.middleware);
        let mut applied_offset = 0.0;
        for rule in &request.middleware {
            match rule {
                Middleware::Flip => {
                    let resolved = resolve_placement(&state, gap);
                    if resolved != state.placement {
                        tracing::trace!(
                            target: "blockui.float",
                            from = state.placement.as_str(),
                            to = resolved.as_str(),
                            "flip"
                        );
                        state.placement = resolved;
                        place(&mut state);
                        push_away(&mut state, applied_offset);
                    }
                }
                Middleware::Offset(d) => {
                    push_away(&mut state, *d);
                    applied_offset += *d;
                }
                Middleware::Shift { padding } => shift(&mut state, *padding),
                Middleware::Custom(custom) => custom.apply(&mut state),
            }
        }

        Ok(ComputedPosition {
            x: state.x,
            y: state.y,
            placement: state.placement,
        })
    }
}

impl PositionSolver for ViewportSolver {
    fn compute_position(&self, request: PositionRequest, done: PositionCallback) {
        done(self.solve(&request));
    }
}

/// Base coordinates for the current placement, centered on the cross axis.
fn place(state: &mut LayoutState) {
    let r = state.reference;
    let f = state.floating;
    let (x, y) = match state.placement {
        Placement::Top => (r.center_x() - f.width / 2.0, r.y - f.height),
        Placement::Bottom => (r.center_x() - f.width / 2.0, r.bottom()),
        Placement::Left => (r.x - f.width, r.center_y() - f.height / 2.0),
        Placement::Right => (r.right(), r.center_y() - f.height / 2.0),
    };
    state.x = x;
    state.y = y;
}

/// Move the content `d` away from the reference along the placement axis.
fn push_away(state: &mut LayoutState, d: f64) {
    match state.placement {
        Placement::Top => state.y -= d,
        Placement::Bottom => state.y += d,
        Placement::Left => state.x -= d,
        Placement::Right => state.x += d,
    }
}

/// How much room the viewport leaves on the given side of the reference.
fn available_space(state: &LayoutState, placement: Placement) -> f64 {
    let r = state.reference;
    let v = state.viewport;
    let space = match placement {
        Placement::Top => r.y - v.y,
        Placement::Bottom => v.bottom() - r.bottom(),
        Placement::Left => r.x - v.x,
        Placement::Right => v.right() - r.right(),
    };
    space.max(0.0)
}

/// Room the content needs on the given side.
fn needed_space(state: &LayoutState, placement: Placement, gap: f64) -> f64 {
    let size = if placement.is_vertical() {
        state.floating.height
    } else {
        state.floating.width
    };
    size + gap
}

fn resolve_placement(state: &LayoutState, gap: f64) -> Placement {
    let primary = state.placement;
    let available = available_space(state, primary);
    if available >= needed_space(state, primary, gap) {
        return primary;
    }

    let flipped = primary.flip();
    let flipped_available = available_space(state, flipped);
    if flipped_available >= needed_space(state, flipped, gap) {
        return flipped;
    }

    if flipped_available > available {
        flipped
    } else {
        primary
    }
}

/// Clamp the cross axis into the viewport.
fn shift(state: &mut LayoutState, padding: f64) {
    let v = state.viewport;
    if state.placement.is_vertical() {
        let min = v.x + padding;
        let max = v.right() - padding - state.floating.width;
        state.x = clamp_axis(state.x, min, max);
    } else {
        let min = v.y + padding;
        let max = v.bottom() - padding - state.floating.height;
        state.y = clamp_axis(state.y, min, max);
    }
}

/// Clamp that prefers the leading edge when the range is inverted.
fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if max < min {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Delivers another solver's completion on the next frame.
#[derive(Debug, Clone)]
pub struct DeferredSolver<S> {
    inner: S,
    scheduler: FrameScheduler,
}

impl<S> DeferredSolver<S> {
    pub fn new(inner: S, scheduler: FrameScheduler) -> Self {
        Self { inner, scheduler }
    }
}

impl<S: PositionSolver + Clone + 'static> PositionSolver for DeferredSolver<S> {
    fn compute_position(&self, request: PositionRequest, done: PositionCallback) {
        let inner = self.inner.clone();
        // Stale results are discarded by the consumer.
        let _ = self.scheduler.request_frame(move || {
            inner.compute_position(request, done);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnRule;
    use crate::solver::SolverOverrides;
    use blockui_core::{ElementId, ElementRef, UiElement};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Measured(Rect);

    impl UiElement for Measured {
        fn id(&self) -> ElementId {
            ElementId::new(1)
        }
        fn bounding_rect(&self) -> Rect {
            self.0
        }
        fn attribute(&self, _name: &str) -> Option<String> {
            None
        }
        fn set_attribute(&self, _name: &str, _value: Option<&str>) {}
        fn query_child(&self, _selector: &str) -> Option<ElementRef> {
            None
        }
        fn set_position(&self, _x: f64, _y: f64) {}
        fn append_child(&self, _child: ElementRef) {}
        fn detach(&self) {}
        fn is_attached(&self) -> bool {
            true
        }
    }

    fn viewport() -> ViewportSolver {
        ViewportSolver::new(Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    fn request(
        reference: Rect,
        placement: Placement,
        middleware: Vec<Middleware>,
    ) -> PositionRequest {
        PositionRequest {
            reference,
            floating: Rc::new(Measured(Rect::from_size(20.0, 10.0))),
            placement,
            middleware,
            overrides: SolverOverrides::default(),
        }
    }

    #[test]
    fn left_centers_vertically() {
        let req = request(Rect::new(100.0, 50.0, 300.0, 30.0), Placement::Left, vec![]);
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.x, 80.0);
        assert_eq!(pos.y, 60.0);
        assert_eq!(pos.placement, Placement::Left);
    }

    #[test]
    fn bottom_centers_horizontally() {
        let req = request(
            Rect::new(100.0, 50.0, 40.0, 30.0),
            Placement::Bottom,
            vec![],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.x, 110.0);
        assert_eq!(pos.y, 80.0);
    }

    #[test]
    fn offset_pushes_away_from_reference() {
        let req = request(
            Rect::new(100.0, 50.0, 300.0, 30.0),
            Placement::Left,
            vec![Middleware::Flip, Middleware::Offset(8.0)],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.x, 72.0);
    }

    #[test]
    fn flip_left_to_right_at_viewport_edge() {
        // Only 10px left of the reference; the 20px handle cannot fit.
        let req = request(
            Rect::new(10.0, 50.0, 300.0, 30.0),
            Placement::Left,
            vec![Middleware::Flip],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.placement, Placement::Right);
        assert_eq!(pos.x, 310.0);
    }

    #[test]
    fn flip_accounts_for_offset() {
        // 25px of room fits the 20px handle but not handle + 8px offset.
        let req = request(
            Rect::new(25.0, 50.0, 300.0, 30.0),
            Placement::Left,
            vec![Middleware::Flip, Middleware::Offset(8.0)],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.placement, Placement::Right);
        assert_eq!(pos.x, 333.0);
    }

    #[test]
    fn without_flip_placement_is_kept() {
        let req = request(Rect::new(10.0, 50.0, 300.0, 30.0), Placement::Left, vec![]);
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.placement, Placement::Left);
        assert_eq!(pos.x, -10.0);
    }

    #[test]
    fn flip_keeps_roomier_side_when_neither_fits() {
        let solver = ViewportSolver::new(Rect::new(0.0, 0.0, 40.0, 600.0));
        let req = request(
            Rect::new(5.0, 50.0, 25.0, 30.0),
            Placement::Left,
            vec![Middleware::Flip],
        );
        // left room 5, right room 10: neither fits 20, right is roomier.
        let pos = solver.solve(&req).unwrap();
        assert_eq!(pos.placement, Placement::Right);
    }

    #[test]
    fn shift_clamps_cross_axis() {
        let req = request(
            Rect::new(100.0, 0.0, 300.0, 4.0),
            Placement::Left,
            vec![Middleware::Shift { padding: 2.0 }],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.y, 2.0);
    }

    #[test]
    fn custom_rule_runs_last() {
        let req = request(
            Rect::new(100.0, 50.0, 300.0, 30.0),
            Placement::Left,
            vec![
                Middleware::Flip,
                Middleware::custom(FnRule::new("snap", |s: &mut LayoutState| {
                    s.x = s.x.floor() - 1.0
                })),
            ],
        );
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.x, 79.0);
    }

    #[test]
    fn boundary_override_replaces_viewport() {
        let mut req = request(
            Rect::new(100.0, 50.0, 300.0, 30.0),
            Placement::Left,
            vec![Middleware::Flip],
        );
        req.overrides.boundary = Some(Rect::new(95.0, 0.0, 800.0, 600.0));
        let pos = viewport().solve(&req).unwrap();
        assert_eq!(pos.placement, Placement::Right);
    }

    #[test]
    fn empty_reference_is_rejected() {
        let req = request(Rect::new(10.0, 10.0, 0.0, 0.0), Placement::Left, vec![]);
        assert!(matches!(viewport().solve(&req), Err(SolverError::EmptyReference(_))));
    }

    #[test]
    fn unmeasurable_floating_is_rejected() {
        let mut req = request(Rect::new(10.0, 10.0, 10.0, 10.0), Placement::Left, vec![]);
        req.floating = Rc::new(Measured(Rect::default()));
        assert_eq!(viewport().solve(&req), Err(SolverError::Unmeasurable));
    }

    #[test]
    fn deferred_solver_completes_next_frame() {
        let sched = FrameScheduler::new();
        let solver = DeferredSolver::new(viewport(), sched.clone());
        let out: Rc<RefCell<Option<SolverResult>>> = Rc::new(RefCell::new(None));
        let o = out.clone();
        solver.compute_position(
            request(Rect::new(100.0, 50.0, 300.0, 30.0), Placement::Left, vec![]),
            Box::new(move |r| *o.borrow_mut() = Some(r)),
        );
        assert!(out.borrow().is_none());
        sched.run_frame();
        assert!(matches!(*out.borrow(), Some(Ok(_))));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn placement() -> impl Strategy<Value = Placement> {
            prop_oneof![
                Just(Placement::Top),
                Just(Placement::Bottom),
                Just(Placement::Left),
                Just(Placement::Right),
            ]
        }

        proptest! {
            #[test]
            fn shift_keeps_cross_axis_inside_viewport(
                x in 0.0f64..700.0,
                y in -50.0f64..650.0,
                w in 1.0f64..100.0,
                h in 1.0f64..40.0,
                side in placement(),
            ) {
                let req = request(
                    Rect::new(x, y, w, h),
                    side,
                    vec![Middleware::Flip, Middleware::Shift { padding: 4.0 }],
                );
                let pos = viewport().solve(&req).unwrap();
                if pos.placement.is_vertical() {
                    prop_assert!(pos.x >= 4.0 && pos.x + 20.0 <= 796.0);
                } else {
                    prop_assert!(pos.y >= 4.0 && pos.y + 10.0 <= 596.0);
                }
            }

            #[test]
            fn flip_never_picks_the_tighter_side(
                x in 0.0f64..780.0,
                w in 1.0f64..200.0,
                side in prop_oneof![Just(Placement::Left), Just(Placement::Right)],
            ) {
                let solver = viewport();
                let req = request(Rect::new(x, 100.0, w, 20.0), side, vec![Middleware::Flip]);
                let pos = solver.solve(&req).unwrap();
                let state = LayoutState {
                    reference: req.reference,
                    floating: Rect::from_size(20.0, 10.0),
                    viewport: solver.viewport(),
                    placement: side,
                    x: 0.0,
                    y: 0.0,
                };
                let chosen = available_space(&state, pos.placement);
                let preferred = available_space(&state, side);
                prop_assert!(chosen >= 20.0 || chosen >= preferred);
            }
        }
    }
}
