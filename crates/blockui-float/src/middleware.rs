#![forbid(unsafe_code)]

//! Layout rules passed to the position solver.
//!
//! A request carries an ordered chain of [`Middleware`]. The floating handle
//! controller always puts [`Middleware::Flip`] first, adds
//! [`Middleware::Offset`] when an offset derivation is configured, and
//! appends caller-supplied rules last.
//!
//! Hosts with their own solver interpret the chain however their engine
//! does. [`ViewportSolver`](crate::viewport::ViewportSolver) applies it in
//! order against a [`LayoutState`].

use std::fmt;
use std::rc::Rc;

use blockui_core::Rect;

use crate::placement::Placement;

/// Intermediate state threaded through a middleware chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutState {
    /// Rectangle the content is anchored to.
    pub reference: Rect,
    /// Width and height of the floating element (origin unused).
    pub floating: Rect,
    /// Bounds the content should stay inside.
    pub viewport: Rect,
    /// Placement currently in effect.
    pub placement: Placement,
    /// Left edge of the floating element.
    pub x: f64,
    /// Top edge of the floating element.
    pub y: f64,
}

/// A caller-defined layout rule.
pub trait LayoutRule {
    /// Short identifier for tracing.
    fn name(&self) -> &str;

    /// Adjust the in-progress layout.
    fn apply(&self, state: &mut LayoutState);
}

/// One step of a solver's layout chain.
#[derive(Clone)]
pub enum Middleware {
    /// Switch to the opposite side when the preferred side lacks room.
    Flip,
    /// Push the content away from the reference along the placement axis.
    Offset(f64),
    /// Keep the content inside the viewport on the cross axis.
    Shift {
        /// Minimum distance from the viewport edge.
        padding: f64,
    },
    /// Arbitrary rule supplied by the caller.
    Custom(Rc<dyn LayoutRule>),
}

impl Middleware {
    /// Create a custom rule from any [`LayoutRule`].
    pub fn custom(rule: impl LayoutRule + 'static) -> Self {
        Self::Custom(Rc::new(rule))
    }

    /// Label used in traces and assertions.
    pub fn name(&self) -> &str {
        match self {
            Self::Flip => "flip",
            Self::Offset(_) => "offset",
            Self::Shift { .. } => "shift",
            Self::Custom(rule) => rule.name(),
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flip => write!(f, "Flip"),
            Self::Offset(d) => f.debug_tuple("Offset").field(d).finish(),
            Self::Shift { padding } => f.debug_struct("Shift").field("padding", padding).finish(),
            Self::Custom(rule) => f.debug_tuple("Custom").field(&rule.name()).finish(),
        }
    }
}

/// A [`LayoutRule`] backed by a closure.
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F: Fn(&mut LayoutState)> FnRule<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F: Fn(&mut LayoutState)> LayoutRule for FnRule<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: &mut LayoutState) {
        (self.f)(state);
    }
}

/// Sum of every [`Middleware::Offset`] in `chain`.
pub fn total_offset(chain: &[Middleware]) -> f64 {
    chain
        .iter()
        .map(|m| match m {
            Middleware::Offset(d) => *d,
            _ => 0.0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_identify_rules() {
        let chain = [
            Middleware::Flip,
            Middleware::Offset(4.0),
            Middleware::Shift { padding: 2.0 },
            Middleware::custom(FnRule::new("nudge", |s: &mut LayoutState| s.x += 1.0)),
        ];
        let names: Vec<_> = chain.iter().map(Middleware::name).collect();
        assert_eq!(names, vec!["flip", "offset", "shift", "nudge"]);
    }

    #[test]
    fn total_offset_sums_offsets_only() {
        let chain = [
            Middleware::Flip,
            Middleware::Offset(4.0),
            Middleware::Offset(1.5),
            Middleware::Shift { padding: 9.0 },
        ];
        assert_eq!(total_offset(&chain), 5.5);
        assert_eq!(total_offset(&[]), 0.0);
    }

    #[test]
    fn fn_rule_applies_closure() {
        let rule = FnRule::new("down", |s: &mut LayoutState| s.y += 3.0);
        let mut state = LayoutState {
            reference: Rect::default(),
            floating: Rect::default(),
            viewport: Rect::default(),
            placement: Placement::Left,
            x: 0.0,
            y: 0.0,
        };
        rule.apply(&mut state);
        assert_eq!(state.y, 3.0);
    }

    #[test]
    fn debug_shows_custom_name() {
        let m = Middleware::custom(FnRule::new("snap", |_: &mut LayoutState| {}));
        assert_eq!(format!("{m:?}"), "Custom(\"snap\")");
    }
}
