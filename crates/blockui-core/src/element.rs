#![forbid(unsafe_code)]

//! Opaque handles onto host UI elements and the editable surface.
//!
//! The overlay layer never sees a concrete rendering tree. Hosts implement
//! [`UiElement`] for whatever node type they render into (a DOM node, a
//! retained widget, a terminal region) and [`EditorSurface`] for the editable
//! view itself. Only the capabilities the overlay actually needs are exposed.
//!
//! All methods take `&self`: host elements are shared handles with interior
//! mutability, the same way a DOM node is mutated through any reference to it.

use std::fmt;
use std::rc::Rc;

use crate::geometry::Rect;

/// Attribute toggled to show (`"true"`) or hide (`"false"`) an overlay element.
pub const SHOW_ATTR: &str = "data-show";

/// Attribute set on elements that carry drag affordance.
pub const DRAGGABLE_ATTR: &str = "draggable";

/// Stable identity of a host element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Create a new element ID from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Capabilities of a host element used by the overlay layer.
pub trait UiElement {
    /// Stable identity; two handles with the same id refer to the same node.
    fn id(&self) -> ElementId;

    /// Current on-screen box.
    fn bounding_rect(&self) -> Rect;

    /// Read an attribute.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Set (`Some`) or remove (`None`) an attribute.
    fn set_attribute(&self, name: &str, value: Option<&str>);

    /// First descendant matching a host-defined selector.
    fn query_child(&self, selector: &str) -> Option<ElementRef>;

    /// Move the element so its top-left corner sits at `(x, y)`.
    fn set_position(&self, x: f64, y: f64);

    /// Append `child` as the last child of this element.
    fn append_child(&self, child: ElementRef);

    /// Remove this element from its parent. No-op when already detached.
    fn detach(&self);

    /// Whether the element currently has a parent.
    fn is_attached(&self) -> bool;
}

/// Shared handle to a host element.
pub type ElementRef = Rc<dyn UiElement>;

/// Read the boolean visibility flag of an overlay element.
///
/// A missing attribute counts as hidden.
pub fn is_shown(element: &dyn UiElement) -> bool {
    element.attribute(SHOW_ATTR).as_deref() == Some("true")
}

/// Write the boolean visibility flag of an overlay element.
pub fn set_shown(element: &dyn UiElement, shown: bool) {
    element.set_attribute(SHOW_ATTR, Some(if shown { "true" } else { "false" }));
}

/// Flip the visibility flag: `"false"` becomes `"true"`, anything else becomes `"false"`.
pub fn toggle_shown(element: &dyn UiElement) {
    let currently_hidden = element.attribute(SHOW_ATTR).as_deref() == Some("false");
    set_shown(element, currently_hidden);
}

/// Errors raised by an [`EditorSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The editable view has not been mounted yet.
    NotMounted,
    /// The view is mounted but has no parent to host overlays in.
    NoContainer,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMounted => write!(f, "editor surface is not mounted"),
            Self::NoContainer => write!(f, "editor surface has no container element"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The editable document view.
pub trait EditorSurface {
    /// Whether the document currently accepts edits.
    fn is_editable(&self) -> bool;

    /// Root element of the editable view.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::NotMounted`] before the view is attached.
    fn root(&self) -> Result<ElementRef, SurfaceError>;

    /// Element overlays attach to when no container is configured.
    ///
    /// Usually the parent of [`root`](Self::root).
    ///
    /// # Errors
    ///
    /// Propagates [`SurfaceError`] when the view is not mounted or parentless.
    fn default_container(&self) -> Result<ElementRef, SurfaceError>;

    /// Return keyboard focus to the editable view.
    fn focus(&self);
}

/// Shared handle to the editable surface.
pub type SurfaceRef = Rc<dyn EditorSurface>;
