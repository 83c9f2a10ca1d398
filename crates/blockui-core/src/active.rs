#![forbid(unsafe_code)]

//! The node under pointer focus and the transitions announced for it.

use std::fmt;

use crate::element::ElementRef;
use crate::geometry::Rect;

/// The structural node currently under pointer focus.
///
/// Produced by host hover tracking, one per hover event. A newer node
/// supersedes the previous one; hiding clears it.
#[derive(Clone)]
pub struct ActiveNode {
    /// Host element rendering the node.
    pub element: ElementRef,
    /// Offset of the node in the document.
    pub document_position: usize,
    /// On-screen box of the node at hover time.
    pub dom_rect: Rect,
}

impl ActiveNode {
    pub fn new(element: ElementRef, document_position: usize, dom_rect: Rect) -> Self {
        Self {
            element,
            document_position,
            dom_rect,
        }
    }

    /// Build from an element, sampling its current bounding box.
    pub fn from_element(element: ElementRef, document_position: usize) -> Self {
        let dom_rect = element.bounding_rect();
        Self::new(element, document_position, dom_rect)
    }
}

impl fmt::Debug for ActiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveNode")
            .field("element", &self.element.id())
            .field("document_position", &self.document_position)
            .field("dom_rect", &self.dom_rect)
            .finish()
    }
}

/// Transition delivered from the registry to its bound subscriber.
#[derive(Debug, Clone)]
pub enum Message {
    /// Nothing is targeted any more.
    Hide,
    /// A node became targeted.
    Show(ActiveNode),
}

impl Message {
    /// Short label for tracing fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Show(_) => "show",
        }
    }
}
