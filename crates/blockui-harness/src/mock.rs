#![forbid(unsafe_code)]

//! In-memory host elements and editor surfaces.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use blockui_core::{
    EditorSurface, ElementId, ElementRef, Rect, SurfaceError, UiElement, element::SHOW_ATTR,
};
use blockui_table::PointerGesture;

/// Shared parent table for a tree of [`MockElement`]s.
///
/// `append_child` only sees the child as a trait object, so parent links
/// live here rather than on the child.
pub struct MockDom {
    parents: RefCell<BTreeMap<ElementId, Weak<MockElement>>>,
    next_id: Cell<u64>,
}

impl MockDom {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            parents: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1_000),
        })
    }

    /// New element with `rect` and an auto-assigned id.
    pub fn element(self: &Rc<Self>, rect: Rect) -> Rc<MockElement> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        MockElement::with_dom(id, rect, self)
    }

    fn parent_of(&self, id: ElementId) -> Option<Rc<MockElement>> {
        self.parents.borrow().get(&id).and_then(Weak::upgrade)
    }
}

/// Element with attribute storage, recorded position, and parent/child
/// bookkeeping through its [`MockDom`].
pub struct MockElement {
    id: ElementId,
    rect: Rect,
    attrs: RefCell<BTreeMap<String, String>>,
    position: Cell<Option<(f64, f64)>>,
    children: RefCell<Vec<ElementRef>>,
    dom: Rc<MockDom>,
    self_ref: Weak<MockElement>,
}

impl MockElement {
    /// Element in a private tree of its own.
    pub fn new(id: u64, rect: Rect) -> Rc<Self> {
        Self::with_dom(id, rect, &MockDom::new())
    }

    pub fn with_dom(id: u64, rect: Rect, dom: &Rc<MockDom>) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            id: ElementId::new(id),
            rect,
            attrs: RefCell::new(BTreeMap::new()),
            position: Cell::new(None),
            children: RefCell::new(Vec::new()),
            dom: Rc::clone(dom),
            self_ref: self_ref.clone(),
        })
    }

    /// Element with a `w`×`h` box at the origin.
    pub fn sized(id: u64, w: f64, h: f64) -> Rc<Self> {
        Self::new(id, Rect::from_size(w, h))
    }

    pub fn dom(&self) -> &Rc<MockDom> {
        &self.dom
    }

    /// Last value passed to `set_position`.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.position.get()
    }

    /// Raw visibility attribute: `None` before anything set it.
    pub fn show_flag(&self) -> Option<String> {
        self.attribute(SHOW_ATTR)
    }

    pub fn child_ids(&self) -> Vec<ElementId> {
        self.children.borrow().iter().map(|c| c.id()).collect()
    }

    fn remove_child(&self, id: ElementId) {
        self.children.borrow_mut().retain(|c| c.id() != id);
    }
}

impl UiElement for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn bounding_rect(&self) -> Rect {
        self.rect
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: Option<&str>) {
        let mut attrs = self.attrs.borrow_mut();
        match value {
            Some(v) => {
                attrs.insert(name.to_string(), v.to_string());
            }
            None => {
                attrs.remove(name);
            }
        }
    }

    fn query_child(&self, _selector: &str) -> Option<ElementRef> {
        None
    }

    fn set_position(&self, x: f64, y: f64) {
        self.position.set(Some((x, y)));
    }

    fn append_child(&self, child: ElementRef) {
        let id = child.id();
        if let Some(old) = self.dom.parent_of(id) {
            old.remove_child(id);
        }
        self.children.borrow_mut().push(child);
        self.dom
            .parents
            .borrow_mut()
            .insert(id, self.self_ref.clone());
    }

    fn detach(&self) {
        let parent = self.dom.parents.borrow_mut().remove(&self.id);
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent.remove_child(self.id);
        }
    }

    fn is_attached(&self) -> bool {
        self.dom.parent_of(self.id).is_some()
    }
}

/// Editor surface with toggles for mount state and editability.
pub struct MockSurface {
    root: Rc<MockElement>,
    container: Rc<MockElement>,
    mounted: Cell<bool>,
    editable: Cell<bool>,
    focus_count: Cell<u32>,
}

impl MockSurface {
    /// Mounted, editable surface whose root sits inside a container.
    pub fn new() -> Rc<Self> {
        Self::with_dom(&MockDom::new())
    }

    /// Surface whose elements live in `dom`.
    pub fn with_dom(dom: &Rc<MockDom>) -> Rc<Self> {
        let container = MockElement::with_dom(1, Rect::new(0.0, 0.0, 800.0, 600.0), dom);
        let root = MockElement::with_dom(2, Rect::new(40.0, 0.0, 720.0, 600.0), dom);
        container.append_child(root.clone());
        Rc::new(Self {
            root,
            container,
            mounted: Cell::new(true),
            editable: Cell::new(true),
            focus_count: Cell::new(0),
        })
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.set(mounted);
    }

    pub fn set_editable(&self, editable: bool) {
        self.editable.set(editable);
    }

    pub fn focus_count(&self) -> u32 {
        self.focus_count.get()
    }

    pub fn container(&self) -> &Rc<MockElement> {
        &self.container
    }

    /// Tree the container and root live in.
    pub fn dom(&self) -> &Rc<MockDom> {
        self.container.dom()
    }
}

impl EditorSurface for MockSurface {
    fn is_editable(&self) -> bool {
        self.editable.get()
    }

    fn root(&self) -> Result<ElementRef, SurfaceError> {
        if self.mounted.get() {
            Ok(self.root.clone())
        } else {
            Err(SurfaceError::NotMounted)
        }
    }

    fn default_container(&self) -> Result<ElementRef, SurfaceError> {
        if !self.mounted.get() {
            return Err(SurfaceError::NotMounted);
        }
        Ok(self.container.clone())
    }

    fn focus(&self) {
        self.focus_count.set(self.focus_count.get() + 1);
    }
}

/// Pointer event that records `prevent_default`.
#[derive(Debug, Default)]
pub struct MockGesture {
    prevented: Cell<bool>,
}

impl MockGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }
}

impl PointerGesture for MockGesture {
    fn prevent_default(&self) {
        self.prevented.set(true);
    }
}
