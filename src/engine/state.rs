//! Document state visible to a running script

use std::cell::RefCell;
use std::rc::Rc;

/// Host callback for non-fatal messages a script posts via
/// `state.postError(..)`. Fire-and-forget; never aborts the script.
pub type ErrorSink = Rc<dyn Fn(&str)>;

/// Which field `state.text` routes to. Fixed once when the state is
/// constructed, from whether a selection existed at that moment; a script
/// that later empties `selection` keeps writing to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTarget {
    FullText,
    Selection,
}

struct Fields {
    full_text: String,
    selection: String,
}

/// The `state` object bound into a script's scope.
///
/// Clones share the same underlying fields, so the handle the execution
/// context keeps observes every write the script makes through its own
/// copy. One state is created per invocation and discarded right after
/// extraction; nothing is shared between invocations.
#[derive(Clone)]
pub struct DocumentState {
    fields: Rc<RefCell<Fields>>,
    target: TextTarget,
    sink: ErrorSink,
}

impl DocumentState {
    pub fn new(full_text: String, selection: String, sink: ErrorSink) -> Self {
        let target = if selection.is_empty() {
            TextTarget::FullText
        } else {
            TextTarget::Selection
        };
        Self {
            fields: Rc::new(RefCell::new(Fields {
                full_text,
                selection,
            })),
            target,
            sink,
        }
    }

    pub fn target(&self) -> TextTarget {
        self.target
    }

    pub fn full_text(&self) -> String {
        self.fields.borrow().full_text.clone()
    }

    pub fn set_full_text(&mut self, value: String) {
        self.fields.borrow_mut().full_text = value;
    }

    pub fn selection(&self) -> String {
        self.fields.borrow().selection.clone()
    }

    pub fn set_selection(&mut self, value: String) {
        self.fields.borrow_mut().selection = value;
    }

    pub fn text(&self) -> String {
        match self.target {
            TextTarget::FullText => self.full_text(),
            TextTarget::Selection => self.selection(),
        }
    }

    pub fn set_text(&mut self, value: String) {
        match self.target {
            TextTarget::FullText => self.set_full_text(value),
            TextTarget::Selection => self.set_selection(value),
        }
    }

    pub fn post_error(&self, message: &str) {
        (self.sink)(message);
    }

    pub fn snapshot(&self) -> ExecutionResult {
        let fields = self.fields.borrow();
        ExecutionResult {
            full_text: fields.full_text.clone(),
            selection: fields.selection.clone(),
        }
    }
}

/// The post-script values of the document state.
///
/// When `selection` is non-empty the caller replaces the original
/// selection range with it; otherwise it replaces the whole document with
/// `full_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub full_text: String,
    pub selection: String,
}
