use html::{Document, NodeId};
use serde_json::Value;

/// What the embedding page provides around the core: loading indicators,
/// behavior attachment and layout metrics.
pub trait PageHost {
    /// Activates the loading indicator on `spinner`.
    fn start_spinner(&mut self, doc: &mut Document, spinner: NodeId);

    /// Runs page behaviors over freshly inserted `scope` with the effective settings.
    fn attach_behaviors(&mut self, doc: &mut Document, scope: &[NodeId], settings: &Value);

    /// Current rendered height of the page body, in CSS pixels.
    fn rendered_height(&self, doc: &Document) -> f32;
}

/// One `attach_behaviors` call as the headless host saw it.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub scope: Vec<NodeId>,
    /// Outer HTML of each scope node at attach time.
    pub html: Vec<String>,
    pub settings: Value,
}

/// Host without a renderer. Records every call so a run can be inspected.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    height: f32,
    spinners: Vec<NodeId>,
    attachments: Vec<Attachment>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_height(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    pub fn spinners(&self) -> &[NodeId] {
        &self.spinners
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}

impl PageHost for HeadlessHost {
    fn start_spinner(&mut self, doc: &mut Document, spinner: NodeId) {
        self.spinners.push(spinner);
        if let Err(err) = doc.set_attribute(spinner, "aria-busy", "true") {
            log::warn!(target: "lazy_views.host", "cannot mark spinner {spinner:?}: {err}");
        }
    }

    fn attach_behaviors(&mut self, doc: &mut Document, scope: &[NodeId], settings: &Value) {
        log::debug!(target: "lazy_views.host", "attach behaviors to {} node(s)", scope.len());
        self.attachments.push(Attachment {
            scope: scope.to_vec(),
            html: scope.iter().map(|&node| doc.outer_html(node)).collect(),
            settings: settings.clone(),
        });
    }

    fn rendered_height(&self, _doc: &Document) -> f32 {
        self.height
    }
}
