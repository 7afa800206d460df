//! Page-height pin held for the length of one dispatch.
use std::ops::{Deref, DerefMut};

use html::{Document, NodeId};

use crate::dispatch::DispatchContext;

pub const FREEZE_ELEMENT_ID: &str = "freeze-height";

/// Keeps the page at least `height` tall while held; the pin is removed on drop,
/// including when a handler bails out early.
pub struct LayoutFreeze<'g, 'c> {
    ctx: &'g mut DispatchContext<'c>,
    pin: Option<NodeId>,
}

impl<'g, 'c> LayoutFreeze<'g, 'c> {
    pub fn engage(ctx: &'g mut DispatchContext<'c>, height: f32) -> Self {
        release_stale_pins(ctx.document);
        let pin = match insert_pin(ctx.document, height) {
            Ok(pin) => Some(pin),
            Err(err) => {
                log::warn!(target: "lazy_views.freeze", "cannot pin page height: {err}");
                None
            }
        };
        log::trace!(target: "lazy_views.freeze", "frozen at {height}px");
        Self { ctx, pin }
    }

    pub fn pin(&self) -> Option<NodeId> {
        self.pin
    }
}

impl<'c> Deref for LayoutFreeze<'_, 'c> {
    type Target = DispatchContext<'c>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for LayoutFreeze<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for LayoutFreeze<'_, '_> {
    fn drop(&mut self) {
        let Some(pin) = self.pin.take() else {
            return;
        };
        if let Err(err) = self.ctx.document.remove(pin) {
            log::warn!(target: "lazy_views.freeze", "pin already gone: {err}");
        }
        log::trace!(target: "lazy_views.freeze", "unfrozen");
    }
}

fn release_stale_pins(doc: &mut Document) {
    let selector = format!("#{FREEZE_ELEMENT_ID}");
    for stale in doc.select(&selector).unwrap_or_default() {
        if let Err(err) = doc.remove(stale) {
            log::warn!(target: "lazy_views.freeze", "cannot release stale pin: {err}");
        }
    }
}

fn insert_pin(doc: &mut Document, height: f32) -> Result<NodeId, html::DomError> {
    let pin = doc.create_element("div");
    doc.set_attribute(pin, "id", FREEZE_ELEMENT_ID)?;
    let height = format!("{height}px");
    for (property, value) in [
        ("position", "absolute"),
        ("top", "0px"),
        ("left", "0px"),
        ("width", "1px"),
        ("height", height.as_str()),
    ] {
        doc.set_style_property(pin, property, Some(value))?;
    }
    let body = doc.body();
    doc.append_child(body, pin)?;
    Ok(pin)
}
