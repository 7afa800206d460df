//! Replacement engine behind the `insert` command.
//!
//! Every matched target gets its own transition:
//! fade out, insert the hidden wrapper, fade in, unwrap, attach behaviors.
//! Transitions are advanced by `tick` and never wait on each other.
use std::time::{Duration, Instant};

use html::{Document, DomError, InsertMethod, NodeId};
use serde_json::Value;

use crate::command::Command;
use crate::dispatch::{CommandHandler, DispatchContext};
use crate::error::HandlerError;
use crate::host::PageHost;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FadeTimings {
    pub fade_out: Duration,
    pub fade_in: Duration,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            fade_out: Duration::from_millis(500),
            fade_in: Duration::from_millis(600),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    FadingOut { started: Instant },
    FadingIn { started: Instant },
}

#[derive(Debug)]
struct Transition {
    target: NodeId,
    wrapper: NodeId,
    method: InsertMethod,
    /// Settings in effect when the command was dispatched.
    settings: Value,
    stage: Stage,
}

#[derive(Debug)]
pub struct ReplacementEngine {
    timings: FadeTimings,
    transitions: Vec<Transition>,
}

impl ReplacementEngine {
    pub fn new(timings: FadeTimings) -> Self {
        Self {
            timings,
            transitions: Vec::new(),
        }
    }

    pub fn timings(&self) -> FadeTimings {
        self.timings
    }

    pub fn in_flight(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_idle(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Parses `markup` into a hidden detached wrapper and starts fading `target` out.
    pub fn begin(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        method: InsertMethod,
        markup: &str,
        settings: Value,
        now: Instant,
    ) -> Result<(), DomError> {
        let wrapper = doc.create_element("div");
        doc.append_html(wrapper, markup)?;
        doc.set_style_property(wrapper, "display", Some("none"))?;
        log::trace!(target: "lazy_views.replace", "{method} into {target:?} via {wrapper:?}");
        self.transitions.push(Transition {
            target,
            wrapper,
            method,
            settings,
            stage: Stage::FadingOut { started: now },
        });
        Ok(())
    }

    /// Advances every transition to `now`; returns how many finished.
    pub fn tick(&mut self, now: Instant, doc: &mut Document, host: &mut dyn PageHost) -> usize {
        let mut completed = 0;
        for mut transition in std::mem::take(&mut self.transitions) {
            match advance(self.timings, &mut transition, now, doc, host) {
                Ok(true) => completed += 1,
                Ok(false) => self.transitions.push(transition),
                Err(err) => {
                    log::warn!(
                        target: "lazy_views.replace",
                        "dropping transition for {:?}: {err}",
                        transition.target
                    );
                    if doc.is_live(transition.wrapper) {
                        if let Err(err) = doc.remove(transition.wrapper) {
                            log::warn!(
                                target: "lazy_views.replace",
                                "cannot discard wrapper {:?}: {err}",
                                transition.wrapper
                            );
                        }
                    }
                }
            }
        }
        completed
    }
}

/// Runs `transition` as far as `now` allows. A zero-length fade finishes in
/// the same tick it starts.
fn advance(
    timings: FadeTimings,
    transition: &mut Transition,
    now: Instant,
    doc: &mut Document,
    host: &mut dyn PageHost,
) -> Result<bool, DomError> {
    loop {
        match transition.stage {
            Stage::FadingOut { started } => {
                let elapsed = now.saturating_duration_since(started);
                if elapsed < timings.fade_out {
                    let opacity = 1.0 - progress(elapsed, timings.fade_out);
                    set_opacity(doc, transition.target, Some(opacity))?;
                    return Ok(false);
                }
                set_opacity(doc, transition.target, None)?;
                doc.set_style_property(transition.target, "display", Some("none"))?;
                doc.insert_relative(transition.target, transition.method, transition.wrapper)?;
                doc.set_style_property(transition.wrapper, "display", None)?;
                set_opacity(doc, transition.wrapper, Some(0.0))?;
                transition.stage = Stage::FadingIn {
                    started: started + timings.fade_out,
                };
            }
            Stage::FadingIn { started } => {
                let elapsed = now.saturating_duration_since(started);
                if elapsed < timings.fade_in {
                    set_opacity(doc, transition.wrapper, Some(progress(elapsed, timings.fade_in)))?;
                    return Ok(false);
                }
                let inserted = doc.unwrap(transition.wrapper)?;
                log::trace!(
                    target: "lazy_views.replace",
                    "settled {} node(s) at {:?}",
                    inserted.len(),
                    transition.target
                );
                host.attach_behaviors(doc, &inserted, &transition.settings);
                return Ok(true);
            }
        }
    }
}

fn progress(elapsed: Duration, total: Duration) -> f64 {
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

fn set_opacity(doc: &mut Document, node: NodeId, opacity: Option<f64>) -> Result<(), DomError> {
    let value = opacity.map(|o| format!("{o:.3}"));
    doc.set_style_property(node, "opacity", value.as_deref())
}

/// Handler for `insert`: starts one transition per matched target.
pub struct InsertHandler;

impl CommandHandler for InsertHandler {
    fn handle(
        &mut self,
        command: &Command,
        _status: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        let Command::Insert(insert) = command else {
            return Err(HandlerError::Failed(format!(
                "insert handler cannot run {:?}",
                command.kind()
            )));
        };
        let method: InsertMethod = insert.method().parse()?;
        let selector = insert.selector.as_deref().unwrap_or("").trim();
        if selector.is_empty() {
            log::debug!(target: "lazy_views.replace", "insert without selector");
            return Ok(());
        }

        let targets = ctx.document.select(selector)?;
        if targets.is_empty() {
            log::debug!(target: "lazy_views.replace", "`{selector}` matched nothing");
            return Ok(());
        }

        let settings = insert
            .settings
            .clone()
            .unwrap_or_else(|| ctx.settings.as_value().clone());
        let markup = insert.data.as_deref().unwrap_or("");
        for target in targets {
            ctx.engine
                .begin(ctx.document, target, method, markup, settings.clone(), ctx.now)?;
        }
        Ok(())
    }
}
