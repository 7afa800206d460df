//! Command dispatch.
//!
//! Commands run strictly in response order through a typed table keyed by
//! `CommandKind`. A handler error is recorded and the remaining commands are
//! still attempted; the layout freeze is released whatever happens.
use std::collections::HashMap;
use std::time::Instant;

use html::Document;

use crate::command::{Command, CommandKind};
use crate::error::HandlerError;
use crate::freeze::LayoutFreeze;
use crate::host::PageHost;
use crate::merge::SettingsHandler;
use crate::replace::{InsertHandler, ReplacementEngine};
use crate::settings::Settings;

/// Mutable page state a handler may touch.
pub struct DispatchContext<'a> {
    pub document: &'a mut Document,
    pub settings: &'a mut Settings,
    pub engine: &'a mut ReplacementEngine,
    /// Dispatch time; transitions started by handlers count from here.
    pub now: Instant,
}

pub trait CommandHandler {
    fn handle(
        &mut self,
        command: &Command,
        status: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), HandlerError>;
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Kinds whose handler was invoked, in invocation order.
    pub dispatched: Vec<CommandKind>,
    /// Commands without a recognized kind or a registered handler.
    pub skipped: usize,
    pub failures: Vec<(CommandKind, HandlerError)>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CommandRegistry {
    handlers: HashMap<CommandKind, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry with the built-in `insert` and `settings` handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(CommandKind::Insert, Box::new(InsertHandler));
        registry.register(CommandKind::Settings, Box::new(SettingsHandler));
        registry
    }

    /// Installs `handler` for `kind`, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: CommandKind,
        handler: Box<dyn CommandHandler>,
    ) -> Option<Box<dyn CommandHandler>> {
        self.handlers.insert(kind, handler)
    }

    pub fn unregister(&mut self, kind: CommandKind) -> Option<Box<dyn CommandHandler>> {
        self.handlers.remove(&kind)
    }

    pub fn is_registered(&self, kind: CommandKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn dispatch(
        &mut self,
        commands: &[Command],
        status: &str,
        ctx: &mut DispatchContext<'_>,
        host: &dyn PageHost,
    ) -> DispatchReport {
        let height = host.rendered_height(ctx.document);
        let mut frozen = LayoutFreeze::engage(ctx, height);
        let mut report = DispatchReport::default();

        for command in commands {
            let Some(kind) = command.kind() else {
                log::trace!(target: "lazy_views.dispatch", "skipping {command:?}");
                report.skipped += 1;
                continue;
            };
            let Some(handler) = self.handlers.get_mut(&kind) else {
                log::debug!(target: "lazy_views.dispatch", "no handler for `{kind}`");
                report.skipped += 1;
                continue;
            };

            log::debug!(target: "lazy_views.dispatch", "dispatching `{kind}` ({status})");
            report.dispatched.push(kind);
            if let Err(err) = handler.handle(command, status, &mut frozen) {
                log::warn!(target: "lazy_views.dispatch", "`{kind}` handler failed: {err}");
                report.failures.push((kind, err));
            }
        }

        report
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::decode_commands;
    use crate::host::HeadlessHost;
    use crate::replace::FadeTimings;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl CommandHandler for Recorder {
        fn handle(
            &mut self,
            _command: &Command,
            status: &str,
            ctx: &mut DispatchContext<'_>,
        ) -> Result<(), HandlerError> {
            let frozen = !ctx.document.select("#freeze-height").unwrap().is_empty();
            self.log
                .borrow_mut()
                .push(format!("{}:{status}:{frozen}", self.name));
            if self.fail {
                return Err(HandlerError::Failed(format!("{} refused", self.name)));
            }
            Ok(())
        }
    }

    fn recording_registry(log: &Rc<RefCell<Vec<String>>>, fail_insert: bool) -> CommandRegistry {
        let mut registry = CommandRegistry::empty();
        registry.register(
            CommandKind::Insert,
            Box::new(Recorder {
                name: "insert",
                log: Rc::clone(log),
                fail: fail_insert,
            }),
        );
        registry.register(
            CommandKind::Settings,
            Box::new(Recorder {
                name: "settings",
                log: Rc::clone(log),
                fail: false,
            }),
        );
        registry
    }

    fn run(registry: &mut CommandRegistry, body: serde_json::Value) -> (DispatchReport, Document) {
        let mut document = Document::parse("<body></body>");
        let mut settings = Settings::default();
        let mut engine = ReplacementEngine::new(FadeTimings::default());
        let commands = decode_commands(body.to_string().as_bytes()).unwrap();
        let report = {
            let mut ctx = DispatchContext {
                document: &mut document,
                settings: &mut settings,
                engine: &mut engine,
                now: Instant::now(),
            };
            registry.dispatch(&commands, "success", &mut ctx, &HeadlessHost::new())
        };
        (report, document)
    }

    #[test]
    fn handlers_run_in_response_order() {
        let insert = json!({"command": "insert", "selector": "#x"});
        let settings = json!({"command": "settings", "settings": {}});

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = recording_registry(&log, false);
        run(&mut registry, json!([insert, settings]));
        assert_eq!(
            *log.borrow(),
            ["insert:success:true", "settings:success:true"]
        );

        log.borrow_mut().clear();
        let (report, _) = run(&mut registry, json!([settings, insert]));
        assert_eq!(
            *log.borrow(),
            ["settings:success:true", "insert:success:true"]
        );
        assert_eq!(
            report.dispatched,
            [CommandKind::Settings, CommandKind::Insert]
        );
    }

    #[test]
    fn unknown_commands_are_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = recording_registry(&log, false);
        registry.unregister(CommandKind::Settings);

        let (report, _) = run(
            &mut registry,
            json!([
                {"command": "alert", "text": "hi"},
                {"selector": "#x"},
                {"command": "settings", "settings": {}},
                {"command": "insert"},
            ]),
        );
        assert_eq!(*log.borrow(), ["insert:success:true"]);
        assert_eq!(report.skipped, 3);
        assert!(report.is_clean());
    }

    #[test]
    fn failing_handler_does_not_stop_dispatch_or_leak_the_freeze() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = recording_registry(&log, true);

        let (report, document) = run(
            &mut registry,
            json!([
                {"command": "insert"},
                {"command": "settings", "settings": {}},
            ]),
        );
        assert_eq!(
            *log.borrow(),
            ["insert:success:true", "settings:success:true"]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, CommandKind::Insert);
        assert!(document.select("#freeze-height").unwrap().is_empty());
    }

    #[test]
    fn register_returns_the_replaced_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = CommandRegistry::with_defaults();
        assert!(registry.is_registered(CommandKind::Insert));
        let previous = registry.register(
            CommandKind::Insert,
            Box::new(Recorder {
                name: "custom",
                log: Rc::clone(&log),
                fail: false,
            }),
        );
        assert!(previous.is_some());

        run(&mut registry, json!([{"command": "insert"}]));
        assert_eq!(*log.borrow(), ["custom:success:true"]);
    }
}
