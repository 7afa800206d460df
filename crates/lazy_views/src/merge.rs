use crate::command::Command;
use crate::dispatch::{CommandHandler, DispatchContext};
use crate::error::HandlerError;

/// Handler for `settings`: deep-merges the patch when the merge flag is set,
/// otherwise leaves the store alone.
pub struct SettingsHandler;

impl CommandHandler for SettingsHandler {
    fn handle(
        &mut self,
        command: &Command,
        _status: &str,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), HandlerError> {
        let Command::Settings(update) = command else {
            return Err(HandlerError::Failed(format!(
                "settings handler cannot run {:?}",
                command.kind()
            )));
        };
        if !update.merge {
            log::debug!(target: "lazy_views.settings", "settings command without merge flag");
            return Ok(());
        }
        ctx.settings.merge_deep(&update.settings);
        Ok(())
    }
}
