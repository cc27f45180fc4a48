//! Command dispatch: bridges CLI args -> backend calls -> output formatting.

pub mod alarms;
pub mod config_cmd;
pub mod watch;

use siren_core::{CoreError, NotifierConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: NotifierConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Alarms(args) => alarms::handle(&config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Classify a REST failure: transport problems become a connection
/// diagnostic pointing at the backend URL.
pub(crate) fn map_api_error(url: &url::Url, err: siren_api::Error) -> CliError {
    if err.is_transient() {
        CliError::ConnectionFailed {
            url: url.to_string(),
            source: CoreError::Api(err),
        }
    } else {
        CliError::Core(CoreError::Api(err))
    }
}
