//! History command implementation.

use crate::cli::HistoryArgs;
use crate::commands::{normalize, open_store};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use regula_domain::traits::AttemptLogStore;

/// Execute the history command.
pub fn execute_history(args: HistoryArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let query = normalize(args.kind.map(Into::into), &args.value)?;
    let store = open_store(config)?;

    let logs = store.find_attempts(query.kind(), query.value())?;
    println!("{}", formatter.format_history(&logs)?);

    Ok(())
}
