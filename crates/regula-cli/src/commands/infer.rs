//! Infer command implementation.

use crate::cli::InferArgs;
use crate::commands::normalize;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the infer command.
pub fn execute_infer(args: InferArgs, formatter: &Formatter) -> Result<()> {
    let query = normalize(None, &args.value)?;
    println!("{}", formatter.format_query(&query)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;

    #[test]
    fn test_infer_recognized() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let args = InferArgs {
            value: "abc-1234".to_string(),
        };
        assert!(execute_infer(args, &formatter).is_ok());
    }

    #[test]
    fn test_infer_unrecognized() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let args = InferArgs {
            value: "hello".to_string(),
        };
        assert!(matches!(execute_infer(args, &formatter), Err(CliError::InvalidQuery(_))));
    }
}
