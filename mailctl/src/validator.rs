//! Arity validation of a parsed command against its catalog entry

use crate::{
    catalog::CommandSpec,
    error::{CliError, Result},
};

/// Check that `arguments` (the tokens after the command name) fit `spec`
///
/// Only the token count is inspected; argument content is left to the
/// remote capability.
///
/// # Errors
///
/// Returns [`CliError::InvalidArgumentCount`] when the arity is not met
pub fn validate(spec: &CommandSpec, arguments: &[String]) -> Result<()> {
    let tokens = arguments.len() + 1;
    if spec.arity.accepts(tokens) {
        Ok(())
    } else {
        Err(CliError::InvalidArgumentCount {
            command: spec.name,
            expected: spec.arity,
            got: tokens,
        })
    }
}
