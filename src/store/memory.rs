//! In-memory `EnvStore` used by the test suites in place of the registry.

use super::EnvStore;
use crate::error::{AppError, Result};
use crate::models::EnvVarSet;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub vars: EnvVarSet,
    /// Names whose `set` is rejected, mimicking a failing `setx`.
    pub rejected: HashSet<String>,
    /// Names whose `delete` is refused even if present.
    pub protected: HashSet<String>,
    /// When set, `enumerate` fails with this error.
    pub enumerate_error: Option<AppError>,
}

impl InMemoryStore {
    pub fn with_vars(vars: EnvVarSet) -> Self {
        Self {
            vars,
            ..Self::default()
        }
    }
}

impl EnvStore for InMemoryStore {
    fn enumerate(&self) -> Result<EnvVarSet> {
        match &self.enumerate_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.vars.clone()),
        }
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        if self.rejected.contains(name) {
            return Err(AppError::CommandFailed {
                program: "setx".to_string(),
                code: Some(1),
                stderr: "ERROR: Invalid syntax.".to_string(),
            });
        }
        self.vars.insert(name, value);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        if self.protected.contains(name) || !self.vars.contains(name) {
            return Err(AppError::CommandFailed {
                program: "reg".to_string(),
                code: Some(1),
                stderr:
                    "ERROR: The system was unable to find the specified registry key or value."
                        .to_string(),
            });
        }
        self.vars.remove(name);
        Ok(())
    }
}
