//! Persistent environment variable storage.
//!
//! Includes:
//! - `EnvStore`: the key-value interface the CLI depends on.
//! - `registry`: the Windows implementation (`HKCU\Environment`, `setx`, `reg delete`).
//! - `process`: structured external command invocation used by the registry store.
//! - `memory`: an in-memory fake used by the test suites.

#[cfg(test)]
mod memory;
mod process;
mod registry;

#[cfg(test)]
pub use memory::*;
#[cfg(test)]
pub(crate) use process::testing;
pub use process::*;
pub use registry::*;

use crate::error::Result;
use crate::models::EnvVarSet;

/// A store of persisted, user-level environment variables.
pub trait EnvStore {
    /// Reads every variable currently persisted, in store order.
    fn enumerate(&self) -> Result<EnvVarSet>;

    /// Creates or overwrites a variable.
    fn set(&mut self, name: &str, value: &str) -> Result<()>;

    /// Removes a variable. Removing a name that does not exist is an error.
    fn delete(&mut self, name: &str) -> Result<()>;
}
