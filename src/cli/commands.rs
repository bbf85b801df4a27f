use super::console::Console;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::files::{read_import_file, write_export_file, ImportRow};
use crate::models::{BatchReport, EnvVarSet};
use crate::store::EnvStore;
use clap::Parser;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Menu lines, in display order.
pub const MENU_OPTIONS: [&str; 4] = [
    "1. Show all environment variables",
    "2. Add a new environment variable permanently",
    "3. Delete an environment variable permanently",
    "4. Exit",
];

/// Printed instead of the menu on non-Windows hosts.
pub const PLATFORM_MESSAGE: &str = "This program is designed to work only on Windows.";

/// Interactive manager for persistent Windows user environment variables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {}

/// An entry of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// List variables from the registry, optionally exporting them to CSV
    Show,
    /// Persist one variable, or every row of `input/to_add.csv`
    Add,
    /// Remove one variable, or every row of `input/to_delete.csv`
    Delete,
    Exit,
}

impl FromStr for MenuAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(MenuAction::Show),
            "2" => Ok(MenuAction::Add),
            "3" => Ok(MenuAction::Delete),
            "4" => Ok(MenuAction::Exit),
            other => Err(AppError::Cli(format!("Invalid menu choice '{}'", other))),
        }
    }
}

/// Fails with `AppError::UnsupportedPlatform` unless `os` is Windows.
///
/// Takes the OS name (as in `std::env::consts::OS`) so it can be checked off-host.
pub fn check_platform(os: &str) -> Result<()> {
    if os == "windows" {
        Ok(())
    } else {
        Err(AppError::UnsupportedPlatform(os.to_string()))
    }
}

/// Reports an unsupported host on `console` and returns `false`; returns `true` on Windows.
///
/// Runs before configuration is loaded, so a refusal touches no file and no registry key.
pub fn ensure_supported_platform<C: Console>(os: &str, console: &mut C) -> bool {
    match check_platform(os) {
        Ok(()) => true,
        Err(e) => {
            info!("Refusing to start: {}", e);
            console.warn(PLATFORM_MESSAGE);
            false
        },
    }
}

/// CLI application
pub struct App<S, C> {
    store: S,
    console: C,
    config: AppConfig,
}

impl<S: EnvStore, C: Console> App<S, C> {
    pub fn new(store: S, console: C, config: AppConfig) -> Self {
        Self {
            store,
            console,
            config,
        }
    }

    /// Runs the main menu until the user exits.
    ///
    /// Action failures are printed and the menu resumes; only console failures
    /// end the loop with an error.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu();
            let choice = self.console.prompt("Enter your choice (1/2/3/4)")?;

            let action = match choice.parse::<MenuAction>() {
                Ok(action) => action,
                Err(_) => {
                    self.console
                        .error("Invalid choice! Please select a valid option.");
                    continue;
                },
            };

            if action == MenuAction::Exit {
                self.console.say("Exiting the program...");
                break;
            }

            if let Err(e) = self.run_command(action) {
                if e.is_fatal() {
                    return Err(e);
                }
                error!("Command execution failed: {:?}", e);
                self.console
                    .error(&format!("Error executing command: {}", e));
            }
        }

        Ok(())
    }

    /// Runs a single menu action.
    pub fn run_command(&mut self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Show => self.show_env_variables(),
            MenuAction::Add => self.add_env_variable(),
            MenuAction::Delete => self.delete_env_variable(),
            MenuAction::Exit => Ok(()),
        }
    }

    fn print_menu(&mut self) {
        self.console.say("\nSelect an option:");
        for option in MENU_OPTIONS {
            self.console.say(option);
        }
    }

    /// Reads the current variables, degrading to an empty set on failure.
    fn load_env_variables(&mut self) -> EnvVarSet {
        match self.store.enumerate() {
            Ok(vars) => vars,
            Err(e) => {
                error!("Failed to enumerate environment variables: {:?}", e);
                self.console.error(&format!(
                    "Error reading environment variables from registry: {}",
                    e
                ));
                EnvVarSet::new()
            },
        }
    }

    /// Show all variables, then offer a CSV export
    fn show_env_variables(&mut self) -> Result<()> {
        self.console
            .say("\nCurrent Environment Variables (from registry):\n");
        let vars = self.load_env_variables();
        for var in &vars {
            self.console.say(&format!("{}: {}", var.name, var.value));
        }
        self.console.say("");

        if self
            .console
            .confirm("Do you want to save the variables to a CSV file?")?
        {
            self.export_env_variables(&vars)?;
        }
        Ok(())
    }

    fn export_env_variables(&mut self, vars: &EnvVarSet) -> Result<()> {
        let path = self.config.export_file();
        write_export_file(&path, vars)?;
        self.console.success(&format!(
            "\nEnvironment variables have been saved to {}\n",
            path.display()
        ));
        Ok(())
    }

    fn add_env_variable(&mut self) -> Result<()> {
        if self
            .console
            .confirm("Do you want to add variables from a CSV file?")?
        {
            let path = self.config.add_file();
            if let Some(report) = self.add_variables_from_csv(&path)? {
                self.console.say(&report.to_string());
            }
        } else {
            let name = self
                .console
                .prompt("Enter the name of the environment variable")?;
            let value = self
                .console
                .prompt("Enter the value of the environment variable")?;
            self.persist_env_variable(&name, &value);
        }
        Ok(())
    }

    /// Persists every valid row of `path`. Returns `None` if the file is missing.
    fn add_variables_from_csv(&mut self, path: &Path) -> Result<Option<BatchReport>> {
        info!("Adding variables from {}", path.display());
        let Some(rows) = self.read_rows(path)? else {
            return Ok(None);
        };

        let mut report = BatchReport::default();
        for row in rows {
            match row {
                ImportRow::Valid(var) => {
                    let ok = self.persist_env_variable(&var.name, &var.value);
                    report.record(ok);
                },
                ImportRow::Invalid(fields) => {
                    self.report_invalid_row(&fields);
                    report.skipped += 1;
                },
            }
        }

        info!("Add batch finished: {:?}", report);
        Ok(Some(report))
    }

    fn delete_env_variable(&mut self) -> Result<()> {
        if self
            .console
            .confirm("Do you want to delete variables from a CSV file?")?
        {
            let path = self.config.delete_file();
            if let Some(report) = self.delete_variables_from_csv(&path)? {
                self.console.say(&report.to_string());
            }
        } else {
            let name = self
                .console
                .prompt("Enter the name of the environment variable to delete")?;
            self.remove_env_variable(&name);
        }
        Ok(())
    }

    /// Removes the variable named in the first field of every valid row of `path`.
    fn delete_variables_from_csv(&mut self, path: &Path) -> Result<Option<BatchReport>> {
        info!("Deleting variables listed in {}", path.display());
        let Some(rows) = self.read_rows(path)? else {
            return Ok(None);
        };

        let mut report = BatchReport::default();
        for row in rows {
            match row {
                ImportRow::Valid(var) => {
                    let ok = self.remove_env_variable(&var.name);
                    report.record(ok);
                },
                ImportRow::Invalid(fields) => {
                    self.report_invalid_row(&fields);
                    report.skipped += 1;
                },
            }
        }

        info!("Delete batch finished: {:?}", report);
        Ok(Some(report))
    }

    /// Reads an import file, printing a notice instead of failing when it is missing.
    fn read_rows(&mut self, path: &Path) -> Result<Option<Vec<ImportRow>>> {
        match read_import_file(path) {
            Ok(rows) => Ok(Some(rows)),
            Err(AppError::InputFileMissing(missing)) => {
                self.console.error(&format!(
                    "File '{}' not found. Please ensure the file exists in the 'input' directory.",
                    missing.display()
                ));
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    fn report_invalid_row(&mut self, fields: &[String]) {
        warn!("Skipping row with {} field(s): {:?}", fields.len(), fields);
        self.console
            .warn(&format!("Invalid format in row: {:?}", fields));
    }

    /// Persists one variable and prints the outcome. Returns whether it succeeded.
    fn persist_env_variable(&mut self, name: &str, value: &str) -> bool {
        match self.store.set(name, value) {
            Ok(()) => {
                info!("Persisted '{}'", name);
                self.console.success(&format!(
                    "Permanently added '{}' with value '{}' to Windows environment variables.",
                    name, value
                ));
                self.console.say(
                    "Note: The variable will be visible in new sessions, but we will reload from the registry now.",
                );
                true
            },
            Err(e) => {
                error!("Failed to persist '{}': {:?}", name, e);
                self.console.error(&format!(
                    "Failed to add '{}' with value '{}' to environment variables. Error: {}",
                    name,
                    value,
                    failure_detail(&e)
                ));
                false
            },
        }
    }

    /// Removes one variable and prints the outcome. Returns whether it succeeded.
    fn remove_env_variable(&mut self, name: &str) -> bool {
        match self.store.delete(name) {
            Ok(()) => {
                info!("Removed '{}'", name);
                self.console.success(&format!(
                    "Removed '{}' from Windows environment variables.",
                    name
                ));
                self.console.say(
                    "Note: The variable will be removed in new sessions, but we will reload from the registry now.",
                );
                true
            },
            Err(e) => {
                error!("Failed to delete '{}': {:?}", name, e);
                self.console.error(&format!(
                    "Failed to delete '{}'. It may not exist or may be a system variable.",
                    name
                ));
                false
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn console(&self) -> &C {
        &self.console
    }
}

/// The captured stderr for command failures, the error itself otherwise.
fn failure_detail(err: &AppError) -> String {
    match err {
        AppError::CommandFailed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", MenuAction::Show)]
    #[case("2", MenuAction::Add)]
    #[case(" 3 ", MenuAction::Delete)]
    #[case("4", MenuAction::Exit)]
    fn test_menu_choice_parsing(#[case] input: &str, #[case] expected: MenuAction) {
        assert_eq!(input.parse::<MenuAction>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("0")]
    #[case("5")]
    #[case("show")]
    #[case("1.")]
    fn test_invalid_menu_choice(#[case] input: &str) {
        match input.parse::<MenuAction>() {
            Err(AppError::Cli(msg)) => assert!(msg.contains("Invalid menu choice")),
            other => panic!("Expected CliError, got {:?}", other),
        }
    }

    #[test]
    fn test_check_platform() {
        assert!(check_platform("windows").is_ok());
        for os in ["linux", "macos", "freebsd"] {
            match check_platform(os) {
                Err(AppError::UnsupportedPlatform(name)) => assert_eq!(name, os),
                other => panic!("Expected UnsupportedPlatform, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_failure_detail_prefers_stderr() {
        let err = AppError::CommandFailed {
            program: "setx".to_string(),
            code: Some(1),
            stderr: "ERROR: Invalid syntax.".to_string(),
        };
        assert_eq!(failure_detail(&err), "ERROR: Invalid syntax.");

        let err = AppError::CommandFailed {
            program: "setx".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(failure_detail(&err), "setx exited with no status: ");
    }
}
