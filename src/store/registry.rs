//! `EnvStore` backed by the current user's registry hive.
//!
//! Reads go straight to `HKCU\Environment` through the Win32 registry API.
//! Writes and deletes go through `setx` and `reg delete` so Windows broadcasts
//! the change to new sessions the same way it does for manual edits.

use super::process::{CommandRunner, SystemRunner};
use super::EnvStore;
use crate::error::Result;
use crate::models::EnvVarSet;
use tracing::{debug, info};

/// Registry path passed to `reg delete`.
pub const ENVIRONMENT_KEY: &str = r"HKCU\Environment";

/// Joins the entries of a `REG_MULTI_SZ` value for display.
pub const MULTI_SZ_SEPARATOR: &str = ";";

const SETX: &str = "setx";
const REG: &str = "reg";

// Registry value types, as defined in winnt.h.
#[cfg_attr(not(windows), allow(dead_code))]
const REG_SZ: u32 = 1;
#[cfg_attr(not(windows), allow(dead_code))]
const REG_EXPAND_SZ: u32 = 2;
#[cfg_attr(not(windows), allow(dead_code))]
const REG_MULTI_SZ: u32 = 7;
#[cfg_attr(not(windows), allow(dead_code))]
const REG_DWORD: u32 = 4;
#[cfg_attr(not(windows), allow(dead_code))]
const REG_QWORD: u32 = 11;

pub struct RegistryStore<R = SystemRunner> {
    runner: R,
}

impl RegistryStore<SystemRunner> {
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl<R: CommandRunner> RegistryStore<R> {
    /// Creates a store that runs `setx`/`reg` through the given runner.
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> EnvStore for RegistryStore<R> {
    fn enumerate(&self) -> Result<EnvVarSet> {
        let vars = read_user_environment()?;
        info!("Read {} variable(s) from {}", vars.len(), ENVIRONMENT_KEY);
        Ok(vars)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        debug!("Persisting '{}' via {}", name, SETX);
        let output = self.runner.run(SETX, &[name, value])?.into_result(SETX)?;
        debug!("{}: {}", SETX, output.stdout.trim());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        debug!("Deleting '{}' via {} delete", name, REG);
        let output = self
            .runner
            .run(REG, &["delete", ENVIRONMENT_KEY, "/F", "/V", name])?
            .into_result(REG)?;
        debug!("{}: {}", REG, output.stdout.trim());
        Ok(())
    }
}

/// Renders raw registry value data as text.
///
/// String types are decoded from UTF-16 up to the first NUL, without expanding
/// `%VAR%` references. Multi-strings are joined with `MULTI_SZ_SEPARATOR`.
/// Integers are rendered in decimal, anything else as hex.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn decode_value(kind: u32, data: &[u8]) -> String {
    match kind {
        REG_SZ | REG_EXPAND_SZ => {
            let wide = to_wide(data);
            let end = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
            String::from_utf16_lossy(&wide[..end])
        },
        REG_MULTI_SZ => {
            let wide = to_wide(data);
            let mut strings: Vec<String> = wide
                .split(|&c| c == 0)
                .map(String::from_utf16_lossy)
                .collect();
            // The list ends with an empty string, plus the one produced by the final NUL.
            while strings.last().is_some_and(|s| s.is_empty()) {
                strings.pop();
            }
            strings.join(MULTI_SZ_SEPARATOR)
        },
        REG_DWORD if data.len() >= 4 => {
            u32::from_le_bytes([data[0], data[1], data[2], data[3]]).to_string()
        },
        REG_QWORD if data.len() >= 8 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&data[..8]);
            u64::from_le_bytes(bytes).to_string()
        },
        _ => data.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

#[cfg_attr(not(windows), allow(dead_code))]
fn to_wide(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(not(windows))]
fn read_user_environment() -> Result<EnvVarSet> {
    Err(crate::error::AppError::UnsupportedPlatform(
        std::env::consts::OS.to_string(),
    ))
}

#[cfg(windows)]
use win::read_user_environment;

#[cfg(windows)]
mod win {
    use super::decode_value;
    use crate::error::{AppError, Result};
    use crate::models::EnvVarSet;
    use std::sync::Arc;
    use tracing::warn;
    use windows::core::{w, PWSTR};
    use windows::Win32::Foundation::{
        ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR,
    };
    use windows::Win32::System::Registry::{
        RegCloseKey, RegEnumValueW, RegOpenKeyExW, HKEY, HKEY_CURRENT_USER, KEY_READ,
    };

    /// Longest value name the registry allows, plus the terminating NUL.
    const MAX_VALUE_NAME: usize = 16_384;
    const INITIAL_DATA_LEN: usize = 4096;

    /// Closes the wrapped key on drop.
    struct OpenKey(HKEY);

    impl Drop for OpenKey {
        fn drop(&mut self) {
            // SAFETY: the handle came from a successful RegOpenKeyExW and is closed once.
            let _ = unsafe { RegCloseKey(self.0) };
        }
    }

    fn registry_error(status: WIN32_ERROR) -> AppError {
        AppError::Registry(Arc::new(std::io::Error::from_raw_os_error(
            status.0 as i32,
        )))
    }

    pub(super) fn read_user_environment() -> Result<EnvVarSet> {
        let mut handle = HKEY::default();
        // SAFETY: `handle` is a valid out-pointer for the duration of the call.
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                w!("Environment"),
                Some(0),
                KEY_READ,
                &raw mut handle,
            )
        };
        if status != ERROR_SUCCESS {
            return Err(registry_error(status));
        }
        let key = OpenKey(handle);

        let mut vars = EnvVarSet::new();
        let mut name_buf = vec![0u16; MAX_VALUE_NAME];
        let mut data_buf = vec![0u8; INITIAL_DATA_LEN];
        let mut index = 0u32;

        loop {
            let mut name_len = name_buf.len() as u32;
            let mut data_len = data_buf.len() as u32;
            let mut kind = 0u32;

            // SAFETY: buffer pointers and their lengths describe live, writable allocations.
            let status = unsafe {
                RegEnumValueW(
                    key.0,
                    index,
                    Some(PWSTR(name_buf.as_mut_ptr())),
                    &raw mut name_len,
                    None,
                    Some(&raw mut kind),
                    Some(data_buf.as_mut_ptr()),
                    Some(&raw mut data_len),
                )
            };

            if status == ERROR_NO_MORE_ITEMS {
                break;
            }
            if status == ERROR_MORE_DATA {
                let wanted = (data_len as usize).max(data_buf.len() * 2);
                data_buf.resize(wanted, 0);
                continue;
            }
            if status != ERROR_SUCCESS {
                warn!(
                    "Stopped enumerating registry values at index {}: {}",
                    index,
                    registry_error(status)
                );
                break;
            }

            let name = String::from_utf16_lossy(&name_buf[..name_len as usize]);
            let value = decode_value(kind, &data_buf[..data_len as usize]);
            vars.insert(name, value);
            index += 1;
        }

        Ok(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::store::testing::RecordingRunner;
    use crate::store::CommandOutput;

    fn utf16_bytes(s: &str) -> Vec<u8> {
        s.encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(|c| c.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_set_passes_value_as_single_argument() {
        let mut store = RegistryStore::with_runner(RecordingRunner::default());
        store.set("GREETING", r#"say "hi" & ^exit"#).unwrap();

        let calls = store.runner().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "setx");
        assert_eq!(calls[0].1, vec!["GREETING", r#"say "hi" & ^exit"#]);
    }

    #[test]
    fn test_delete_targets_user_environment_key() {
        let mut store = RegistryStore::with_runner(RecordingRunner::default());
        store.delete("OLD_VAR").unwrap();

        let calls = store.runner().calls.borrow();
        assert_eq!(calls[0].0, "reg");
        assert_eq!(
            calls[0].1,
            vec!["delete", r"HKCU\Environment", "/F", "/V", "OLD_VAR"]
        );
    }

    #[test]
    fn test_non_zero_exit_becomes_command_failed() {
        let runner = RecordingRunner::default();
        runner.push_output(Ok(CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "ERROR: The system was unable to find the specified registry key or value."
                .to_string(),
        }));
        let mut store = RegistryStore::with_runner(runner);

        match store.delete("MISSING") {
            Err(AppError::CommandFailed { program, code, .. }) => {
                assert_eq!(program, "reg");
                assert_eq!(code, Some(1));
            },
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_spawn_error_is_propagated() {
        let runner = RecordingRunner::default();
        runner.push_output(Err(AppError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "setx not found",
        ))));
        let mut store = RegistryStore::with_runner(runner);
        assert!(matches!(store.set("A", "B"), Err(AppError::Io(_))));
    }

    #[test]
    fn test_decode_string_values() {
        assert_eq!(decode_value(REG_SZ, &utf16_bytes("C:\\tools")), "C:\\tools");
        assert_eq!(
            decode_value(REG_EXPAND_SZ, &utf16_bytes("%USERPROFILE%\\bin")),
            "%USERPROFILE%\\bin"
        );
        assert_eq!(decode_value(REG_SZ, &utf16_bytes("héllo wörld")), "héllo wörld");
        assert_eq!(decode_value(REG_SZ, &[]), "");
    }

    #[test]
    fn test_decode_multi_string_value() {
        let mut data: Vec<u8> = ["first", "sec ond", "third"]
            .iter()
            .flat_map(|s| utf16_bytes(s))
            .collect();
        data.extend_from_slice(&[0, 0]);

        assert_eq!(decode_value(REG_MULTI_SZ, &data), "first;sec ond;third");
        assert_eq!(decode_value(REG_MULTI_SZ, &[0, 0]), "");
        assert_eq!(decode_value(REG_MULTI_SZ, &utf16_bytes("only")), "only");
    }

    #[test]
    fn test_decode_integer_and_binary_values() {
        assert_eq!(decode_value(REG_DWORD, &42u32.to_le_bytes()), "42");
        assert_eq!(
            decode_value(REG_QWORD, &(1u64 << 40).to_le_bytes()),
            "1099511627776"
        );
        assert_eq!(decode_value(3, &[0xde, 0xad, 0x01]), "dead01");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_enumerate_is_unsupported_off_windows() {
        let store = RegistryStore::with_runner(RecordingRunner::default());
        assert!(matches!(
            store.enumerate(),
            Err(AppError::UnsupportedPlatform(_))
        ));
    }
}
