// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)

//! Variable expansion for configuration values.
//!
//! Values such as `https://${VAULT_NAME}.vault.example.net` are expanded
//! after the TOML is parsed.

use crate::error::RenewalError;

/// Expand `${VARIABLE_NAME}` references in a string.
///
/// Built-in resolvers:
///
/// - `${HOSTNAME}` - Short host name of this machine
/// - `${USERNAME}` - Current username
/// - `${HOME}` - Home directory
/// - `${TEMP}` / `${TMP}` - Temporary directory
///
/// Anything else is looked up in the process environment. Unknown variables
/// and unclosed `${` are left unchanged.
///
/// # Examples
///
/// ```
/// use cert_renewal_trigger::config::expand_variables;
///
/// let result = expand_variables("plain text").unwrap();
/// assert_eq!(result, "plain text");
/// ```
pub fn expand_variables(input: &str) -> Result<String, RenewalError> {
    let mut result = input.to_string();
    let mut start = 0;

    while let Some(var_start) = result[start..].find("${") {
        let absolute_start = start + var_start;

        if let Some(var_end) = result[absolute_start..].find('}') {
            let absolute_end = absolute_start + var_end;
            let var_name = &result[absolute_start + 2..absolute_end];

            if let Some(value) = get_variable_value(var_name) {
                result.replace_range(absolute_start..absolute_end + 1, &value);
                // Resume after the substituted text so values are not re-expanded
                start = absolute_start + value.len();
            } else {
                start = absolute_end + 1;
            }
        } else {
            start = absolute_start + 2;
        }
    }

    Ok(result)
}

fn get_variable_value(name: &str) -> Option<String> {
    match name {
        "HOSTNAME" | "COMPUTERNAME" => get_host_name(),
        "USERNAME" => get_username(),
        "HOME" | "USERPROFILE" => dirs::home_dir().map(|p| p.to_string_lossy().into_owned()),
        "TEMP" | "TMP" => Some(std::env::temp_dir().to_string_lossy().into_owned()),
        _ => std::env::var(name).ok(),
    }
}

fn get_host_name() -> Option<String> {
    if let Ok(name) = std::env::var("HOSTNAME") {
        return Some(name);
    }

    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .map(|s| s.split('.').next().unwrap_or(&s).to_string())
}

fn get_username() -> Option<String> {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .ok()
}
