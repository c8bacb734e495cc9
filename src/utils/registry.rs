//! Windows registry lookups through `reg query`.

use std::env;

use crate::command::{CommandRunner, Invocation};

pub trait Registry {
    /// Read a value under `key`. `None` as `name` reads the key's default value.
    fn value(&self, key: &str, name: Option<&str>) -> Option<String>;
}

pub struct RegQuery<'a> {
    runner: &'a dyn CommandRunner,
    wow64: bool,
}

impl<'a> RegQuery<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        // 64-bit Windows exposes ProgramFiles(x86); 32-bit installers land in Wow6432Node there
        let wow64 = env::var_os("ProgramFiles(x86)").is_some();
        Self { runner, wow64 }
    }

    fn query(&self, key: &str, name: Option<&str>) -> Option<String> {
        let invocation = Invocation::new("reg").arg("query").arg(key);
        let invocation = match name {
            Some(name) => invocation.arg("/v").arg(name),
            None => invocation.arg("/ve"),
        };

        let output = self.runner.run(&invocation).ok()?;
        if !output.success {
            return None;
        }
        parse_reg_value(&output.stdout)
    }
}

impl Registry for RegQuery<'_> {
    fn value(&self, key: &str, name: Option<&str>) -> Option<String> {
        if self.wow64 {
            if let Some(v) = self.query(&key.replace("\\Software\\", "\\Software\\Wow6432Node\\"), name) {
                return Some(v);
            }
        }
        self.query(key, name)
    }
}

// reg prints this in place of the data when a key has no default value
const VALUE_NOT_SET: &str = "(value not set)";

const COLUMN_SEPARATOR: &str = "    ";

/// Pull the data column out of `reg query` output:
///
/// ```text
/// HKEY_LOCAL_MACHINE\Software\Trayport
///     (Default)    REG_SZ    C:\Program Files\Trayport
/// ```
///
/// Value lines are indented and split into name, type and data by runs of
/// four spaces. Anything else is ignored.
pub fn parse_reg_value(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let row = line.strip_prefix(COLUMN_SEPARATOR)?;
        let mut columns = row.splitn(3, COLUMN_SEPARATOR);
        let _name = columns.next()?;
        let kind = columns.next()?;
        if !kind.starts_with("REG_") {
            return None;
        }
        let data = columns.next()?.trim();
        (!data.is_empty() && data != VALUE_NOT_SET).then(|| data.to_string())
    })
}
