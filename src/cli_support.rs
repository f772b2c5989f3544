//! Helpers shared by the `rosetta-*` binaries: logging setup and the small
//! hand-rolled flag parser both front ends use.

use crate::layout::LayoutOverrides;
use crate::ontology::LoadPolicy;
use anyhow::{Result, anyhow, bail};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "rosetta_shape_core=warn";
const LOG_FORMAT_ENV: &str = "ROSETTA_LOG_FORMAT";

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` controls the filter; `ROSETTA_LOG_FORMAT=json` switches to one
/// JSON object per event. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = env::var(LOG_FORMAT_ENV)
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Flags every binary accepts for locating inputs and choosing load policy.
#[derive(Debug, Default)]
pub struct CommonArgs {
    pub overrides: LayoutOverrides,
    pub policy: LoadPolicy,
}

impl CommonArgs {
    /// Consume `arg` (and its value) if it is a common flag.
    ///
    /// Returns `Ok(false)` for flags the caller must handle itself.
    pub fn accept<I>(&mut self, arg: &str, rest: &mut I) -> Result<bool>
    where
        I: Iterator<Item = OsString>,
    {
        match arg {
            "--ontology" => self.overrides.ontology_dir = Some(next_path(arg, rest)?),
            "--rules" => self.overrides.rules_path = Some(next_path(arg, rest)?),
            "--schema" => self.overrides.schema_path = Some(next_path(arg, rest)?),
            "--lenient" => self.policy = LoadPolicy::Lenient,
            "--strict" => self.policy = LoadPolicy::Strict,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

pub fn next_value<I>(flag: &str, args: &mut I) -> Result<String>
where
    I: Iterator<Item = OsString>,
{
    let value = args
        .next()
        .ok_or_else(|| anyhow!("{flag} requires a value"))?
        .into_string()
        .map_err(|_| anyhow!("{flag} must be valid UTF-8"))?;
    if value.trim().is_empty() {
        bail!("{flag} must not be empty");
    }
    Ok(value)
}

pub fn next_path<I>(flag: &str, args: &mut I) -> Result<PathBuf>
where
    I: Iterator<Item = OsString>,
{
    next_value(flag, args).map(PathBuf::from)
}

pub fn utf8(arg: OsString) -> Result<String> {
    arg.into_string()
        .map_err(|_| anyhow!("invalid UTF-8 in argument"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(items: &[&str]) -> std::vec::IntoIter<OsString> {
        items
            .iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn accepts_path_flags_and_policy() {
        let mut common = CommonArgs::default();
        let mut rest = os(&["/tmp/onto"]);
        assert!(common.accept("--ontology", &mut rest).unwrap());
        let mut rest = os(&[]);
        assert!(common.accept("--lenient", &mut rest).unwrap());
        assert!(!common.accept("--have", &mut rest).unwrap());
        assert_eq!(
            common.overrides.ontology_dir,
            Some(PathBuf::from("/tmp/onto"))
        );
        assert_eq!(common.policy, LoadPolicy::Lenient);
    }

    #[test]
    fn path_flag_requires_value() {
        let mut common = CommonArgs::default();
        let err = common.accept("--rules", &mut os(&[])).unwrap_err();
        assert!(err.to_string().contains("--rules requires a value"));
        let err = common.accept("--schema", &mut os(&["  "])).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
