use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, GeneralConfig, RunConfig, load_config, load_config_from_path};

#[derive(Parser, Debug, Default)]
#[command(
    name = "sysdash",
    version,
    about = "Live terminal dashboard for memory, sessions and CPU usage",
    override_usage = "sysdash [OPTIONS] [SAMPLES] [TDELAY]"
)]
pub struct Cli {
    /// Show only system usage (memory and CPU)
    #[arg(long)]
    pub system: bool,

    /// Show only logged-in sessions
    #[arg(long)]
    pub user: bool,

    /// Draw trend graphs next to memory and CPU history
    #[arg(long)]
    pub graphics: bool,

    /// Append one block per iteration instead of redrawing the screen
    #[arg(long)]
    pub sequential: bool,

    /// Number of samples to take (overrides the positional SAMPLES)
    #[arg(long, value_name = "N", require_equals = true)]
    pub samples: Option<u64>,

    /// Seconds between samples (overrides the positional TDELAY)
    #[arg(long, value_name = "T", require_equals = true)]
    pub tdelay: Option<u64>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write JSON logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Reasons `--name=value` does not yield a value for `name`.
///
/// Each maps to a stable negative code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlagValueError {
    #[error("empty flag or flag name")]
    Missing,
    #[error("flag does not start with \"--\"")]
    NoPrefix,
    #[error("flag name not present")]
    NameAbsent,
    #[error("flag name does not follow \"--\" directly")]
    NameMisplaced,
    #[error("no '=' after the flag name")]
    NoEquals,
    #[error("value is not a non-negative integer")]
    BadValue,
}

impl FlagValueError {
    pub fn code(self) -> i32 {
        match self {
            FlagValueError::Missing => -1,
            FlagValueError::NoPrefix => -2,
            FlagValueError::NameAbsent => -3,
            FlagValueError::NameMisplaced => -4,
            FlagValueError::NoEquals => -5,
            FlagValueError::BadValue => -6,
        }
    }
}

/// Reads the value of a `--<name>=<value>` token.
pub fn extract_flag_value(flag: &str, name: &str) -> Result<u64, FlagValueError> {
    if flag.is_empty() || name.is_empty() {
        return Err(FlagValueError::Missing);
    }
    let rest = flag.strip_prefix("--").ok_or(FlagValueError::NoPrefix)?;
    match rest.find(name) {
        None => return Err(FlagValueError::NameAbsent),
        Some(0) => {}
        Some(_) => return Err(FlagValueError::NameMisplaced),
    }
    let value = rest[name.len()..]
        .strip_prefix('=')
        .ok_or(FlagValueError::NoEquals)?;
    value.parse().map_err(|_| FlagValueError::BadValue)
}

fn clap_summary(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("only a maximum of two positional arguments can be provided")]
    TooManyPositionals,
    #[error("positional arguments must be contiguous")]
    NotContiguous,
    #[error("unsupported argument: \"{token}\" ({reason})")]
    FlagValue {
        token: String,
        reason: FlagValueError,
    },
    #[error("cannot have a delay of 0s")]
    ZeroDelay,
    #[error("must take at least one sample")]
    NoSamples,
    #[error("{}", clap_summary(.0))]
    Clap(clap::Error),
}

/// `[SAMPLES] [TDELAY]` as given on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Positionals {
    pub samples: Option<u64>,
    pub tdelay: Option<u64>,
}

/// Pulls the bare integer arguments out of `args`, leaving the flags for clap.
///
/// Positionals may sit anywhere among the flags but must be adjacent to each
/// other. `--samples=`/`--tdelay=` tokens are checked here so a malformed
/// value is reported against the original token.
pub fn split_positionals<I, T>(args: I) -> Result<(Vec<OsString>, Positionals), ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut rest: Vec<OsString> = args.next().into_iter().collect();
    let mut positionals = Positionals::default();
    let mut last_positional = None;

    for (index, arg) in args.enumerate() {
        let Some(token) = arg.to_str() else {
            rest.push(arg);
            continue;
        };

        if let Ok(value) = token.parse::<u64>() {
            match (positionals.samples, positionals.tdelay) {
                (None, _) => positionals.samples = Some(value),
                (Some(_), None) if last_positional.map(|i| i + 1) == Some(index) => {
                    positionals.tdelay = Some(value)
                }
                (Some(_), None) => return Err(ArgsError::NotContiguous),
                (Some(_), Some(_)) => return Err(ArgsError::TooManyPositionals),
            }
            last_positional = Some(index);
            continue;
        }

        for name in ["samples", "tdelay"] {
            if token.starts_with(&format!("--{name}")) {
                extract_flag_value(token, name).map_err(|reason| ArgsError::FlagValue {
                    token: token.to_string(),
                    reason,
                })?;
            }
        }
        rest.push(arg);
    }

    Ok((rest, positionals))
}

/// A parsed command line, before defaults from the config file are applied.
#[derive(Debug, Default)]
pub struct Invocation {
    pub cli: Cli,
    pub positionals: Positionals,
}

impl Invocation {
    pub fn parse_from<I, T>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let (rest, positionals) = split_positionals(args)?;
        let cli = Cli::try_parse_from(rest).map_err(ArgsError::Clap)?;
        Ok(Invocation { cli, positionals })
    }

    pub fn load_config(&self) -> Config {
        match &self.cli.config {
            Some(path) => load_config_from_path(path),
            None => load_config(),
        }
    }

    /// Flags win over positionals, which win over the config file.
    pub fn resolve(&self, defaults: &GeneralConfig) -> Result<RunConfig, ArgsError> {
        let Invocation { cli, positionals } = self;

        let samples = cli
            .samples
            .or(positionals.samples)
            .unwrap_or(defaults.samples);
        let tdelay = cli.tdelay.or(positionals.tdelay).unwrap_or(defaults.tdelay);

        if tdelay == 0 {
            return Err(ArgsError::ZeroDelay);
        }
        if samples == 0 {
            return Err(ArgsError::NoSamples);
        }

        Ok(RunConfig {
            sample_count: usize::try_from(samples).unwrap_or(usize::MAX),
            interval_secs: tdelay,
            show_system_only: cli.system,
            show_users_only: cli.user,
            show_graphics: cli.graphics || defaults.graphics,
            sequential_mode: cli.sequential || defaults.sequential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_value_for_matching_name() {
        assert_eq!(extract_flag_value("--samples=15", "samples"), Ok(15));
        assert_eq!(extract_flag_value("--tdelay=2", "tdelay"), Ok(2));
    }

    #[test]
    fn flag_value_error_codes_are_negative() {
        let cases = [
            ("", "samples", -1),
            ("samples=15", "samples", -2),
            ("--samples=15", "tdelay", -3),
            ("--bad", "samples", -3),
            ("--xsamples=15", "samples", -4),
            ("--samples15", "samples", -5),
            ("--samples=15s", "samples", -6),
            ("--samples=", "samples", -6),
        ];
        for (flag, name, code) in cases {
            let err = extract_flag_value(flag, name).unwrap_err();
            assert_eq!(err.code(), code, "{flag} / {name}");
        }
    }

    #[test]
    fn positionals_between_flags() {
        let (rest, pos) =
            split_positionals(["sysdash", "--graphics", "8", "2", "--user"]).unwrap();
        assert_eq!(
            pos,
            Positionals {
                samples: Some(8),
                tdelay: Some(2)
            }
        );
        assert_eq!(rest, vec!["sysdash", "--graphics", "--user"]);
    }

    #[test]
    fn separated_positionals_are_rejected() {
        let err = split_positionals(["sysdash", "8", "--graphics", "2"]).unwrap_err();
        assert!(matches!(err, ArgsError::NotContiguous));
    }

    #[test]
    fn third_positional_is_rejected() {
        let err = split_positionals(["sysdash", "8", "2", "4"]).unwrap_err();
        assert!(matches!(err, ArgsError::TooManyPositionals));
    }

    #[test]
    fn malformed_samples_flag_names_the_token() {
        let err = split_positionals(["sysdash", "--samples=ten"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported argument: \"--samples=ten\" (value is not a non-negative integer)"
        );
    }
}
