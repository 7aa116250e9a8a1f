//! Choosing the active provider.
//!
//! Precedence, highest first:
//!
//! 1. the `IMGSRC_PROVIDER` environment override,
//! 2. the configured provider, unless it is `"auto"`,
//! 3. the hosting platform's own optimizer, from the platform signal,
//! 4. nothing: setup installs the self-hosted fallback.
//!
//! The environment is never read here. Callers pass the override and the
//! [`Platform`] in, which keeps [`detect_provider`] a pure function.

use std::fmt;
use std::str::FromStr;

/// Environment variable that overrides the configured provider.
pub const ENV_PROVIDER: &str = "IMGSRC_PROVIDER";

/// Sentinel provider name meaning "decide for me".
pub const AUTO: &str = "auto";

/// Hosting platform the process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Unknown,
    Vercel,
    AwsAmplify,
}

/// Platform signal → provider with native image optimization.
const AUTODETECTABLE: [(Platform, &str); 2] = [
    (Platform::Vercel, "vercel"),
    (Platform::AwsAmplify, "awsAmplify"),
];

impl Platform {
    /// Detect the platform from environment variables, read through `lookup`.
    pub fn detect(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());
        if is_set("VERCEL") || is_set("VERCEL_ENV") {
            Self::Vercel
        } else if is_set("AWS_APP_ID") {
            Self::AwsAmplify
        } else {
            Self::Unknown
        }
    }

    /// [`Platform::detect`] against the process environment.
    pub fn from_env() -> Self {
        Self::detect(|key| std::env::var(key).ok())
    }

    /// Provider this platform maps to, if it has a native optimizer.
    pub fn provider(self) -> Option<&'static str> {
        AUTODETECTABLE
            .iter()
            .find(|(platform, _)| *platform == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::Vercel => "vercel",
            Self::AwsAmplify => "aws_amplify",
        })
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" | "" => Ok(Self::Unknown),
            "vercel" => Ok(Self::Vercel),
            "aws_amplify" | "aws-amplify" => Ok(Self::AwsAmplify),
            other => Err(format!(
                "unknown platform `{other}` (expected vercel, aws_amplify or unknown)"
            )),
        }
    }
}

/// Resolve the provider name, or `None` when the fallback should apply.
pub fn detect_provider(
    user_input: Option<&str>,
    env_override: Option<&str>,
    platform: Platform,
) -> Option<String> {
    if let Some(name) = env_override.map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }
    if let Some(name) = user_input
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != AUTO)
    {
        return Some(name.to_string());
    }
    platform.provider().map(str::to_string)
}
