use std::fmt;
use std::str::FromStr;

/// Package ecosystems the engine can list content for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Os,
    Npm,
    Gem,
    Python,
    Java,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Os,
        ContentType::Npm,
        ContentType::Gem,
        ContentType::Python,
        ContentType::Java,
    ];

    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "os" => Some(ContentType::Os),
            "npm" => Some(ContentType::Npm),
            "gem" => Some(ContentType::Gem),
            "python" => Some(ContentType::Python),
            "java" => Some(ContentType::Java),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Os => "os",
            ContentType::Npm => "npm",
            ContentType::Gem => "gem",
            ContentType::Python => "python",
            ContentType::Java => "java",
        }
    }
}

/// Report kinds, each backed by one `anchore-cli` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Content,
    Vuln,
    Details,
    Policy,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] =
        [ReportKind::Content, ReportKind::Vuln, ReportKind::Details, ReportKind::Policy];

    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "content" => Some(ReportKind::Content),
            "vuln" => Some(ReportKind::Vuln),
            "details" => Some(ReportKind::Details),
            "policy" => Some(ReportKind::Policy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Content => "content",
            ReportKind::Vuln => "vuln",
            ReportKind::Details => "details",
            ReportKind::Policy => "policy",
        }
    }

    /// Policy evaluation exits non-zero on a failed policy but still prints valid JSON.
    pub fn tolerates_failure(&self) -> bool {
        matches!(self, ReportKind::Policy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VulnType {
    #[default]
    All,
    NonOs,
    Os,
}

impl VulnType {
    pub const ALL: [VulnType; 3] = [VulnType::All, VulnType::NonOs, VulnType::Os];

    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Some(VulnType::All),
            "non-os" => Some(VulnType::NonOs),
            "os" => Some(VulnType::Os),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnType::All => "all",
            VulnType::NonOs => "non-os",
            VulnType::Os => "os",
        }
    }
}

macro_rules! name_impls {
    ($ty:ty, $label:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::from_name(s).ok_or_else(|| {
                    let valid: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
                    format!("'{s}' is not a valid {} (expected one of: {})", $label, valid.join(", "))
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

name_impls!(ContentType, "content type");
name_impls!(ReportKind, "report type");
name_impls!(VulnType, "vulnerability type");

/// One command-line selection: either a concrete member or the `all` shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    One(T),
}

impl<T: FromStr<Err = String>> FromStr for Choice<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Choice::All)
        } else {
            s.parse::<T>().map(Choice::One)
        }
    }
}

/// Expand a selection list. `all` anywhere (or an empty list) selects every
/// member in catalogue order; otherwise the given order is kept without duplicates.
pub fn resolve_choices<T: Copy + PartialEq>(choices: &[Choice<T>], catalogue: &[T]) -> Vec<T> {
    if choices.is_empty() || choices.iter().any(|choice| matches!(choice, Choice::All)) {
        return catalogue.to_vec();
    }

    let mut selected = Vec::new();
    for choice in choices {
        if let Choice::One(value) = choice
            && !selected.contains(value)
        {
            selected.push(*value);
        }
    }
    selected
}
