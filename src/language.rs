use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// Language of the texts in the tracking report. Unknown tags are passed
// through to the service as they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    De,
    Cs,
    Sk,
    Pl,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Cs => "cs",
            Language::Sk => "sk",
            Language::Pl => "pl",
            Language::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "en" => Language::En,
            "de" => Language::De,
            "cs" => Language::Cs,
            "sk" => Language::Sk,
            "pl" => Language::Pl,
            _ => Language::Other(s.to_string()),
        })
    }
}
