//! The four spiritual traditions a conversation can be held in.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Hindu,
    Muslim,
    Sikh,
    Christian,
}

/// Static presentation data for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainProfile {
    pub name: &'static str,
    pub native_name: &'static str,
    pub tagline: &'static str,
    pub title: &'static str,
    pub greeting: &'static str,
    pub placeholder: &'static str,
    pub thinking: &'static str,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Hindu, Domain::Muslim, Domain::Sikh, Domain::Christian];

    /// Used whenever a selector does not name a known domain.
    pub const DEFAULT: Domain = Domain::Hindu;

    /// Lenient selector parsing: unknown values fall back to [`Domain::DEFAULT`].
    pub fn from_selector(selector: &str) -> Domain {
        selector.parse().unwrap_or_else(|_| {
            warn!(selector, fallback = %Domain::DEFAULT, "Unknown domain selector, using default");
            Domain::DEFAULT
        })
    }

    pub fn id(self) -> &'static str {
        match self {
            Domain::Hindu => "hindu",
            Domain::Muslim => "muslim",
            Domain::Sikh => "sikh",
            Domain::Christian => "christian",
        }
    }

    /// File name of this domain's prompt template.
    pub fn template_name(self) -> &'static str {
        match self {
            Domain::Hindu => "hindu.txt",
            Domain::Muslim => "muslim.txt",
            Domain::Sikh => "sikh.txt",
            Domain::Christian => "christian.txt",
        }
    }

    pub fn profile(self) -> DomainProfile {
        match self {
            Domain::Hindu => DomainProfile {
                name: "Hindu",
                native_name: "हिंदू धर्म",
                tagline: "सनातन धर्म",
                title: "🕉️ हिंदू धर्म गाइड",
                greeting: "🙏 नमस्ते! मैं आपका आध्यात्मिक साथी हूं।",
                placeholder: "अपने मन के प्रश्न पूछिए...",
                thinking: "विचार कर रहा हूं...",
            },
            Domain::Muslim => DomainProfile {
                name: "Muslim",
                native_name: "اسلام",
                tagline: "دین اسلام",
                title: "☪️ Islamic Guide",
                greeting: "🤲 Assalamu Alaikum! I am your spiritual companion.",
                placeholder: "Dil ki baat AI se poochhiye...",
                thinking: "Thinking...",
            },
            Domain::Sikh => DomainProfile {
                name: "Sikh",
                native_name: "ਸਿੱਖ ਧਰਮ",
                tagline: "ਗੁਰੂ ਦਾ ਰਾਹ",
                title: "🗡️ Sikh Guide",
                greeting: "🙏 Sat Sri Akal! I am your spiritual companion.",
                placeholder: "Guru di kirpa naal sawaal karo...",
                thinking: "Soch raha haan...",
            },
            Domain::Christian => DomainProfile {
                name: "Christian",
                native_name: "ईसाई धर्म",
                tagline: "मसीही धर्म",
                title: "✝️ Christian Guide",
                greeting: "भगवान आपको आशीर्वाद दे! मैं आपका आध्यात्मिक साथी हूं।",
                placeholder: "विश्वास के साथ पूछिए... (हिंदी/English/Hinglish में)",
                thinking: "प्रभु यीशु से पूछ रहा हूं...",
            },
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown domain `{0}` (expected one of: hindu, muslim, sikh, christian)")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hindu" => Ok(Domain::Hindu),
            "muslim" | "islam" => Ok(Domain::Muslim),
            "sikh" => Ok(Domain::Sikh),
            "christian" => Ok(Domain::Christian),
            _ => Err(UnknownDomain(s.to_string())),
        }
    }
}
