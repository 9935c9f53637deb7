use std::fmt;

/// Markers of bot-challenge interstitials. Matched case-insensitively.
pub const DEFAULT_SIGNATURES: &[&str] = &[
    "checking your browser",
    "just a moment",
    "cf-browser-verification",
    "_cf_chl_opt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Blocked { signature: String },
}

/// Terminal condition: the target is serving challenge pages and the run
/// has to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSignal {
    pub url: String,
    pub signature: String,
}

impl fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "challenge page detected at {} (matched {:?})",
            self.url, self.signature
        )
    }
}

#[derive(Debug, Clone)]
pub struct BlockDetector {
    signatures: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURES.iter().map(|s| s.to_string()))
    }
}

impl BlockDetector {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let signatures = signatures
            .into_iter()
            .map(|s| s.into().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { signatures }
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn inspect(&self, body: &str) -> Verdict {
        let haystack = body.to_lowercase();
        self.signatures
            .iter()
            .find(|sig| haystack.contains(sig.as_str()))
            .map(|sig| Verdict::Blocked {
                signature: sig.clone(),
            })
            .unwrap_or(Verdict::Clean)
    }
}
