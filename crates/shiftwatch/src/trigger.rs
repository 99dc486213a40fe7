//! Parsing of the opaque trigger text that starts a run.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Flags carried by a trigger message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trigger {
    /// Return failures instead of notifying about them.
    pub debug: bool,
    /// Use the alternate session object.
    pub debug_file: bool,
    /// Skip the randomized skip and start delay.
    pub no_fuzz: bool,
}

impl Trigger {
    /// Parse trigger text, decoding it first if it is valid base64 UTF-8.
    ///
    /// Tokens are matched as substrings, so `DEBUGFILE` also turns on debug.
    pub fn parse(raw: &str) -> Self {
        let text = STANDARD
            .decode(raw.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| raw.to_string());

        let debug = text.contains("DEBUG");
        Self {
            debug,
            debug_file: text.contains("DEBUGFILE"),
            no_fuzz: debug || text.contains("NOFUZZ"),
        }
    }

    /// Combine with flags given on the command line.
    pub fn merge(self, debug: bool, debug_file: bool, no_fuzz: bool) -> Self {
        let debug = self.debug || debug;
        Self {
            debug,
            debug_file: self.debug_file || debug_file,
            no_fuzz: self.no_fuzz || no_fuzz || debug,
        }
    }
}
