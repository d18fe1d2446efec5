/// Log tags identifying the subsystem a message originates from
///
/// Each tag maps to a `--debug-<key>` command-line flag that enables
/// debug-level output for that subsystem only.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Swap,
    Quote,
    Transaction,
    Recovery,
    Rpc,
    Cache,
    Wallet,
}

impl LogTag {
    /// All tags, in display order
    pub const ALL: [LogTag; 9] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Swap,
        LogTag::Quote,
        LogTag::Transaction,
        LogTag::Recovery,
        LogTag::Rpc,
        LogTag::Cache,
        LogTag::Wallet,
    ];

    /// Key used by `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Swap => "swap",
            LogTag::Quote => "quote",
            LogTag::Transaction => "transaction",
            LogTag::Recovery => "recovery",
            LogTag::Rpc => "rpc",
            LogTag::Cache => "cache",
            LogTag::Wallet => "wallet",
        }
        .to_string()
    }

    /// Uncolored label written to the log file
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Swap => "SWAP",
            LogTag::Quote => "QUOTE",
            LogTag::Transaction => "TX",
            LogTag::Recovery => "RECOVERY",
            LogTag::Rpc => "RPC",
            LogTag::Cache => "CACHE",
            LogTag::Wallet => "WALLET",
        }
        .to_string()
    }

    /// Parse a debug key back into a tag
    pub fn from_debug_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.to_debug_key() == key.to_lowercase())
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_key_round_trip() {
        for tag in LogTag::ALL {
            assert_eq!(LogTag::from_debug_key(&tag.to_debug_key()), Some(tag));
        }
        assert_eq!(LogTag::from_debug_key("SWAP"), Some(LogTag::Swap));
        assert_eq!(LogTag::from_debug_key("nope"), None);
    }
}
