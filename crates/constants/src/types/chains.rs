use crate::{holesky, mainnet, sepolia, NetworkConstants};
use std::{fmt, str::FromStr};

/// The list of known networks as a string.
const KNOWN_NETWORKS: &str = "mainnet, sepolia, holesky";

/// Error type for parsing a network from its name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNetworkError {
    /// The network name is not supported.
    #[error("network name {0} is not parseable. supported networks: {KNOWN_NETWORKS}")]
    NetworkNotSupported(String),
}

/// Networks with a known relay deployment.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum KnownNetworks {
    /// Ethereum mainnet.
    #[default]
    Mainnet,
    /// Sepolia testnet.
    Sepolia,
    /// Holesky testnet.
    Holesky,
    /// Test network.
    #[cfg(any(test, feature = "test-utils"))]
    Test,
}

impl KnownNetworks {
    /// Get the constants for this network.
    pub const fn constants(self) -> NetworkConstants {
        match self {
            Self::Mainnet => mainnet::MAINNET,
            Self::Sepolia => sepolia::SEPOLIA,
            Self::Holesky => holesky::HOLESKY,
            #[cfg(any(test, feature = "test-utils"))]
            Self::Test => crate::test_utils::TEST_NETWORK,
        }
    }
}

impl fmt::Display for KnownNetworks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constants().name())
    }
}

impl FromStr for KnownNetworks {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            #[cfg(any(test, feature = "test-utils"))]
            "test" => Ok(Self::Test),
            "mainnet" => Ok(Self::Mainnet),
            "sepolia" => Ok(Self::Sepolia),
            "holesky" => Ok(Self::Holesky),
            _ => Err(ParseNetworkError::NetworkNotSupported(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_networks() {
        assert_eq!("mainnet".parse::<KnownNetworks>().unwrap(), KnownNetworks::Mainnet);
        assert_eq!(" Sepolia ".parse::<KnownNetworks>().unwrap(), KnownNetworks::Sepolia);
        assert_eq!("HOLESKY".parse::<KnownNetworks>().unwrap(), KnownNetworks::Holesky);
    }

    #[test]
    fn rejects_unknown_network() {
        let err = "goerli".parse::<KnownNetworks>().unwrap_err();
        assert_eq!(err, ParseNetworkError::NetworkNotSupported("goerli".to_string()));
        assert!(err.to_string().contains("mainnet, sepolia, holesky"));
    }

    #[test]
    fn network_constants_match() {
        let mainnet = KnownNetworks::Mainnet.constants();
        assert_eq!(mainnet.chain_id(), 1);
        assert_eq!(mainnet.relay_url(), "https://relay.flashbots.net");
        assert_eq!(KnownNetworks::Holesky.constants().chain_id(), 17000);
        assert_eq!(KnownNetworks::Sepolia.to_string(), "sepolia");
    }
}
