use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The two test networks a payment can be made on.
pub enum Network {
    /// Ethereum Sepolia, paid through an ERC-20 `transfer` call.
    #[serde(rename = "eth")]
    EthereumSepolia,
    /// Solana devnet, paid through an SPL token transfer instruction.
    #[serde(rename = "sol")]
    SolanaDevnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::EthereumSepolia, Network::SolanaDevnet];

    /// Short tag used on the wire (`eth` / `sol`).
    pub fn tag(self) -> &'static str {
        match self {
            Network::EthereumSepolia => "eth",
            Network::SolanaDevnet => "sol",
        }
    }

    /// Human readable label for emails and UI.
    pub fn label(self) -> &'static str {
        match self {
            Network::EthereumSepolia => "Ethereum (Sepolia)",
            Network::SolanaDevnet => "Solana (Devnet)",
        }
    }

    /// Long form name of the test network.
    pub fn testnet_name(self) -> &'static str {
        match self {
            Network::EthereumSepolia => "Ethereum Sepolia Testnet",
            Network::SolanaDevnet => "Solana Devnet",
        }
    }

    /// Block explorer link for a transaction hash or signature.
    pub fn explorer_tx_url(self, tx_id: &str) -> String {
        match self {
            Network::EthereumSepolia => format!("https://sepolia.etherscan.io/tx/{tx_id}"),
            Network::SolanaDevnet => {
                format!("https://explorer.solana.com/tx/{tx_id}?cluster=devnet")
            }
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_tags_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&Network::EthereumSepolia).unwrap(),
            "\"eth\""
        );
        let parsed: Network = serde_json::from_str("\"sol\"").unwrap();
        assert_eq!(parsed, Network::SolanaDevnet);
        assert!(serde_json::from_str::<Network>("\"btc\"").is_err());
    }

    #[test]
    fn test_explorer_links() {
        assert_eq!(
            Network::EthereumSepolia.explorer_tx_url("0xabc"),
            "https://sepolia.etherscan.io/tx/0xabc"
        );
        assert_eq!(
            Network::SolanaDevnet.explorer_tx_url("5sig"),
            "https://explorer.solana.com/tx/5sig?cluster=devnet"
        );
    }
}
