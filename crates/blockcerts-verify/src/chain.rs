//! Registry of the ledgers certificates can be anchored to.
//!
//! The registry is a static table: chain descriptors are selected once per
//! verification run from the receipt's anchor and never change afterwards.

use bitcoin::Network;
use blockcerts_explorer_lookup::{ExplorerFamily, LookupNetwork};
use serde::{Deserialize, Serialize};

use crate::receipt::{Anchor, Receipt};

/// Placeholder replaced by the transaction id in link templates
pub const TRANSACTION_ID_PLACEHOLDER: &str = "{transaction_id}";

/// Stable chain codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainCode {
    Bitcoin,
    Testnet,
    Regtest,
    Mocknet,
    Ethmain,
    Ethropst,
    Ethrinkeby,
    Ethgoerli,
    Ethsepolia,
}

/// Rule deriving an issuing address from a public key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressDerivation {
    /// Pay-to-pubkey-hash address of the compressed key
    BitcoinP2pkh(Network),
    /// Last 20 bytes of the keccak-256 hash of the uncompressed key
    Ethereum,
    Unsupported,
}

/// Transaction link templates of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTemplates {
    pub full: &'static str,
    pub raw: &'static str,
}

/// Rendered links to an anchoring transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLinks {
    pub transaction_link: String,
    pub raw_transaction_link: String,
}

/// A ledger descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub code: ChainCode,
    pub name: &'static str,
    /// Value used by receipt anchors to designate this chain
    pub signature_value: &'static str,
    pub transaction_templates: TransactionTemplates,
    #[serde(skip)]
    pub derivation: AddressDerivation,
    /// Test chains that never reach a real ledger
    pub mock: bool,
}

impl Chain {
    pub fn is_mock(&self) -> bool {
        self.mock
    }

    pub fn is_ethereum(&self) -> bool {
        matches!(self.derivation, AddressDerivation::Ethereum)
    }

    /// Network queried by the explorers, none for mock chains
    pub fn lookup_network(&self) -> Option<LookupNetwork> {
        match self.code {
            ChainCode::Bitcoin => Some(LookupNetwork::BitcoinMainnet),
            ChainCode::Testnet => Some(LookupNetwork::BitcoinTestnet),
            ChainCode::Ethmain => Some(LookupNetwork::EthereumMainnet),
            ChainCode::Ethropst => Some(LookupNetwork::EthereumRopsten),
            ChainCode::Ethrinkeby => Some(LookupNetwork::EthereumRinkeby),
            ChainCode::Ethgoerli => Some(LookupNetwork::EthereumGoerli),
            ChainCode::Ethsepolia => Some(LookupNetwork::EthereumSepolia),
            ChainCode::Regtest | ChainCode::Mocknet => None,
        }
    }

    pub fn explorer_family(&self) -> Option<ExplorerFamily> {
        self.lookup_network().map(|network| {
            if network.is_ethereum() {
                ExplorerFamily::Ethereum
            } else {
                ExplorerFamily::Bitcoin
            }
        })
    }
}

pub static BLOCKCHAINS: &[Chain] = &[
    Chain {
        code: ChainCode::Bitcoin,
        name: "Bitcoin",
        signature_value: "bitcoinMainnet",
        transaction_templates: TransactionTemplates {
            full: "https://blockchain.info/tx/{transaction_id}",
            raw: "https://blockchain.info/rawtx/{transaction_id}",
        },
        derivation: AddressDerivation::BitcoinP2pkh(Network::Bitcoin),
        mock: false,
    },
    Chain {
        code: ChainCode::Testnet,
        name: "Bitcoin Testnet",
        signature_value: "bitcoinTestnet",
        transaction_templates: TransactionTemplates {
            full: "https://testnet.blockchain.info/tx/{transaction_id}",
            raw: "https://testnet.blockchain.info/rawtx/{transaction_id}",
        },
        derivation: AddressDerivation::BitcoinP2pkh(Network::Testnet),
        mock: false,
    },
    Chain {
        code: ChainCode::Regtest,
        name: "Bitcoin Regtest",
        signature_value: "bitcoinRegtest",
        transaction_templates: TransactionTemplates { full: "", raw: "" },
        derivation: AddressDerivation::Unsupported,
        mock: true,
    },
    Chain {
        code: ChainCode::Mocknet,
        name: "Mocknet",
        signature_value: "mockchain",
        transaction_templates: TransactionTemplates { full: "", raw: "" },
        derivation: AddressDerivation::Unsupported,
        mock: true,
    },
    Chain {
        code: ChainCode::Ethmain,
        name: "Ethereum",
        signature_value: "ethereumMainnet",
        transaction_templates: TransactionTemplates {
            full: "https://etherscan.io/tx/{transaction_id}",
            raw: "https://etherscan.io/getRawTx?tx={transaction_id}",
        },
        derivation: AddressDerivation::Ethereum,
        mock: false,
    },
    Chain {
        code: ChainCode::Ethropst,
        name: "Ethereum Testnet Ropsten",
        signature_value: "ethereumRopsten",
        transaction_templates: TransactionTemplates {
            full: "https://ropsten.etherscan.io/tx/{transaction_id}",
            raw: "https://ropsten.etherscan.io/getRawTx?tx={transaction_id}",
        },
        derivation: AddressDerivation::Ethereum,
        mock: false,
    },
    Chain {
        code: ChainCode::Ethrinkeby,
        name: "Ethereum Testnet Rinkeby",
        signature_value: "ethereumRinkeby",
        transaction_templates: TransactionTemplates {
            full: "https://rinkeby.etherscan.io/tx/{transaction_id}",
            raw: "https://rinkeby.etherscan.io/getRawTx?tx={transaction_id}",
        },
        derivation: AddressDerivation::Ethereum,
        mock: false,
    },
    Chain {
        code: ChainCode::Ethgoerli,
        name: "Ethereum Testnet Goerli",
        signature_value: "ethereumGoerli",
        transaction_templates: TransactionTemplates {
            full: "https://goerli.etherscan.io/tx/{transaction_id}",
            raw: "https://goerli.etherscan.io/getRawTx?tx={transaction_id}",
        },
        derivation: AddressDerivation::Ethereum,
        mock: false,
    },
    Chain {
        code: ChainCode::Ethsepolia,
        name: "Ethereum Testnet Sepolia",
        signature_value: "ethereumSepolia",
        transaction_templates: TransactionTemplates {
            full: "https://sepolia.etherscan.io/tx/{transaction_id}",
            raw: "https://sepolia.etherscan.io/getRawTx?tx={transaction_id}",
        },
        derivation: AddressDerivation::Ethereum,
        mock: false,
    },
];

/// Look up a chain by code
pub fn chain_by_code(code: ChainCode) -> &'static Chain {
    BLOCKCHAINS
        .iter()
        .find(|chain| chain.code == code)
        .unwrap_or(&BLOCKCHAINS[0])
}

/// Look up a chain by the value anchors use to designate it
pub fn chain_by_signature_value(value: &str) -> Option<&'static Chain> {
    BLOCKCHAINS
        .iter()
        .find(|chain| chain.signature_value.eq_ignore_ascii_case(value))
}

/// Chain designated by a `blink:<ledger>:<network>:<txid>` anchor
fn chain_from_blink(blink: &str) -> Option<&'static Chain> {
    let mut parts = blink.strip_prefix("blink:")?.split(':');
    let code = match (parts.next()?, parts.next()?) {
        ("btc", "mainnet") => ChainCode::Bitcoin,
        ("btc", "testnet") => ChainCode::Testnet,
        ("btc", "regtest") => ChainCode::Regtest,
        ("eth", "mainnet") => ChainCode::Ethmain,
        ("eth", "ropsten") => ChainCode::Ethropst,
        ("eth", "rinkeby") => ChainCode::Ethrinkeby,
        ("eth", "goerli") => ChainCode::Ethgoerli,
        ("eth", "sepolia") => ChainCode::Ethsepolia,
        ("mocknet", _) => ChainCode::Mocknet,
        _ => return None,
    };
    Some(chain_by_code(code))
}

/// Select the chain from the receipt's first anchor, bitcoin mainnet when no hint is present
pub fn get_chain(receipt: &Receipt) -> &'static Chain {
    let hinted = receipt.anchors.first().and_then(|anchor| match anchor {
        Anchor::Blink(blink) => chain_from_blink(blink),
        Anchor::Source { chain, .. } => chain.as_deref().and_then(chain_by_signature_value),
    });
    hinted.unwrap_or_else(|| chain_by_code(ChainCode::Bitcoin))
}

/// Render the transaction links of a chain, empty for chains without an explorer
pub fn get_transaction_link(transaction_id: &str, chain: &Chain) -> TransactionLinks {
    let render = |template: &str| template.replace(TRANSACTION_ID_PLACEHOLDER, transaction_id);
    TransactionLinks {
        transaction_link: render(chain.transaction_templates.full),
        raw_transaction_link: render(chain.transaction_templates.raw),
    }
}
