//! Field and surface ids of the console layout, with their defaults.

use crate::fields::{FieldStore, MemoryFieldStore};

/// Shared progress indicator.
pub const PROGRESS: &str = "progressReport";

/// Output surfaces.
pub mod surface {
    pub const FAB_BLOCK_INFO: &str = "outputFabcoinBlockInfo";
    pub const FAB_CRYPTO: &str = "outputFabcoinCrypto";
    pub const KANBAN_GO: &str = "outputKanbanGO";
    pub const INITIALIZATION: &str = "outputInitialization";
    pub const KANBAN_INITIALIZATION: &str = "outputKanbanGOInitialization";
}

/// Fabcoin block, transaction, wallet and contract inputs.
pub mod fab_block {
    pub const BLOCK_NUMBER: &str = "fabBlockNumber";
    pub const BLOCK_HASH: &str = "fabBlockHash";
    pub const BLOCKS_TO_GENERATE: &str = "fabNumberOfBlocksToGenerate";
    pub const TXID: &str = "fabTxid";
    pub const TX_HEX: &str = "fabTxHex";
    pub const TX_INPUTS: &str = "fabTxInputs";
    pub const TX_OUTPUTS: &str = "fabTxOutputs";
    pub const TX_OUTPUT_ADDRESSES: &str = "fabTxOutputAddresses";
    pub const TX_AGGREGATE_SIGNATURE: &str = "fabTxAggregateSignature";
    pub const TX_AGGREGATE_PUBLIC_KEYS: &str = "fabTxAggregatePublicKeys";
    pub const ADDRESS: &str = "fabAddress";
    pub const PRIVATE_KEY: &str = "fabPrivateKey";
    pub const WALLET_AMOUNT: &str = "fabWalletAmount";
    pub const CONTRACT_HEX: &str = "fabContractHex";
    pub const CONTRACT_ID: &str = "fabContractId";
    pub const CONTRACT_DATA: &str = "fabContractData";
}

/// Fabcoin Schnorr signature inputs.
pub mod fab_schnorr {
    pub const PRIVATE_KEY: &str = "fabSchnorrPrivateKey";
    pub const NONCE: &str = "fabSchnorrNonce";
    pub const PUBLIC_KEY: &str = "fabSchnorrPublicKey";
    pub const SIGNATURE: &str = "fabSchnorrSignature";
    pub const MESSAGE: &str = "fabSchnorrMessage";
}

/// Fabcoin aggregate signature inputs.
pub mod fab_aggregate {
    pub const KEYS_TO_GENERATE: &str = "fabAggregateNumberOfPrivateKeysToGenerate";
    pub const PRIVATE_KEYS: &str = "fabAggregatePrivateKeys";
    pub const NONCES: &str = "fabAggregateNonces";
    pub const PUBLIC_KEYS: &str = "fabAggregatePublicKeys";
    pub const COMMITMENTS: &str = "fabAggregateCommitments";
    pub const SIGNERS_BITMAP: &str = "fabAggregateCommittedSignersBitmap";
    pub const AGGREGATE_PUBLIC_KEY: &str = "fabAggregatePublicKey";
    pub const AGGREGATE_COMMITMENT: &str = "fabAggregateCommitment";
    pub const MESSAGE_DIGEST: &str = "fabAggregateMessageDigest";
    pub const MESSAGE: &str = "fabAggregateMessage";
    pub const SOLUTIONS: &str = "fabAggregateSolutions";
    pub const SIGNATURE: &str = "fabAggregateSignature";
    pub const SIGNATURE_UNCOMPRESSED: &str = "fabAggregateSignatureUncompressed";
    pub const SIGNATURE_COMPLETE: &str = "fabAggregateSignatureComplete";
}

/// Kanban-go Schnorr inputs.
pub mod kanban_schnorr {
    pub const MESSAGE: &str = "kanbanSchnorrMessage";
    pub const PRIVATE_KEY: &str = "kanbanSchnorrPrivateKey";
    pub const PUBLIC_KEY: &str = "kanbanSchnorrPublicKey";
    pub const SIGNATURE: &str = "kanbanSchnorrSignature";
}

/// Node initialization inputs, shared by the fabcoin and kanban services.
pub mod initialization {
    pub const NET: &str = "initNet";
    pub const NUMBER_OF_NODES: &str = "initNumberOfNodes";
    pub const ABI_JSON: &str = "initAbiJSON";
    pub const CONTRACT_ID: &str = "initContractId";
    pub const CONNECT_IN_A_LINE: &str = "initConnectKanbansInALine";
    pub const BRIDGE_CHAINNET: &str = "initBridgeChainnet";
    pub const SOLIDITY_CODE: &str = "initSolidityCode";
    pub const COMMAND_SSH: &str = "initCommandSSH";
}

/// Initial values of every field of the layout.
pub const DEFAULTS: &[(&str, &str)] = &[
    (PROGRESS, ""),
    (fab_block::BLOCK_NUMBER, ""),
    (fab_block::BLOCK_HASH, ""),
    (fab_block::BLOCKS_TO_GENERATE, "1"),
    (fab_block::TXID, ""),
    (fab_block::TX_HEX, ""),
    (fab_block::TX_INPUTS, ""),
    (fab_block::TX_OUTPUTS, ""),
    (fab_block::TX_OUTPUT_ADDRESSES, ""),
    (fab_block::TX_AGGREGATE_SIGNATURE, ""),
    (fab_block::TX_AGGREGATE_PUBLIC_KEYS, ""),
    (fab_block::ADDRESS, ""),
    (fab_block::PRIVATE_KEY, ""),
    (fab_block::WALLET_AMOUNT, ""),
    (fab_block::CONTRACT_HEX, ""),
    (fab_block::CONTRACT_ID, ""),
    (fab_block::CONTRACT_DATA, ""),
    (fab_schnorr::PRIVATE_KEY, ""),
    (fab_schnorr::NONCE, ""),
    (fab_schnorr::PUBLIC_KEY, ""),
    (fab_schnorr::SIGNATURE, ""),
    (fab_schnorr::MESSAGE, ""),
    (fab_aggregate::KEYS_TO_GENERATE, "5"),
    (fab_aggregate::PRIVATE_KEYS, ""),
    (fab_aggregate::NONCES, ""),
    (fab_aggregate::PUBLIC_KEYS, ""),
    (fab_aggregate::COMMITMENTS, ""),
    (fab_aggregate::SIGNERS_BITMAP, "11111"),
    (fab_aggregate::AGGREGATE_PUBLIC_KEY, ""),
    (fab_aggregate::AGGREGATE_COMMITMENT, ""),
    (fab_aggregate::MESSAGE_DIGEST, ""),
    (fab_aggregate::MESSAGE, ""),
    (fab_aggregate::SOLUTIONS, ""),
    (fab_aggregate::SIGNATURE, ""),
    (fab_aggregate::SIGNATURE_UNCOMPRESSED, ""),
    (fab_aggregate::SIGNATURE_COMPLETE, ""),
    (kanban_schnorr::MESSAGE, ""),
    (kanban_schnorr::PRIVATE_KEY, ""),
    (kanban_schnorr::PUBLIC_KEY, ""),
    (kanban_schnorr::SIGNATURE, ""),
    (initialization::NET, "regtest"),
    (initialization::NUMBER_OF_NODES, "2"),
    (initialization::ABI_JSON, ""),
    (initialization::CONTRACT_ID, ""),
    (initialization::CONNECT_IN_A_LINE, "false"),
    (initialization::BRIDGE_CHAINNET, "regtest"),
    (initialization::SOLIDITY_CODE, ""),
    (initialization::COMMAND_SSH, ""),
];

/// Declare every layout field. Values already present are kept.
pub fn declare_layout(store: &MemoryFieldStore) {
    for (id, default) in DEFAULTS {
        store.declare(id, default);
    }
}

/// Reset the aggregate-signature form.
pub fn clear_aggregate(store: &dyn FieldStore) {
    use fab_aggregate::*;
    store.set(KEYS_TO_GENERATE, "5");
    store.set(SIGNERS_BITMAP, "11111");
    for id in [
        PRIVATE_KEYS,
        NONCES,
        PUBLIC_KEYS,
        COMMITMENTS,
        AGGREGATE_PUBLIC_KEY,
        AGGREGATE_COMMITMENT,
        MESSAGE_DIGEST,
        SOLUTIONS,
        SIGNATURE,
    ] {
        store.set(id, "");
    }
}
