//! Fabcoin node calls.
//!
//! Keyed wire form. Block, transaction and contract calls render into the
//! block-info surface; the `test*` crypto calls render into the crypto
//! surface with their own table.

use std::sync::Arc;

use serde_json::json;

use crate::binding::{
    fields, output_map, BindingSet, CallBinding, CallFamily, JoinFormat, OutputTarget, ResponseHandler,
    SignerCollection,
};
use crate::catalogue::ids::{fab_aggregate, fab_block, fab_schnorr, initialization, surface};
use crate::catalogue::{CatalogueResult, Service};
use crate::registry::{ArgumentType, CallDescriptor, CallRef, CallRegistry};
use crate::transform::{ClickAndFill, FillAction, ShortenStyle, Transformer, TransformerTable, TxOutputFields};

pub const SERVICE: &str = "fabcoin";

fn run(field: &str, label: &str, tooltip: &str) -> Transformer {
    Transformer::fill_and_run(field, CallRef::new(SERVICE, label), tooltip)
}

fn block_hash() -> Transformer {
    run(fab_block::BLOCK_HASH, "getBlockByHash", "Sets the block hash field and fetches the block info.")
}

fn transaction_id() -> Transformer {
    run(fab_block::TXID, "getTransactionById", "Sets the transaction id field, fetches and decodes the transaction.")
}

fn transaction_hex() -> Transformer {
    run(fab_block::TX_HEX, "decodeTransactionRaw", "Sets the transaction hex field and decodes the tx.")
}

fn shortener() -> Transformer {
    Transformer::Shorten(ShortenStyle::Standard)
}

fn contract_id() -> Transformer {
    Transformer::fill(&[fab_block::CONTRACT_ID, initialization::CONTRACT_ID])
}

fn select_tx_output(with_value: bool) -> Transformer {
    let tooltip = if with_value {
        "Sets the tx inputs to this vout. Sets the transfer amount to the value of this txout minus 1 and updates the tx outputs."
    } else {
        "Sets the tx inputs to this vout. Sets the transfer amount to 0 and updates the tx outputs."
    };
    Transformer::ClickAndFill(ClickAndFill {
        fill: FillAction::SelectTxOutput {
            with_value,
            inputs_field: fab_block::TX_INPUTS.to_string(),
            address_field: fab_block::ADDRESS.to_string(),
            amount_field: fab_block::WALLET_AMOUNT.to_string(),
            outputs: TxOutputFields {
                outputs: fab_block::TX_OUTPUTS.to_string(),
                address: fab_block::TX_OUTPUT_ADDRESSES.to_string(),
                public_keys: fab_block::TX_AGGREGATE_PUBLIC_KEYS.to_string(),
                amount: fab_block::WALLET_AMOUNT.to_string(),
            },
        },
        shorten: None,
        trigger: None,
        tooltip: Some(tooltip.to_string()),
    })
}

/// Table for block and wallet responses.
pub fn standard_table() -> CatalogueResult<TransformerTable> {
    Ok(TransformerTable::from_entries([
        ("previousblockhash", block_hash()),
        ("nextblockhash", block_hash()),
        ("blockhash", block_hash()),
        ("hash", block_hash()),
        ("hex", transaction_hex()),
        ("chainwork", shortener()),
        ("hashStateRoot", shortener()),
        ("hashUTXORoot", shortener()),
        ("merkleroot", shortener()),
        ("nonce", shortener()),
        ("tx.${number}", transaction_id()),
        ("txid", transaction_id()),
        ("details.${number}.address", Transformer::fill(&[fab_block::ADDRESS])),
        ("details.${number}.amount", select_tx_output(false)),
        ("details.${number}.vout", select_tx_output(false)),
    ])?)
}

/// Table for decoded transactions.
pub fn transaction_table() -> CatalogueResult<TransformerTable> {
    Ok(TransformerTable::from_entries([
        ("hash", transaction_id()),
        ("blockhash", block_hash()),
        ("txid", transaction_id()),
        ("details.${number}.address", Transformer::fill(&[fab_block::ADDRESS])),
        ("vout.${number}.scriptPubKey.addresses.${number}", Transformer::fill(&[fab_block::ADDRESS])),
        ("vout.${number}.n", select_tx_output(false)),
        ("vout.${number}.value", select_tx_output(true)),
        ("vout.${number}.scriptPubKey.asm", shortener()),
        ("vout.${number}.scriptPubKey.hex", shortener()),
        ("hex", transaction_hex()),
        ("inputRawTransaction", transaction_hex()),
        ("inputTransactionDecodedAndRecoded", transaction_hex()),
        ("vin.${number}.txid", transaction_id()),
        ("vin.${number}.scriptSig.asm", shortener()),
        ("vin.${number}.scriptSig.hex", shortener()),
    ])?)
}

/// Table for contract responses.
pub fn contract_table() -> CatalogueResult<TransformerTable> {
    Ok(TransformerTable::from_entries([
        ("address", contract_id()),
        ("hash160", Transformer::Shorten(ShortenStyle::Extreme)),
        ("txid", transaction_id()),
        ("sender", Transformer::fill(&[fab_block::ADDRESS])),
        ("transactionReceipt.bloom", shortener()),
        ("transactionReceipt.stateRoot", shortener()),
        ("executionResult.newAddress", shortener()),
        ("executionResult.output", shortener()),
    ])?)
}

/// Table for Schnorr and aggregate-signature responses.
pub fn crypto_table() -> CatalogueResult<TransformerTable> {
    let private_key = || Transformer::fill(&[fab_schnorr::PRIVATE_KEY]);
    let public_key = || Transformer::fill(&[fab_schnorr::PUBLIC_KEY]);
    let aggregate = || Transformer::fill(&[fab_aggregate::SIGNATURE]);
    Ok(TransformerTable::from_entries([
        ("privateKeyBase58Check", private_key()),
        ("privateKeyBase58WithoutCheck", private_key()),
        ("privateKeyHex", private_key()),
        ("secretHex", private_key()),
        ("input.${number}", shortener()),
        ("publicKeyHexCompressed", public_key()),
        ("publicKeyHex", public_key()),
        ("challengeHex", shortener()),
        ("nonceSchnorrBase58Check", shortener()),
        ("signatureSchnorrBase58Check", shortener()),
        ("signatureSchnorrBase58", Transformer::fill(&[fab_schnorr::SIGNATURE])),
        ("solutionBase58Check", shortener()),
        ("aggregator.publicKeys.${number}", public_key()),
        ("aggregator.commitments.${number}", shortener()),
        ("aggregator.aggregatePublicKey", shortener()),
        ("aggregator.aggregateCommitment", shortener()),
        ("aggregator.messageDigest", shortener()),
        ("aggregator.aggregateSolution", shortener()),
        ("aggregator.aggregateCommitmentFromSignature", shortener()),
        ("aggregator.signatureNoBitmap", aggregate()),
        ("aggregator.signatureUncompressed", Transformer::fill(&[fab_aggregate::SIGNATURE_UNCOMPRESSED])),
        ("aggregator.signatureComplete", Transformer::fill(&[fab_aggregate::SIGNATURE_COMPLETE])),
        ("aggregator.lockingCoefficients.${number}", shortener()),
        ("signers.${number}.myPublicKey", public_key()),
        ("signers.${number}.privateKeyBase58", private_key()),
        ("signers.${number}.myNonceBase58", Transformer::fill(&[fab_schnorr::NONCE])),
        ("signers.${number}.myLockingCoefficient", shortener()),
        ("signers.${number}.mySolution", shortener()),
        ("signers.${number}.commitmentHexCompressed", shortener()),
        ("verifier.lockingCoefficients.${number}", shortener()),
        ("verifier.concatenatedPublicKeys", shortener()),
        ("verifier.messageDigest", shortener()),
        ("verifier.aggregatePublicKey", shortener()),
        ("verifier.publicKeys.${number}", shortener()),
        ("verifier.aggregateSolution", shortener()),
        ("verifier.aggregateCommitment", shortener()),
        ("verifier.aggregateCommitmentFromSignature", shortener()),
        ("verifier.signatureNoBitmap", aggregate()),
        ("reason", shortener()),
    ])?)
}

fn single_entry(transformer: Transformer) -> CatalogueResult<Arc<TransformerTable>> {
    Ok(Arc::new(TransformerTable::from_entries([("singleEntry", transformer)])?))
}

fn any_index(transformer: Transformer) -> CatalogueResult<Arc<TransformerTable>> {
    Ok(Arc::new(TransformerTable::from_entries([("${number}", transformer)])?))
}

/// Descriptors of the fabcoin node.
pub fn registry() -> CatalogueResult<CallRegistry> {
    use ArgumentType::{Json, Number};
    let descriptors = vec![
        CallDescriptor::new("getBlockByHeight").modifiable("blockNumber").typed("blockNumber", Number),
        CallDescriptor::new("generateBlocks")
            .modifiable_with_default("numberOfBlocks", json!(1))
            .typed("numberOfBlocks", Number)
            .single_node(),
        CallDescriptor::new("getBlockCount"),
        CallDescriptor::new("getBestBlockHash"),
        CallDescriptor::new("getBlockByHash").modifiable("hash").fixed("verbose", json!(true)),
        CallDescriptor::new("getTransactionById").modifiable("txid").fixed("verbose", json!(1)),
        CallDescriptor::new("decodeTransactionRaw").modifiable("hexString"),
        CallDescriptor::new("dumpPrivateKey").modifiable("address").single_node(),
        CallDescriptor::new("createRawTransaction")
            .modifiable("inputs")
            .modifiable("outputs")
            .typed("inputs", Json)
            .typed("outputs", Json),
        CallDescriptor::new("signRawTransaction").modifiable("hexString").single_node(),
        CallDescriptor::new("sendRawTransaction").modifiable("rawTransactionHex").single_node(),
        CallDescriptor::new("insertAggregateSignature")
            .modifiable("rawTransaction")
            .modifiable("aggregateSignature"),
        CallDescriptor::new("getRawMempool"),
        CallDescriptor::new("createContract")
            .modifiable("contractHex")
            .optional("gasLimit")
            .typed("gasLimit", Number)
            .single_node(),
        CallDescriptor::new("callContract").modifiable("contractId").modifiable("data"),
        CallDescriptor::new("sendToContract")
            .modifiable("contractId")
            .modifiable("data")
            .modifiable_with_default("amount", json!(0))
            .typed("amount", Number)
            .single_node(),
        CallDescriptor::new("listContracts"),
        CallDescriptor::new("getNewAddress").single_node(),
        CallDescriptor::new("testSha3").modifiable("message"),
        CallDescriptor::new("testPrivateKeyGeneration"),
        CallDescriptor::new("testPublicKeyFromPrivate").modifiable("privateKey"),
        CallDescriptor::new("testSchnorrSignature").modifiable("privateKey").modifiable("message"),
        CallDescriptor::new("testSchnorrSignatureVerify")
            .modifiable("signature")
            .modifiable("publicKey")
            .modifiable("message"),
        CallDescriptor::new("testAggregateSignatureInitialize")
            .modifiable_with_default("numberOfPrivateKeysToGenerate", json!(5))
            .typed("numberOfPrivateKeysToGenerate", Number),
        CallDescriptor::new("testAggregateSignatureCommitment").modifiable("message"),
        CallDescriptor::new("testAggregateSignatureChallenge")
            .modifiable("committedSignersBitmap")
            .modifiable("commitments"),
        CallDescriptor::new("testAggregateSignatureSolutions")
            .modifiable("committedSignersBitmap")
            .modifiable("messageDigest")
            .modifiable("aggregateCommitment")
            .modifiable("aggregatePublicKey"),
        CallDescriptor::new("testAggregateSignatureAggregation").modifiable("solutions"),
        CallDescriptor::new("testAggregateVerification")
            .modifiable("signature")
            .modifiable("committedSignersBitmap")
            .modifiable("publicKeys")
            .modifiable("message"),
        CallDescriptor::new("testAggregateVerificationComplete")
            .modifiable("signatureComplete")
            .modifiable("messageBase64"),
    ];
    Ok(CallRegistry::new(SERVICE, descriptors)?)
}

/// Console wiring of the fabcoin node.
pub fn service() -> CatalogueResult<Service> {
    let registry = registry()?;
    let standard = CallFamily::new(surface::FAB_BLOCK_INFO, standard_table()?);
    let crypto = CallFamily::new(surface::FAB_CRYPTO, crypto_table()?);
    let transaction = Arc::new(transaction_table()?);
    let contract = Arc::new(contract_table()?);

    let bindings = vec![
        CallBinding::new("getBlockByHeight", &standard)
            .input("blockNumber", fab_block::BLOCK_NUMBER)
            .whole_output(&[fab_block::BLOCK_HASH])
            .transformers(single_entry(block_hash())?),
        CallBinding::new("generateBlocks", &standard)
            .input("numberOfBlocks", fab_block::BLOCKS_TO_GENERATE)
            .transformers(any_index(block_hash())?),
        CallBinding::new("getBlockCount", &standard).whole_output(&[fab_block::BLOCK_NUMBER]),
        CallBinding::new("getBestBlockHash", &standard)
            .whole_output(&[fab_block::BLOCK_HASH])
            .transformers(single_entry(block_hash())?),
        CallBinding::new("getBlockByHash", &standard)
            .input("hash", fab_block::BLOCK_HASH)
            .outputs(output_map([("height", fields(&[fab_block::BLOCK_NUMBER]))])),
        CallBinding::new("getTransactionById", &standard)
            .input("txid", fab_block::TXID)
            .outputs(output_map([("hex", fields(&[fab_block::TX_HEX]))]))
            .transformers(transaction.clone()),
        CallBinding::new("decodeTransactionRaw", &standard)
            .input("hexString", fab_block::TX_HEX)
            .transformers(transaction.clone()),
        CallBinding::new("dumpPrivateKey", &standard)
            .input("address", fab_block::ADDRESS)
            .whole_output(&[fab_block::PRIVATE_KEY])
            .transformers(single_entry(Transformer::fill(&[fab_block::PRIVATE_KEY]))?),
        CallBinding::new("createRawTransaction", &standard)
            .json_input("inputs", fab_block::TX_INPUTS)
            .json_input("outputs", fab_block::TX_OUTPUTS)
            .whole_output(&[fab_block::TX_HEX])
            .transformers(single_entry(transaction_hex())?),
        CallBinding::new("signRawTransaction", &standard)
            .input("hexString", fab_block::TX_HEX)
            .outputs(output_map([("hex", fields(&[fab_block::TX_HEX]))]))
            .transformers(transaction.clone()),
        CallBinding::new("sendRawTransaction", &standard)
            .input("rawTransactionHex", fab_block::TX_HEX)
            .transformers(transaction.clone()),
        CallBinding::new("insertAggregateSignature", &standard)
            .input("rawTransaction", fab_block::TX_HEX)
            .input("aggregateSignature", fab_block::TX_AGGREGATE_SIGNATURE)
            .transformers(transaction),
        CallBinding::new("getRawMempool", &standard).transformers(any_index(transaction_id())?),
        CallBinding::new("createContract", &standard)
            .input("contractHex", fab_block::CONTRACT_HEX)
            .outputs(output_map([("address", fields(&[fab_block::CONTRACT_ID]))]))
            .transformers(contract.clone()),
        CallBinding::new("callContract", &standard)
            .input("contractId", fab_block::CONTRACT_ID)
            .input("data", fab_block::CONTRACT_DATA)
            .transformers(contract.clone()),
        CallBinding::new("sendToContract", &standard)
            .input("contractId", fab_block::CONTRACT_ID)
            .input("data", fab_block::CONTRACT_DATA)
            .input("amount", fab_block::WALLET_AMOUNT)
            .transformers(contract),
        CallBinding::new("listContracts", &standard).transformers(Arc::new(
            TransformerTable::from_entries([("${label}", contract_id())])?,
        )),
        CallBinding::new("getNewAddress", &standard)
            .transformers(single_entry(Transformer::fill(&[fab_block::ADDRESS]))?),
        CallBinding::new("testSha3", &crypto)
            .base64_input("message", fab_schnorr::MESSAGE)
            .transformers(single_entry(shortener())?),
        CallBinding::new("testPrivateKeyGeneration", &crypto)
            .outputs(output_map([("privateKeyBase58Check", fields(&[fab_schnorr::PRIVATE_KEY]))])),
        CallBinding::new("testPublicKeyFromPrivate", &crypto)
            .input("privateKey", fab_schnorr::PRIVATE_KEY)
            .outputs(output_map([("publicKeyHexCompressed", fields(&[fab_schnorr::PUBLIC_KEY]))])),
        CallBinding::new("testSchnorrSignature", &crypto)
            .input("privateKey", fab_schnorr::PRIVATE_KEY)
            .base64_input("message", fab_schnorr::MESSAGE)
            .outputs(output_map([("signatureSchnorrBase58", fields(&[fab_schnorr::SIGNATURE]))])),
        CallBinding::new("testSchnorrSignatureVerify", &crypto)
            .input("signature", fab_schnorr::SIGNATURE)
            .input("publicKey", fab_schnorr::PUBLIC_KEY)
            .base64_input("message", fab_schnorr::MESSAGE)
            .handler(ResponseHandler::VerificationBanner),
        CallBinding::new("testAggregateSignatureInitialize", &crypto)
            .input("numberOfPrivateKeysToGenerate", fab_aggregate::KEYS_TO_GENERATE)
            .handler(ResponseHandler::CollectSigners(vec![
                SignerCollection::new("privateKeyBase58", fab_aggregate::PRIVATE_KEYS, JoinFormat::CommaSeparated),
                SignerCollection::new("myPublicKey", fab_aggregate::PUBLIC_KEYS, JoinFormat::CommaSeparated),
                SignerCollection::new("myPublicKey", fab_block::TX_AGGREGATE_PUBLIC_KEYS, JoinFormat::JsonArray),
            ])),
        CallBinding::new("testAggregateSignatureCommitment", &crypto)
            .base64_input("message", fab_aggregate::MESSAGE)
            .handler(ResponseHandler::CollectSigners(vec![
                SignerCollection::new("myNonceBase58", fab_aggregate::NONCES, JoinFormat::CommaSeparated),
                SignerCollection::new("commitmentHexCompressed", fab_aggregate::COMMITMENTS, JoinFormat::CommaSeparated),
            ])),
        CallBinding::new("testAggregateSignatureChallenge", &crypto)
            .input("committedSignersBitmap", fab_aggregate::SIGNERS_BITMAP)
            .input("commitments", fab_aggregate::COMMITMENTS)
            .outputs(output_map([(
                "aggregator",
                OutputTarget::Nested(output_map([
                    ("aggregateCommitment", fields(&[fab_aggregate::AGGREGATE_COMMITMENT])),
                    ("aggregatePublicKey", fields(&[fab_aggregate::AGGREGATE_PUBLIC_KEY])),
                    ("messageDigest", fields(&[fab_aggregate::MESSAGE_DIGEST])),
                ])),
            )])),
        CallBinding::new("testAggregateSignatureSolutions", &crypto)
            .input("committedSignersBitmap", fab_aggregate::SIGNERS_BITMAP)
            .input("messageDigest", fab_aggregate::MESSAGE_DIGEST)
            .input("aggregateCommitment", fab_aggregate::AGGREGATE_COMMITMENT)
            .input("aggregatePublicKey", fab_aggregate::AGGREGATE_PUBLIC_KEY)
            .handler(ResponseHandler::CollectSigners(vec![SignerCollection::new(
                "mySolution",
                fab_aggregate::SOLUTIONS,
                JoinFormat::CommaSeparated,
            )])),
        CallBinding::new("testAggregateSignatureAggregation", &crypto)
            .input("solutions", fab_aggregate::SOLUTIONS)
            .outputs(output_map([(
                "aggregator",
                OutputTarget::Nested(output_map([
                    ("signatureNoBitmap", fields(&[fab_aggregate::SIGNATURE])),
                    ("signatureComplete", fields(&[fab_aggregate::SIGNATURE_COMPLETE])),
                    (
                        "signatureUncompressed",
                        fields(&[fab_aggregate::SIGNATURE_UNCOMPRESSED, fab_block::TX_AGGREGATE_SIGNATURE]),
                    ),
                ])),
            )])),
        CallBinding::new("testAggregateVerification", &crypto)
            .input("signature", fab_aggregate::SIGNATURE)
            .input("committedSignersBitmap", fab_aggregate::SIGNERS_BITMAP)
            .input("publicKeys", fab_aggregate::PUBLIC_KEYS)
            .base64_input("message", fab_aggregate::MESSAGE)
            .handler(ResponseHandler::VerificationBanner),
        CallBinding::new("testAggregateVerificationComplete", &crypto)
            .input("signatureComplete", fab_aggregate::SIGNATURE_COMPLETE)
            .base64_input("messageBase64", fab_aggregate::MESSAGE)
            .handler(ResponseHandler::VerificationBanner),
    ];

    let bindings = BindingSet::new(standard, bindings, &registry)?;
    Ok(Service::new(registry, bindings))
}
