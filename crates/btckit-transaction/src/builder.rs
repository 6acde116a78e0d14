//! Transaction assembly with the fee/change feedback loop.
//!
//! Fee depends on virtual size, virtual size depends on signature bytes,
//! and the final signatures commit to the final amounts. The builder
//! resolves that cycle by probe-signing to measure, fixing amounts, and
//! signing again: the probe signatures are disposable and are never
//! shipped once an output has changed underneath them.

use btckit_primitives::ec::PrivateKey;
use btckit_script::network::DUST_LIMIT;
use btckit_script::{Address, NetworkProfile, Script, ScriptKind};
use serde::{Deserialize, Serialize};

use crate::input::TxInput;
use crate::output::TxOutput;
use crate::sighash::{SIGHASH_ALL, SIGHASH_DEFAULT};
use crate::signer::SignatureEngine;
use crate::transaction::Transaction;
use crate::utxo::{PrevOutput, UtxoEntry, UtxoSet};
use crate::TransactionError;

/// The shared probe key used by the estimate-only entry points, so fee
/// quoting never needs real key material. Signature sizes are identical
/// to a real key's.
const PROBE_KEY_BYTES: [u8; 32] = [0x01; 32];

/// A declared output of the transaction being built.
///
/// Either an address or raw script hex; the address wins when both are
/// present. Zero-value OP_RETURN outputs are passed as script hex.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Destination address.
    #[serde(default)]
    pub address: Option<String>,
    /// Raw locking script hex, for non-address outputs.
    #[serde(default)]
    pub script_hex: Option<String>,
    /// Output value in satoshis.
    pub value: u64,
}

impl OutputSpec {
    /// Pay `value` to an address.
    ///
    /// # Arguments
    /// * `address` - The destination address.
    /// * `value` - The satoshi value.
    ///
    /// # Returns
    /// A new `OutputSpec`.
    pub fn to_address(address: &str, value: u64) -> Self {
        OutputSpec {
            address: Some(address.to_string()),
            script_hex: None,
            value,
        }
    }

    /// Pay `value` to a raw locking script.
    ///
    /// # Arguments
    /// * `script` - The locking script.
    /// * `value` - The satoshi value.
    ///
    /// # Returns
    /// A new `OutputSpec`.
    pub fn to_script(script: &Script, value: u64) -> Self {
        OutputSpec {
            address: None,
            script_hex: Some(script.to_hex()),
            value,
        }
    }

    /// Resolve the locking script.
    ///
    /// # Arguments
    /// * `network` - The network addresses must belong to.
    ///
    /// # Returns
    /// The locking script, or a validation error.
    pub fn script_pubkey(
        &self,
        network: &'static NetworkProfile,
    ) -> Result<Script, TransactionError> {
        if let Some(addr) = &self.address {
            return Ok(Address::from_string(addr, network)?.to_script());
        }
        if let Some(script_hex) = &self.script_hex {
            return Script::from_hex(script_hex).map_err(TransactionError::from);
        }
        Err(TransactionError::Validation(
            "output has neither address nor script".to_string(),
        ))
    }
}

/// Parameters for a build.
#[derive(Clone, Debug)]
pub struct BuildParams {
    /// The outputs to spend. Input count equals signer count at sign time.
    pub inputs: Vec<PrevOutput>,
    /// The declared outputs, change excluded.
    pub outputs: Vec<OutputSpec>,
    /// Address receiving any change above the minimum change value.
    pub change_address: String,
    /// Fee rate in satoshis per virtual byte.
    pub fee_rate: u64,
    /// Minimum change worth creating; below it the change output is
    /// dropped and the value folds into the fee. Defaults to the dust
    /// limit.
    pub min_change_value: Option<u64>,
    /// The network all addresses must belong to.
    pub network: &'static NetworkProfile,
}

/// A successfully built, fully signed transaction.
#[derive(Clone, Debug)]
pub struct BuildResult {
    /// The signed transaction.
    pub tx: Transaction,
    /// The fee paid, in satoshis.
    pub fee: u64,
    /// The change value, or `None` when the change output was dropped.
    pub change_value: Option<u64>,
    /// How many size/fee passes the loop ran (at most two for any
    /// fundable request).
    pub sizing_passes: u8,
}

/// Orchestrates assembly, probe signing, fee computation, and final
/// signing for one transaction. Owns private state only; independent
/// builds never share anything mutable.
pub struct TransactionBuilder {
    params: BuildParams,
}

impl TransactionBuilder {
    /// Create a builder for the given parameters.
    ///
    /// # Arguments
    /// * `params` - The build parameters.
    ///
    /// # Returns
    /// A new `TransactionBuilder`.
    pub fn new(params: BuildParams) -> Self {
        TransactionBuilder { params }
    }

    /// Build and sign the transaction with the caller's real keys.
    ///
    /// Identical parameters always produce byte-identical output.
    ///
    /// # Returns
    /// The signed transaction with its fee, or `InsufficientBalance`
    /// carrying the fee the request would need.
    pub fn build(&self) -> Result<BuildResult, TransactionError> {
        let mut keys = Vec::with_capacity(self.params.inputs.len());
        for prev in &self.params.inputs {
            keys.push(prev.private_key()?.key);
        }
        self.build_with_keys(&keys)
    }

    /// Compute the fee this request would pay, without real keys.
    ///
    /// Runs the same loop with the shared probe key; the resulting
    /// transaction is discarded.
    ///
    /// # Returns
    /// The fee in satoshis, or `InsufficientBalance` carrying it.
    pub fn estimate_fee(&self) -> Result<u64, TransactionError> {
        let probe = PrivateKey::from_bytes(&PROBE_KEY_BYTES)
            .map_err(|e| TransactionError::BadPrivateKey(e.to_string()))?;
        let keys = vec![probe; self.params.inputs.len()];
        Ok(self.build_with_keys(&keys)?.fee)
    }

    fn build_with_keys(&self, keys: &[PrivateKey]) -> Result<BuildResult, TransactionError> {
        let params = &self.params;
        if params.inputs.is_empty() {
            return Err(TransactionError::Validation(
                "transaction needs at least one input".to_string(),
            ));
        }
        if params.fee_rate == 0 {
            return Err(TransactionError::Validation(
                "fee rate must be positive".to_string(),
            ));
        }
        let min_change = params.min_change_value.unwrap_or(DUST_LIMIT);

        // Assemble inputs and the utxo set.
        let mut tx = Transaction::new();
        let mut utxos = UtxoSet::new();
        let mut total_in: u64 = 0;
        for prev in &params.inputs {
            let outpoint = prev.outpoint()?;
            let script_pubkey = prev.script_pubkey(params.network)?;
            utxos.insert(
                outpoint,
                UtxoEntry {
                    value: prev.value,
                    script_pubkey,
                },
            );
            tx.inputs.push(TxInput::new(outpoint.txid, outpoint.vout));
            total_in += prev.value;
        }

        // Declared outputs, then the reserved change slot.
        let mut declared_out: u64 = 0;
        for spec in &params.outputs {
            tx.outputs
                .push(TxOutput::new(spec.value, spec.script_pubkey(params.network)?));
            declared_out += spec.value;
        }
        let change_script = Address::to_script_pubkey(&params.change_address, params.network)?;
        tx.outputs.push(TxOutput::new(0, change_script));

        // Pass 1: probe-sign to learn the signed size.
        sign_all_inputs(&mut tx, keys, &utxos)?;
        let fee_with_change = tx.vsize() * params.fee_rate;

        let available = total_in.saturating_sub(declared_out);
        if total_in >= declared_out
            && available >= fee_with_change
            && available - fee_with_change >= min_change
        {
            // Fix the change amount, then sign for real: SIGHASH_ALL
            // commits to all outputs, so the probe signatures are stale.
            let change_value = available - fee_with_change;
            if let Some(slot) = tx.outputs.last_mut() {
                slot.value = change_value;
            }
            sign_all_inputs(&mut tx, keys, &utxos)?;
            return Ok(BuildResult {
                tx,
                fee: fee_with_change,
                change_value: Some(change_value),
                sizing_passes: 1,
            });
        }

        // Pass 2: drop the change slot and re-measure the smaller shape.
        tx.outputs.pop();
        sign_all_inputs(&mut tx, keys, &utxos)?;
        let fee_without_change = tx.vsize() * params.fee_rate;

        if total_in >= declared_out && available >= fee_without_change {
            // Everything above the declared outputs folds into the fee.
            // The pass-2 signatures already commit to this exact output
            // set, so they are final.
            return Ok(BuildResult {
                tx,
                fee: available,
                change_value: None,
                sizing_passes: 2,
            });
        }

        Err(TransactionError::InsufficientBalance {
            required_fee: fee_without_change,
        })
    }
}

/// Sign every input, choosing the flag by prevout kind: taproot inputs
/// use SIGHASH_DEFAULT, everything else SIGHASH_ALL.
fn sign_all_inputs(
    tx: &mut Transaction,
    keys: &[PrivateKey],
    utxos: &UtxoSet,
) -> Result<(), TransactionError> {
    if keys.len() != tx.inputs.len() {
        return Err(TransactionError::Validation(format!(
            "{} keys supplied for {} inputs",
            keys.len(),
            tx.inputs.len()
        )));
    }
    let engine = SignatureEngine::new(utxos);
    for index in 0..tx.inputs.len() {
        let outpoint = crate::utxo::Outpoint::new(
            tx.inputs[index].prev_txid,
            tx.inputs[index].prev_index,
        );
        let kind = utxos.require(&outpoint)?.script_pubkey.kind();
        let flag = if kind == ScriptKind::P2tr {
            SIGHASH_DEFAULT
        } else {
            SIGHASH_ALL
        };
        engine.sign_input(tx, index, &keys[index], flag)?;
    }
    Ok(())
}
