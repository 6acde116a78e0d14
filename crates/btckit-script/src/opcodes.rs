//! Script opcode constants.
//!
//! Only the opcodes the SDK emits or recognizes are named; everything else
//! is rendered numerically in ASM output.

/// Push an empty byte vector (also OP_FALSE).
pub const OP_0: u8 = 0x00;
/// Alias of OP_0.
pub const OP_FALSE: u8 = 0x00;
/// Direct push of 1 byte. Opcodes 0x01..=0x4b push that many bytes.
pub const OP_DATA_1: u8 = 0x01;
/// Direct push of 20 bytes (hash160 programs).
pub const OP_DATA_20: u8 = 0x14;
/// Direct push of 32 bytes (taproot programs).
pub const OP_DATA_32: u8 = 0x20;
/// Largest direct push (75 bytes).
pub const OP_DATA_75: u8 = 0x4b;
/// Push with a 1-byte length prefix.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Push with a 2-byte little-endian length prefix.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Push with a 4-byte little-endian length prefix.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number 1 (also OP_TRUE).
pub const OP_1: u8 = 0x51;
/// Alias of OP_1.
pub const OP_TRUE: u8 = 0x51;
/// Push the number 13. Marks a runestone OP_RETURN output.
pub const OP_13: u8 = 0x5d;
/// Push the number 16.
pub const OP_16: u8 = 0x60;

/// Conditional execution.
pub const OP_IF: u8 = 0x63;
/// Negated conditional execution.
pub const OP_NOTIF: u8 = 0x64;
/// Conditional else branch.
pub const OP_ELSE: u8 = 0x67;
/// Conditional end.
pub const OP_ENDIF: u8 = 0x68;
/// Fail unless top of stack is truthy.
pub const OP_VERIFY: u8 = 0x69;
/// Mark output as unspendable; the remainder carries data.
pub const OP_RETURN: u8 = 0x6a;

/// Duplicate the top stack item.
pub const OP_DUP: u8 = 0x76;
/// Byte-wise equality.
pub const OP_EQUAL: u8 = 0x87;
/// Byte-wise equality, then OP_VERIFY.
pub const OP_EQUALVERIFY: u8 = 0x88;
/// Hash160 of the top stack item.
pub const OP_HASH160: u8 = 0xa9;
/// ECDSA/Schnorr signature check.
pub const OP_CHECKSIG: u8 = 0xac;
/// Multi-signature check.
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Render an opcode byte as its canonical ASM name.
///
/// # Arguments
/// * `op` - The opcode byte.
///
/// # Returns
/// The OP_xxx name for known opcodes, or `OP_UNKNOWN(0xNN)` otherwise.
pub fn opcode_to_string(op: u8) -> String {
    match op {
        OP_0 => "OP_0".to_string(),
        OP_PUSHDATA1 => "OP_PUSHDATA1".to_string(),
        OP_PUSHDATA2 => "OP_PUSHDATA2".to_string(),
        OP_PUSHDATA4 => "OP_PUSHDATA4".to_string(),
        0x51..=0x60 => format!("OP_{}", op - 0x50),
        OP_IF => "OP_IF".to_string(),
        OP_NOTIF => "OP_NOTIF".to_string(),
        OP_ELSE => "OP_ELSE".to_string(),
        OP_ENDIF => "OP_ENDIF".to_string(),
        OP_VERIFY => "OP_VERIFY".to_string(),
        OP_RETURN => "OP_RETURN".to_string(),
        OP_DUP => "OP_DUP".to_string(),
        OP_EQUAL => "OP_EQUAL".to_string(),
        OP_EQUALVERIFY => "OP_EQUALVERIFY".to_string(),
        OP_HASH160 => "OP_HASH160".to_string(),
        OP_CHECKSIG => "OP_CHECKSIG".to_string(),
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG".to_string(),
        _ => format!("OP_UNKNOWN(0x{:02x})", op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_int_names() {
        assert_eq!(opcode_to_string(OP_1), "OP_1");
        assert_eq!(opcode_to_string(OP_13), "OP_13");
        assert_eq!(opcode_to_string(OP_16), "OP_16");
    }

    #[test]
    fn test_unknown_opcode_rendering() {
        assert_eq!(opcode_to_string(0xfe), "OP_UNKNOWN(0xfe)");
    }
}
