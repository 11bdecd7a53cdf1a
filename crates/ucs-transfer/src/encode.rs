//! Receiver address encoding.
//!
//! Receivers arrive either `0x`-hex encoded (EVM/Move convention) or
//! bech32 encoded (Cosmos convention). EVM calls embed raw hex bytes, so
//! bech32 receivers are decoded first; Cosmos memos store hex without the
//! prefix, so `0x` is stripped; Move entry functions take raw bytes from
//! either encoding.

use bech32::FromBase32;
use ucs_types::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverEncoding {
	Hex,
	Bech32,
}

/// Which encoding a receiver string uses. Anything without a `0x` prefix
/// is treated as bech32.
pub fn detect(receiver: &str) -> ReceiverEncoding {
	if receiver.starts_with("0x") {
		ReceiverEncoding::Hex
	} else {
		ReceiverEncoding::Bech32
	}
}

/// Strips a leading `0x`, leaving everything else untouched.
pub fn strip_hex_prefix(receiver: &str) -> &str {
	receiver.strip_prefix("0x").unwrap_or(receiver)
}

/// Decodes a bech32 address to its raw data bytes.
pub fn bech32_to_bytes(address: &str) -> Result<Vec<u8>, TransferError> {
	let (_hrp, data, _variant) = bech32::decode(address)
		.map_err(|e| TransferError::Encoding(format!("invalid bech32 address {address:?}: {e}")))?;
	Vec::<u8>::from_base32(&data)
		.map_err(|e| TransferError::Encoding(format!("invalid bech32 payload in {address:?}: {e}")))
}

/// Raw bytes of a receiver in either encoding.
pub fn receiver_to_bytes(receiver: &str) -> Result<Vec<u8>, TransferError> {
	match detect(receiver) {
		ReceiverEncoding::Hex => hex::decode(strip_hex_prefix(receiver))
			.map_err(|e| TransferError::Encoding(format!("invalid hex receiver {receiver:?}: {e}"))),
		ReceiverEncoding::Bech32 => bech32_to_bytes(receiver),
	}
}

/// `0x`-hex form of a receiver: hex receivers pass through unchanged,
/// bech32 receivers are converted.
pub fn receiver_to_hex(receiver: &str) -> Result<String, TransferError> {
	match detect(receiver) {
		ReceiverEncoding::Hex => Ok(receiver.to_string()),
		ReceiverEncoding::Bech32 => Ok(format!("0x{}", hex::encode(bech32_to_bytes(receiver)?))),
	}
}
