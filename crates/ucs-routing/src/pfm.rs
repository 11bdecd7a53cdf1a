//! Packet-forward-middleware memo encoding.

use serde::Serialize;

#[derive(Serialize)]
struct Forward<'a> {
	port: &'a str,
	channel: &'a str,
	receiver: &'a str,
}

#[derive(Serialize)]
struct ForwardEnvelope<'a> {
	forward: Forward<'a>,
}

/// Encodes the forwarding instruction an intermediate chain's transfer
/// handler reads out of the memo field.
///
/// A leading `0x` on the receiver is stripped: Cosmos-side forwarding
/// memos store raw hex, and a prefixed receiver would make the memo
/// unparseable on the destination. Pure and byte-deterministic.
pub fn build_forward_memo(port: &str, channel: &str, receiver: &str) -> String {
	let receiver = receiver.strip_prefix("0x").unwrap_or(receiver);
	serde_json::to_string(&ForwardEnvelope {
		forward: Forward {
			port,
			channel,
			receiver,
		},
	})
	.expect("memo of plain strings serializes")
}
