//! Route, memo, and quote-token resolution.
//!
//! Everything a transfer needs to know before a transaction can be built:
//! which channel and port connect two chains, whether the packet must be
//! forwarded through an intermediate chain, what the asset is called on
//! the destination, and the memo that tells the intermediate chain where
//! to forward. All offchain reads go through the hubble index client;
//! nothing here caches.

pub mod hubble;
pub mod pfm;
pub mod quote;
pub mod resolver;

pub use hubble::{ChannelRecommendation, HubbleClient, IndexError, RouteIndex, TokenIndex, WrappingRow};
pub use pfm::build_forward_memo;
pub use quote::{channel_ordinal, EvmView, QuoteError, QuoteResolver, ViewError};
pub use resolver::{RouteError, RouteResolver};
