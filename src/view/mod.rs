//! Chain display records.
//!
//! Pure transformation from fetched chain data to what a presentation layer
//! renders. No network access and no state: the same chain always yields the
//! same records, in the same order.

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::ledger::{Block, Chain, NodeAddress};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Display data for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: String,
    /// `sender -> recipient: amount`, in block order.
    pub transactions: Vec<String>,
    pub proof: String,
    pub previous_hash: String,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            timestamp: format_timestamp(block.timestamp),
            transactions: block.transactions.iter().map(ToString::to_string).collect(),
            proof: proof_text(&block.proof),
            previous_hash: block.previous_hash.clone(),
        }
    }
}

impl fmt::Display for BlockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {}", self.index)?;
        writeln!(f, "  Timestamp: {}", self.timestamp)?;
        if self.transactions.is_empty() {
            writeln!(f, "  Transactions: none")?;
        } else {
            writeln!(f, "  Transactions:")?;
            for line in &self.transactions {
                writeln!(f, "    {}", line)?;
            }
        }
        writeln!(f, "  Proof: {}", self.proof)?;
        write!(f, "  Previous hash: {}", self.previous_hash)
    }
}

/// A peer's chain with a heading naming the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub heading: String,
    pub blocks: Vec<BlockRecord>,
}

/// Chain → display records, preserving block order exactly.
pub fn render_chain(chain: &Chain) -> Vec<BlockRecord> {
    chain.iter().map(BlockRecord::from).collect()
}

pub fn render_history(node: &NodeAddress, chain: &Chain) -> HistoryView {
    HistoryView {
        heading: format!("History of {}", node),
        blocks: render_chain(chain),
    }
}

/// Epoch seconds as UTC text; values chrono cannot represent are shown raw.
pub fn format_timestamp(secs: f64) -> String {
    if secs.is_finite() {
        let whole = secs.floor();
        let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
        if let Some(at) = DateTime::from_timestamp(whole as i64, nanos) {
            return at.format(TIMESTAMP_FORMAT).to_string();
        }
    }
    secs.to_string()
}

fn proof_text(proof: &Value) -> String {
    match proof {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
