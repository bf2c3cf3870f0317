//! Asynchronous, append-only persistence of order transitions and trades.
//! An audit trail, not a recovery source: ordering is only preserved per
//! order id / per trade id, never globally.
//!
//! A pluggable `AuditSink`-style writer (stdout / file / in-memory) sits
//! behind one component: `enqueue` is `try_send` on a bounded
//! `tokio::sync::mpsc` channel (non-blocking, O(1), never stalls
//! matching) and a background task drains it, appending one JSON line
//! per record. Write failures are logged and flip a health flag; they
//! never reject an accepted order.

use crate::types::{OrderId, OrderStatus, Side, Symbol, TradeId, UserId};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One persisted record, matching the `orders`/`trades` schema field
/// names exactly.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "kind")]
pub enum PersistenceRecord {
    /// `orders` row on initial submission.
    OrderInsert {
        order_id: OrderId,
        symbol: Symbol,
        user: UserId,
        side: Side,
        #[serde(rename = "type")]
        order_type: &'static str,
        quantity: Decimal,
        price: Option<Decimal>,
        timestamp: u64,
        status: OrderStatus,
    },
    /// `orders` row status transition (partial/filled/cancelled).
    OrderStatusChange {
        order_id: OrderId,
        status: OrderStatus,
        timestamp: u64,
    },
    /// `trades` row.
    TradeRecord {
        trade_id: TradeId,
        symbol: Symbol,
        price: Decimal,
        quantity: Decimal,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        aggressor_side: Side,
        timestamp: u64,
    },
}

/// A sink for persisted records. Implementations write to stdout, a
/// file, or an in-memory buffer (tests). One JSON line per record.
pub trait PersistenceWriter: Send + 'static {
    fn write(&mut self, record: &PersistenceRecord) -> std::io::Result<()>;
}

/// Writes one JSON line per record to stdout.
pub struct StdoutWriter;

impl PersistenceWriter for StdoutWriter {
    fn write(&mut self, record: &PersistenceRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)?;
        println!("{line}");
        Ok(())
    }
}

/// Appends one JSON line per record to a file, flushing after each
/// write (this is an audit trail, not a hot path).
pub struct FileWriter {
    file: std::fs::File,
}

impl FileWriter {
    pub fn create(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl PersistenceWriter for FileWriter {
    fn write(&mut self, record: &PersistenceRecord) -> std::io::Result<()> {
        use std::io::Write;
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }
}

/// In-memory sink for tests. Clone shares the same backing buffer.
#[derive(Clone, Default)]
pub struct InMemoryWriter {
    records: Arc<std::sync::Mutex<Vec<PersistenceRecord>>>,
}

impl InMemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PersistenceRecord> {
        self.records.lock().expect("lock").clone()
    }
}

impl PersistenceWriter for InMemoryWriter {
    fn write(&mut self, record: &PersistenceRecord) -> std::io::Result<()> {
        self.records.lock().expect("lock").push(record.clone());
        Ok(())
    }
}

/// Handle to the persistence background task. `enqueue` is the only
/// method called from inside a symbol's critical section; it never
/// blocks or performs I/O itself.
#[derive(Clone)]
pub struct PersistenceSink {
    sender: mpsc::Sender<PersistenceRecord>,
    healthy: Arc<AtomicBool>,
    dropped: Arc<std::sync::atomic::AtomicU64>,
}

const CHANNEL_CAPACITY: usize = 16_384;

impl PersistenceSink {
    /// Spawns the background writer task on the current Tokio runtime.
    pub fn spawn(mut writer: impl PersistenceWriter) -> Self {
        let (sender, mut receiver) = mpsc::channel::<PersistenceRecord>(CHANNEL_CAPACITY);
        let healthy = Arc::new(AtomicBool::new(true));
        let healthy_task = healthy.clone();
        tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                if let Err(e) = writer.write(&record) {
                    log::error!("persistence write failed: {e}");
                    healthy_task.store(false, Ordering::Relaxed);
                } else {
                    healthy_task.store(true, Ordering::Relaxed);
                }
            }
        });
        Self {
            sender,
            healthy,
            dropped: Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }

    /// Non-blocking enqueue. Drops and counts the record (rather than
    /// ever stalling the caller) if the queue is saturated.
    pub fn enqueue(&self, record: PersistenceRecord) {
        if self.sender.try_send(record).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::warn!("persistence queue saturated, dropping record");
        }
    }

    /// Health signal for `GET /health` (propagation policy):
    /// persistence failures are surfaced but never reject an order.
    pub fn healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
