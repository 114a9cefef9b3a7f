use crate::entities::anomaly::AnomalyFinding;
use crate::error::DomainError;

/// Durable alert storage. Findings are handed over once; the core never reads alerts back.
pub trait AlertSink: Send + Sync {
    fn record(&self, finding: &AnomalyFinding) -> Result<(), DomainError>;
}
