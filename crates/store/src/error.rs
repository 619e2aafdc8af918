/// Failure reported by a store backend.
///
/// The in-memory stores never fail; the variant exists for backends that
/// talk to an external service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}
