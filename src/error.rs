use thiserror::Error;

/// Fatal scoring errors. Either condition aborts the whole batch — the
/// pipeline never emits partially-scored output.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Two distinct trait types normalized to the same output column key.
    #[error(
        "trait types {first:?} and {second:?} both map to column {key:?}"
    )]
    DuplicateColumnKey {
        key: String,
        first: String,
        second: String,
    },

    /// An asset references a trait type absent from the batch catalog.
    /// Cannot happen when the catalog was built from the same batch, but a
    /// caller-supplied catalog may be stale.
    #[error("asset {token_id} has trait type {trait_type:?} not in the catalog")]
    CatalogMismatch {
        token_id: String,
        trait_type: String,
    },
}
