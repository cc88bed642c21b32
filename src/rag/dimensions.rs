use crate::errors::{RagError, RagResult};

/// Picks the vector dimension used to create the index.
///
/// Runs before any call to the search service, so a bad configuration
/// never reaches it.
pub fn resolve_dimensions(constructor: Option<usize>, dimensions_override: Option<usize>) -> RagResult<usize> {
    match (constructor, dimensions_override) {
        (None, None) => Err(RagError::Config(
            "No embedding dimensions were provided. Pass dimensions to the constructor or dimensions_override to create_index_maybe.".into(),
        )),
        (Some(ctor), Some(ovr)) if ctor != ovr => Err(RagError::Config(format!(
            "dimensions_override is different from dimensions provided to constructor. ({ovr} != {ctor})"
        ))),
        (Some(d), _) | (None, Some(d)) => {
            if d == 0 {
                return Err(RagError::Config("embedding dimensions must be positive".into()));
            }
            Ok(d)
        }
    }
}

/// Rejects an embedding whose length differs from the index dimension.
pub fn check_embedding(expected: usize, embedding: &[f32]) -> RagResult<()> {
    if embedding.len() != expected {
        return Err(RagError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}
