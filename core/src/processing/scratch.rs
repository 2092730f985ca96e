use crate::prelude::{ResampError, ResampResult};

/// Allocates a zero-filled per-call buffer, reporting allocation failure
/// instead of aborting.
pub fn zeroed<T: Clone + Default>(length: usize, what: &str) -> ResampResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(length).map_err(|err| {
        ResampError::ResourceExhaustion(format!("{} ({} elements): {}", what, length, err))
    })?;
    buffer.resize(length, T::default());
    Ok(buffer)
}

/// Private copy of `source`, so the original stays untouched.
pub fn duplicate<T: Clone>(source: &[T], what: &str) -> ResampResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(source.len()).map_err(|err| {
        ResampError::ResourceExhaustion(format!("{} ({} elements): {}", what, source.len(), err))
    })?;
    buffer.extend_from_slice(source);
    Ok(buffer)
}
