//! Process-wide flag recording whether the document SDK loaded at startup.
//!
//! Set once before any request is served and read-only afterwards.

use std::sync::OnceLock;

use crate::foundation::error::{PagError, PagResult};

static SDK_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Record SDK availability. The first call wins; the settled value is returned.
pub fn init(available: bool) -> bool {
    let settled = *SDK_AVAILABLE.get_or_init(|| available);
    if settled != available {
        tracing::warn!(settled, requested = available, "sdk capability flag already set");
    } else {
        tracing::info!(available = settled, "sdk capability flag set");
    }
    settled
}

/// Whether the SDK is usable. `false` until [`init`] has run.
pub fn is_available() -> bool {
    SDK_AVAILABLE.get().copied().unwrap_or(false)
}

pub fn ensure_available() -> PagResult<()> {
    if is_available() {
        Ok(())
    } else {
        Err(PagError::sdk_unavailable(
            "document sdk did not load at startup",
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sdk/capability.rs"]
mod tests;
