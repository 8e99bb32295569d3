//! Layered settings: compiled-in defaults overridden by prefixed environment
//! variables (`AGORA_DISCOVERY_TTL_MS=5000`, ...).

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Build the figment used to extract `T`. Exposed so callers can merge extra
/// providers on top.
pub fn figment<T>(prefix: &str) -> Figment
where
    T: Serialize + Default,
{
    Figment::new()
        .merge(Serialized::defaults(T::default()))
        .merge(Env::prefixed(prefix))
}

/// Extract `T` from its defaults and the environment variables under `prefix`.
pub fn from_env<T>(prefix: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    Ok(figment::<T>(prefix).extract()?)
}

/// Whole milliseconds of `duration` for a `*_ms` setting, saturating at
/// `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
