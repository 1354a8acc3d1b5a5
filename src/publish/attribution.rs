use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::RegistryStore;
use crate::config::{AttributionSettings, SYSTEM_ROLE_SCOPE};

/// Where the attribution identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionSource {
    Explicit,
    Email,
    Role,
    Fallback,
}

impl fmt::Display for AttributionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributionSource::Explicit => "explicit",
            AttributionSource::Email => "email lookup",
            AttributionSource::Role => "role lookup",
            AttributionSource::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub user_id: Uuid,
    pub source: AttributionSource,
}

/// Lookup tiers, tried in order before the fallback identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Explicit,
    Email,
    Role,
}

impl From<Tier> for AttributionSource {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Explicit => AttributionSource::Explicit,
            Tier::Email => AttributionSource::Email,
            Tier::Role => AttributionSource::Role,
        }
    }
}

const TIERS: [Tier; 3] = [Tier::Explicit, Tier::Email, Tier::Role];

/// Resolves the `modified_by` identifier. Never fails: every miss falls through, and the
/// last resort is the configured fallback identifier.
pub async fn resolve_attribution(
    settings: &AttributionSettings,
    registry: &dyn RegistryStore,
) -> Attribution {
    for tier in TIERS {
        if let Some(user_id) = try_tier(tier, settings, registry).await {
            let source = AttributionSource::from(tier);
            info!(%user_id, %source, "Attribution identifier resolved");
            return Attribution { user_id, source };
        }
    }

    warn!(
        user_id = %settings.fallback_id,
        "No system user found; attributing record to fallback identifier"
    );
    Attribution {
        user_id: settings.fallback_id,
        source: AttributionSource::Fallback,
    }
}

async fn try_tier(
    tier: Tier,
    settings: &AttributionSettings,
    registry: &dyn RegistryStore,
) -> Option<Uuid> {
    let source = AttributionSource::from(tier);
    match tier {
        Tier::Explicit => settings.explicit_id,
        Tier::Email => {
            let email = settings.email.as_deref()?;
            match registry.find_users_by_email(email).await {
                Ok(rows) => single(source, rows).map(|row| row.id),
                Err(error) => {
                    debug!(%source, %error, "Lookup failed; trying next tier");
                    None
                }
            }
        }
        Tier::Role => {
            match registry
                .find_role_assignments(&settings.role, SYSTEM_ROLE_SCOPE)
                .await
            {
                Ok(rows) => single(source, rows).map(|row| row.user_id),
                Err(error) => {
                    debug!(%source, %error, "Lookup failed; trying next tier");
                    None
                }
            }
        }
    }
}

/// Exactly one row is a hit; zero or several are a miss.
fn single<T>(source: AttributionSource, rows: Vec<T>) -> Option<T> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Some(row),
        _ => {
            debug!(%source, matches = count, "Lookup did not match exactly one row");
            None
        }
    }
}
