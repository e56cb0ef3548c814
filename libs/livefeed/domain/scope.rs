//! View scope and the relevance predicate for scoped push updates

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type SharedViewScope = Arc<RwLock<ViewScope>>;

/// What the dashboard is currently looking at
///
/// An unset field accepts every value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewScope {
    pub universe: Option<String>,
    pub primary_mode: Option<String>,
    pub region: Option<String>,
    pub portfolio_scope: Option<String>,
}

/// Compare one scoped field. Either side unset matches.
pub fn field_matches(message_value: Option<&str>, view_value: Option<&str>) -> bool {
    match (message_value, view_value) {
        (Some(message), Some(view)) => message.trim().eq_ignore_ascii_case(view.trim()),
        _ => true,
    }
}

impl ViewScope {
    pub fn shared(self) -> SharedViewScope {
        Arc::new(RwLock::new(self))
    }

    pub fn top_picks_relevant(&self, universe: Option<&str>, primary_mode: Option<&str>) -> bool {
        field_matches(universe, self.universe.as_deref())
            && field_matches(primary_mode, self.primary_mode.as_deref())
    }

    /// Market summary and flows updates are keyed by region
    pub fn region_relevant(&self, region: Option<&str>) -> bool {
        field_matches(region, self.region.as_deref())
    }

    pub fn scalping_relevant(&self, universe: Option<&str>) -> bool {
        field_matches(universe, self.universe.as_deref())
    }

    pub fn portfolio_relevant(&self, scope: Option<&str>) -> bool {
        field_matches(scope, self.portfolio_scope.as_deref())
    }
}
