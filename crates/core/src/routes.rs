//! Broker routes for accepted submissions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::messages::Category;

/// Maps a submission to the route (queue name) it is published on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    /// Route for error catcher types outside the dedicated set
    #[serde(default = "default_errors_route")]
    pub default_errors_route: String,
    /// Error catcher types routed under their own name.
    ///
    /// Empty means every error catcher type is its own route.
    #[serde(default)]
    pub dedicated_error_routes: HashSet<String>,
    #[serde(default = "default_performance_route")]
    pub performance_route: String,
    #[serde(default = "default_sentry_route")]
    pub sentry_route: String,
    #[serde(default = "default_release_route")]
    pub release_route: String,
}

fn default_errors_route() -> String {
    "errors/default".to_string()
}

fn default_performance_route() -> String {
    "performance".to_string()
}

fn default_sentry_route() -> String {
    "external/sentry".to_string()
}

fn default_release_route() -> String {
    "release".to_string()
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            default_errors_route: default_errors_route(),
            dedicated_error_routes: HashSet::new(),
            performance_route: default_performance_route(),
            sentry_route: default_sentry_route(),
            release_route: default_release_route(),
        }
    }
}

impl RouteTable {
    /// Add a dedicated error route.
    pub fn with_dedicated(mut self, catcher_type: impl Into<String>) -> Self {
        self.dedicated_error_routes.insert(catcher_type.into());
        self
    }

    pub fn route_for<'a>(&'a self, category: Category, catcher_type: &'a str) -> &'a str {
        match category {
            Category::Errors
                if self.dedicated_error_routes.is_empty()
                    || self.dedicated_error_routes.contains(catcher_type) =>
            {
                catcher_type
            }
            Category::Errors => &self.default_errors_route,
            Category::Performance => &self.performance_route,
            Category::Sentry => &self.sentry_route,
            Category::Release => &self.release_route,
        }
    }
}
