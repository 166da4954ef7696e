//! Per-user dashboard preferences.
//!
//! Preferences are created lazily: reading a user without a stored row
//! yields [`UserPreferences::default_for`], which is not persisted until the
//! user saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Default dashboard refresh interval in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u32 = 3000;

/// Bounds accepted for the refresh interval, in milliseconds.
pub const MIN_REFRESH_INTERVAL_MS: u32 = 1000;
pub const MAX_REFRESH_INTERVAL_MS: u32 = 60_000;

/// Number of columns in the dashboard grid.
const GRID_COLUMNS: u32 = 12;

/// A dashboard panel that can be shown or hidden.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    Metrics,
    SystemHealth,
    Alerts,
    AnalyticsMetrics,
    TeamPerformance,
}

impl Widget {
    /// Widgets visible for a user that never saved preferences.
    pub const DEFAULT_VISIBLE: [Widget; 3] = [Widget::Metrics, Widget::SystemHealth, Widget::Alerts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::Metrics => "metrics",
            Widget::SystemHealth => "systemHealth",
            Widget::Alerts => "alerts",
            Widget::AnalyticsMetrics => "analyticsMetrics",
            Widget::TeamPerformance => "teamPerformance",
        }
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard colour theme.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

/// Position and size of one widget on the dashboard grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct LayoutItem {
    /// Widget identifier this cell belongs to.
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(rename = "minW", default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(rename = "minH", default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
}

/// Stored (or default) preferences for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserPreferences {
    pub user_id: i64,
    pub visible_widgets: Vec<Widget>,
    pub dashboard_layout: Vec<LayoutItem>,
    pub theme: Theme,
    /// Refresh interval in milliseconds.
    pub refresh_interval: u32,
    /// `None` when the preferences have never been saved.
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserPreferences {
    /// Constructs the defaults for a user without a stored row.
    pub fn default_for(user_id: i64) -> Self {
        Self {
            user_id,
            visible_widgets: Widget::DEFAULT_VISIBLE.to_vec(),
            dashboard_layout: Vec::new(),
            theme: Theme::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            updated_at: None,
        }
    }

    /// Returns true if the preferences came from storage.
    pub fn is_persisted(&self) -> bool {
        self.updated_at.is_some()
    }

    /// Returns true if `widget` is visible.
    pub fn shows(&self, widget: Widget) -> bool {
        self.visible_widgets.contains(&widget)
    }

    /// Sorts and deduplicates the visible widget set.
    pub fn normalize(&mut self) {
        self.visible_widgets.sort();
        self.visible_widgets.dedup();
    }
}

/// Partial preference update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub visible_widgets: Option<Vec<Widget>>,
    #[serde(default)]
    pub dashboard_layout: Option<Vec<LayoutItem>>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    #[validate(range(
        min = 1000,
        max = 60000,
        message = "Refresh interval must be between 1000 and 60000 ms"
    ))]
    pub refresh_interval: Option<u32>,
}

impl PreferencesUpdate {
    /// Checks the grid layout for unusable cells.
    pub fn check_layout(&self) -> Result<(), String> {
        let Some(layout) = &self.dashboard_layout else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for item in layout {
            if item.i.is_empty() {
                return Err("Layout item is missing a widget identifier".to_string());
            }
            if !seen.insert(item.i.as_str()) {
                return Err(format!("Duplicate layout item '{}'", item.i));
            }
            if item.w == 0 || item.h == 0 {
                return Err(format!("Layout item '{}' has zero size", item.i));
            }
            if item.x + item.w > GRID_COLUMNS {
                return Err(format!(
                    "Layout item '{}' exceeds the {} column grid",
                    item.i, GRID_COLUMNS
                ));
            }
        }
        Ok(())
    }

    /// Applies this update on top of `base`.
    pub fn apply_to(self, mut base: UserPreferences) -> UserPreferences {
        if let Some(widgets) = self.visible_widgets {
            base.visible_widgets = widgets;
        }
        if let Some(layout) = self.dashboard_layout {
            base.dashboard_layout = layout;
        }
        if let Some(theme) = self.theme {
            base.theme = theme;
        }
        if let Some(interval) = self.refresh_interval {
            base.refresh_interval = interval;
        }
        base.normalize();
        base
    }
}
