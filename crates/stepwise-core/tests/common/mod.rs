#![allow(dead_code)]

use std::time::Duration;

use jiff::{
    civil::{date, time},
    tz::TimeZone,
};
use stepwise_core::{
    models::{NewGoal, NewStep, StepType, SupportRole},
    EngineConfig, Tracker, TrackerBuilder,
};
use tempfile::TempDir;

/// Engine settings that keep tests fast and independent of the host zone
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_time_zone(TimeZone::UTC)
        .with_throttle_interval(Duration::ZERO)
}

/// Helper function to create a test tracker
pub async fn create_test_tracker() -> (TempDir, Tracker) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let tracker = TrackerBuilder::new()
        .with_database_path(&db_path)
        .with_config(test_config())
        .build()
        .await
        .expect("Failed to create tracker");
    (temp_dir, tracker)
}

/// A validated one-off goal starting on 2024-03-04 at 09:00
pub fn new_goal(title: &str) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: None,
        category: None,
        start_date: date(2024, 3, 4),
        due_date: None,
        frequency_per_week: None,
        selected_days: Vec::new(),
        duration_weeks: 1,
        time_of_day: time(9, 0, 0, 0),
        support_role: SupportRole::None,
    }
}

/// An individual step at `order_index`, chained to the one before it
pub fn new_step(title: &str, order_index: u32) -> NewStep {
    NewStep {
        title: title.to_string(),
        description: None,
        order_index,
        due_date: None,
        is_required: true,
        is_supporter_step: false,
        step_type: StepType::Action,
        week_number: None,
        session_number: None,
        estimated_minutes: None,
        depends_on_previous: order_index > 0,
    }
}
