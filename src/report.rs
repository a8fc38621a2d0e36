//! Plain-text rendering of dashboard, health and hospital data.

use std::fmt::Write;

use fedwatch_types::{HealthState, HealthStatus, Hospital, SessionState};

use crate::data::duration::format_age;
use crate::data::{DashboardView, Origin};

/// One line describing the backend health.
pub fn health_line(state: &HealthState, now_ms: u64) -> String {
    match state.last_checked_ms {
        Some(checked) if state.status != HealthStatus::Unknown => format!(
            "{} (checked {})",
            state.status.label(),
            format_age(checked, now_ms)
        ),
        _ => state.status.label().to_string(),
    }
}

/// Multi-line dashboard summary.
pub fn dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let metrics = &view.metrics;

    let _ = writeln!(
        out,
        "Federated model - round {} of {}{}",
        view.current_round,
        view.total_rounds,
        if view.is_live() { "" } else { " (offline data)" }
    );
    let _ = writeln!(out, "  Accuracy        {:>6.1}%", metrics.accuracy * 100.0);
    let _ = writeln!(out, "  F1 score        {:>6.3}", metrics.f1_score);
    let _ = writeln!(
        out,
        "  Hospitals       {} of {} participating ({:.0}%)",
        metrics.participating_hospitals,
        metrics.total_hospitals,
        metrics.participation_rate() * 100.0
    );
    let _ = writeln!(out, "  Data points     {}", metrics.data_points);

    let _ = writeln!(out);
    let _ = writeln!(out, "  Round  Accuracy  F1     Hospitals");
    for record in &view.performance_history {
        let _ = writeln!(
            out,
            "  {:>5}  {:>8.3}  {:>5.3}  {:>9}",
            record.round, record.accuracy, record.f1_score, record.hospitals
        );
    }

    let _ = writeln!(out);
    for bucket in &view.participation {
        let _ = writeln!(out, "  {:<10} {}", bucket.name, bucket.value);
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "  last fetch failed: {}", error);
    }
    if view.origins.metrics == Origin::Fallback {
        let _ = writeln!(out, "  showing fallback values");
    }
    out
}

/// Table of registered hospitals.
pub fn hospitals(hospitals: &[Hospital]) -> String {
    if hospitals.is_empty() {
        return "No hospitals registered\n".to_string();
    }

    let name_width = hospitals
        .iter()
        .map(|h| h.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<8}  {:>11}  LOCATION",
        "NAME", "STATUS", "DATA POINTS"
    );
    for hospital in hospitals {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<8}  {:>11}  {}",
            hospital.name,
            if hospital.is_active { "active" } else { "inactive" },
            hospital.data_points,
            hospital.location.as_deref().unwrap_or("-")
        );
    }
    out
}

/// One line describing the session.
pub fn session_line(state: &SessionState) -> String {
    match state {
        SessionState::Unresolved => "Session not resolved yet".to_string(),
        SessionState::SignedOut => "Signed out".to_string(),
        SessionState::SignedIn(session) => match &session.display_name {
            Some(_) => format!("Signed in as {} <{}>", session.label(), session.email),
            None => format!("Signed in as {}", session.email),
        },
    }
}

#[cfg(test)]
mod tests {
    use fedwatch_types::{FetchState, Session};

    use super::*;
    use crate::data::Fallbacks;

    #[test]
    fn test_health_line() {
        assert_eq!(health_line(&HealthState::unknown(), 0), "Unknown");
        let state = HealthState::completed(true, 1_000);
        assert_eq!(health_line(&state, 4_000), "Backend Connected (checked 3s ago)");
        let state = HealthState::completed(false, 1_000);
        assert!(health_line(&state, 1_000).starts_with("Backend Offline"));
    }

    #[test]
    fn test_dashboard_marks_offline_data() {
        let view = DashboardView::resolve(&FetchState::idle(), &Fallbacks::default());
        let text = dashboard(&view);
        assert!(text.contains("round 6 of 20 (offline data)"));
        assert!(text.contains("84.7%"));
        assert!(text.contains("12 of 15 participating"));
        assert!(text.contains("showing fallback values"));
    }

    #[test]
    fn test_hospitals_table() {
        let text = hospitals(&[Hospital {
            id: "1".into(),
            name: "General Hospital".into(),
            location: Some("Leeds".into()),
            is_active: true,
            data_points: 5400,
            joined_at: None,
        }]);
        assert!(text.starts_with("NAME"));
        assert!(text.contains("General Hospital  active"));
        assert!(text.contains("Leeds"));
        assert_eq!(hospitals(&[]), "No hospitals registered\n");
    }

    #[test]
    fn test_session_line() {
        assert_eq!(session_line(&SessionState::SignedOut), "Signed out");
        let state = SessionState::SignedIn(Session::new("u1", "doc@hospital.org"));
        assert_eq!(session_line(&state), "Signed in as doc@hospital.org");
        let state = SessionState::SignedIn(
            Session::new("u1", "doc@hospital.org").with_display_name("Dr. Ada"),
        );
        assert_eq!(session_line(&state), "Signed in as Dr. Ada <doc@hospital.org>");
    }
}
