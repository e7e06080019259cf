//! Output formatting for CLI display.

use crate::model::{Actor, Operation, PolygonOperationDetail};

/// One-line summary of an operation's state on a parcel.
pub(super) fn describe_detail(polygon_id: &str, detail: &PolygonOperationDetail) -> String {
    let operator = detail.operator_id.as_deref().unwrap_or("unassigned");
    let mut line = format!(
        "{polygon_id}/{}: {} ({operator})",
        detail.operation_id, detail.status
    );
    if !detail.tracks.is_empty() {
        line.push_str(&format!(", {} track(s)", detail.tracks.len()));
    }
    line
}

pub(super) fn describe_operation(operation: &Operation) -> String {
    let mut parts = vec![format!("{}: {}", operation.code, operation.description)];
    if let Some(date) = operation.planned_completion_date {
        parts.push(format!("due {date}"));
    }
    if let Some(hours) = operation.estimated_duration_hours {
        parts.push(format!("{hours}h estimated"));
    }
    parts.join(", ")
}

pub(super) fn describe_account(account: &Actor) -> String {
    format!("{} [{}] {}", account.id, account.role, account.state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountState, OperationStatus, Role};

    #[test]
    fn detail_names_operator_or_unassigned() {
        let mut detail = PolygonOperationDetail::new("OP-1");
        assert_eq!(describe_detail("P1", &detail), "P1/OP-1: UNASSIGNED (unassigned)");

        detail.status = OperationStatus::Assigned;
        detail.operator_id = Some("joana".into());
        assert_eq!(describe_detail("P1", &detail), "P1/OP-1: ASSIGNED (joana)");
    }

    #[test]
    fn operation_lists_only_present_metadata() {
        let mut op = Operation::new("OP-1", "Thinning", 4.0);
        assert_eq!(describe_operation(&op), "OP-1: Thinning");
        op.estimated_duration_hours = Some(6);
        assert_eq!(describe_operation(&op), "OP-1: Thinning, 6h estimated");
    }

    #[test]
    fn account_line() {
        let a = Actor::new("maria", Role::EndUser, AccountState::Active);
        assert_eq!(describe_account(&a), "maria [END_USER] ACTIVE");
    }
}
