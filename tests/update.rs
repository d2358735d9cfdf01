use modes_locations::error::UpdateError;
use modes_locations::model::{LocationKind, LocationRecord, ObjectLocationSet, PartialDate};
use modes_locations::update::{
    CurrentUpdate, UpdateMode, update_current, update_normal, update_previous,
};
use modes_locations::validate::validate;

fn date(raw: &str) -> PartialDate {
    raw.parse().expect("date parsed")
}

fn placed() -> ObjectLocationSet {
    ObjectLocationSet::new(vec![
        LocationRecord::normal("N1"),
        LocationRecord::current("A4", date("1.1.2020")),
    ])
}

fn with_history() -> ObjectLocationSet {
    ObjectLocationSet::new(vec![
        LocationRecord::normal("N1"),
        LocationRecord::current("C3", date("1.1.2022")),
        LocationRecord::previous("B2", date("1.1.2021"), date("1.1.2022")),
        LocationRecord::previous("A1", date("1.1.2020"), date("1.1.2021")),
    ])
}

#[test]
fn insert_demotes_the_current_location() {
    let mut history = placed();
    let request = CurrentUpdate::new("S12", date("1.6.2023"));

    let changed = update_current(&mut history, "JB001", &request).expect("update applied");

    assert!(changed);
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.records[1],
        LocationRecord::current("S12", date("1.6.2023"))
    );
    assert_eq!(
        history.records[2],
        LocationRecord::previous("A4", date("1.1.2020"), date("1.6.2023"))
    );
    assert_eq!(validate("JB001", &history, true), Ok(()));
}

#[test]
fn repeating_an_update_is_a_no_op() {
    let mut history = placed();
    let request = CurrentUpdate::new("S12", date("1.6.2023"));
    update_current(&mut history, "JB001", &request).expect("first update");
    let after_first = history.clone();

    let changed = update_current(&mut history, "JB001", &request).expect("second update");

    assert!(!changed);
    assert_eq!(history, after_first);
}

#[test]
fn location_comparison_ignores_case_and_spaces() {
    let mut history = placed();
    let request = CurrentUpdate::new("  a4 ", date("1.6.2023"));
    assert!(!update_current(&mut history, "JB001", &request).expect("no-op"));
    assert_eq!(history, placed());
}

#[test]
fn force_reports_a_change_without_touching_the_history() {
    let mut history = placed();
    let request = CurrentUpdate::new("A4", date("1.6.2023")).force(true);
    assert!(update_current(&mut history, "JB001", &request).expect("forced"));
    assert_eq!(history, placed());
}

#[test]
fn patch_edits_the_current_location_in_place() {
    let mut history = with_history();
    let request = CurrentUpdate::new("d5", date("1.3.2022"))
        .mode(UpdateMode::Patch)
        .reason(Some("recount".to_string()))
        .strict(false);

    assert!(update_current(&mut history, "JB001", &request).expect("patched"));

    assert_eq!(history.len(), 4);
    assert_eq!(
        history.records[1],
        LocationRecord::current("D5", date("1.3.2022")).with_reason("recount")
    );
}

#[test]
fn patch_that_opens_a_gap_is_rejected_in_strict_mode() {
    let mut history = with_history();
    let request = CurrentUpdate::new("D5", date("1.3.2022")).mode(UpdateMode::Patch);

    let result = update_current(&mut history, "JB001", &request);

    assert!(matches!(result, Err(UpdateError::Rejected(_))));
    assert_eq!(history, with_history());
}

#[test]
fn patch_marks_an_existing_reason_when_both_reasons_are_given() {
    let mut history = placed();
    history.records[1].reason = Some("loan".to_string());
    let request = CurrentUpdate::new("A5", date("1.1.2020"))
        .mode(UpdateMode::Patch)
        .reason(Some("audit".to_string()))
        .row_reason(Some("shelf moved".to_string()));

    update_current(&mut history, "JB001", &request).expect("patched");

    assert_eq!(history.records[1].reason.as_deref(), Some("loan (Patched)"));
}

#[test]
fn insert_prefers_the_row_reason() {
    let mut history = placed();
    let request = CurrentUpdate::new("S12", date("1.6.2023"))
        .reason(Some("audit".to_string()))
        .row_reason(Some("exhibition".to_string()));

    update_current(&mut history, "JB001", &request).expect("inserted");

    assert_eq!(history.records[1].reason.as_deref(), Some("exhibition"));
}

#[test]
fn move_to_normal_uses_the_home_location() {
    let mut history = placed();
    let request = CurrentUpdate::new("", date("1.6.2023")).mode(UpdateMode::MoveToNormal);

    assert!(update_current(&mut history, "JB001", &request).expect("moved"));

    let current = history.current().expect("current location");
    assert_eq!(current.text.as_deref(), Some("N1"));
    assert_eq!(history.previous().count(), 1);
}

#[test]
fn reset_current_keeps_only_the_demoted_location() {
    let mut history = with_history();
    let request = CurrentUpdate::new("E6", date("1.1.2023")).reset_current(true);

    assert!(update_current(&mut history, "JB001", &request).expect("inserted"));

    let previous: Vec<_> = history.previous().collect();
    assert_eq!(previous.len(), 1);
    assert_eq!(previous[0].text.as_deref(), Some("C3"));
    assert_eq!(history.len(), 3);
    assert_eq!(validate("JB001", &history, true), Ok(()));
}

#[test]
fn unplaced_objects_receive_their_first_location() {
    let mut history = ObjectLocationSet::new(vec![
        LocationRecord::normal("N1"),
        LocationRecord::new(LocationKind::Current, ""),
    ]);
    let request = CurrentUpdate::new("s1", date("1.6.2023"));

    assert!(update_current(&mut history, "JB001", &request).expect("placed"));

    assert_eq!(history.len(), 2);
    assert_eq!(
        history.records[1],
        LocationRecord::current("S1", date("1.6.2023"))
    );
}

#[test]
fn a_move_before_the_current_date_is_rejected() {
    let mut history = placed();
    let request = CurrentUpdate::new("S12", date("1.1.2019"));

    let result = update_current(&mut history, "JB001", &request);

    assert!(matches!(result, Err(UpdateError::Rejected(_))));
    assert_eq!(history, placed());
}

#[test]
fn missing_current_location_is_an_error() {
    let mut history = ObjectLocationSet::new(vec![LocationRecord::normal("N1")]);
    let request = CurrentUpdate::new("S12", date("1.6.2023"));
    assert_eq!(
        update_current(&mut history, "JB001", &request),
        Err(UpdateError::NoCurrentLocation("JB001".to_string()))
    );
}

#[test]
fn normal_location_is_replaced_when_different() {
    let mut history = placed();
    assert!(!update_normal(&mut history, "JB001", " n1 ", true).expect("no-op"));
    assert!(update_normal(&mut history, "JB001", "n2", true).expect("replaced"));
    assert_eq!(
        history.normal().and_then(|record| record.text.as_deref()),
        Some("N2")
    );
    assert_eq!(history.len(), 2);
}

#[test]
fn normal_location_must_exist() {
    let mut history = ObjectLocationSet::new(vec![LocationRecord::current("A4", date("1.1.2020"))]);
    assert_eq!(
        update_normal(&mut history, "JB001", "N1", true),
        Err(UpdateError::NoNormalLocation("JB001".to_string()))
    );
}

#[test]
fn adding_previous_locations_is_unsupported() {
    let mut history = placed();
    let result = update_previous(&mut history, "JB001", "X1", date("1.1.2019"));
    assert!(matches!(result, Err(UpdateError::Unsupported(_))));
    assert_eq!(history, placed());
}

#[test]
fn a_blank_target_never_demotes_a_placed_location() {
    let mut history = placed();
    let request = CurrentUpdate::new("  ", date("1.6.2023"));

    assert_eq!(
        update_current(&mut history, "JB001", &request),
        Err(UpdateError::EmptyLocation("JB001".to_string()))
    );
    assert_eq!(history, placed());

    let patch = CurrentUpdate::new("", date("1.6.2023")).mode(UpdateMode::Patch);
    assert_eq!(
        update_current(&mut history, "JB001", &patch),
        Err(UpdateError::EmptyLocation("JB001".to_string()))
    );
    assert_eq!(history, placed());
}

#[test]
fn a_blank_normal_location_is_refused() {
    let mut history = placed();
    assert_eq!(
        update_normal(&mut history, "JB001", "", true),
        Err(UpdateError::EmptyLocation("JB001".to_string()))
    );
    assert_eq!(history, placed());
}

#[test]
fn unplaced_objects_move_to_their_normal_location() {
    let mut history = ObjectLocationSet::new(vec![
        LocationRecord::normal("N1"),
        LocationRecord::new(LocationKind::Current, ""),
    ]);
    let request = CurrentUpdate::new("", date("1.6.2023")).mode(UpdateMode::MoveToNormal);

    assert!(update_current(&mut history, "JB001", &request).expect("placed"));

    assert_eq!(
        history.records[1],
        LocationRecord::current("N1", date("1.6.2023"))
    );
    assert_eq!(validate("JB001", &history, true), Ok(()));

    let mut homeless = ObjectLocationSet::new(vec![
        LocationRecord::new(LocationKind::Normal, ""),
        LocationRecord::new(LocationKind::Current, ""),
    ]);
    assert_eq!(
        update_current(&mut homeless, "JB001", &request),
        Err(UpdateError::EmptyLocation("JB001".to_string()))
    );
}
