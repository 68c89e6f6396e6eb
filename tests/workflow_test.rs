use bugdesk::types::{Bug, Priority, ReferenceKind, Status, User};
use bugdesk::workflow::matcher::AssigneeMatcher;
use bugdesk::workflow::{BugListController, Effect, Mode, SaveOutcome, WorkflowError};

fn load_fixture<T: serde::de::DeserializeOwned>(json: &str) -> Vec<T> {
    serde_json::from_str(json).expect("valid fixture")
}

fn fixture_bugs() -> Vec<Bug> {
    load_fixture(include_str!("fixtures/bugs.json"))
}

fn fixture_users() -> Vec<User> {
    load_fixture(include_str!("fixtures/users.json"))
}

/// Answer every reference load an editor asked for.
fn serve_references(controller: &mut BugListController, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::LoadPriorities { .. } => controller
                .on_priorities_loaded(load_fixture::<Priority>(include_str!("fixtures/priorities.json"))),
            Effect::LoadStatuses { .. } => controller
                .on_statuses_loaded(load_fixture::<Status>(include_str!("fixtures/statuses.json"))),
            Effect::LoadUsers { .. } => controller.on_users_loaded(fixture_users()),
            other => panic!("unexpected effect {other:?}"),
        }
    }
}

fn loaded_controller() -> BugListController {
    let mut controller = BugListController::new();
    controller.on_bugs_loaded(fixture_bugs());
    controller
}

fn submitted_ticket(effect: &Effect) -> u64 {
    match effect {
        Effect::SubmitCreate { ticket, .. } | Effect::SubmitUpdate { ticket, .. } => *ticket,
        other => panic!("expected a submit effect, got {other:?}"),
    }
}

fn stored(bug: &Bug, title: &str) -> Bug {
    Bug {
        title: title.to_owned(),
        ..bug.clone()
    }
}

// ---------------------------------------------------------------------------
// Browse, view and edit
// ---------------------------------------------------------------------------

#[test]
fn edit_and_save_returns_to_browsing() {
    let mut controller = loaded_controller();
    controller.select(1).unwrap();
    let effects = controller.begin_edit().unwrap();
    assert_eq!(effects.len(), 3, "first editor open loads all references");
    serve_references(&mut controller, &effects);

    let draft = controller.draft_mut().unwrap();
    draft.set_title("Crash on save with empty title");
    let effect = controller.submit(Some(3)).unwrap();
    let Effect::SubmitUpdate { ticket, payload } = &effect else {
        panic!("expected an update, got {effect:?}");
    };
    assert_eq!(payload.id, 1);
    assert_eq!(payload.assignee_id, Some(1));
    assert!(controller.is_saving());
    assert!(controller.draft_mut().is_none(), "draft is frozen while saving");

    let saved = stored(&fixture_bugs()[0], "Crash on save with empty title");
    let outcome = controller.on_save_succeeded(*ticket, saved);
    assert_eq!(outcome, SaveOutcome::Applied { bug_id: 1 });
    assert!(matches!(controller.mode(), Mode::Browsing));
    assert_eq!(
        controller.store().get(1).unwrap().title,
        "Crash on save with empty title"
    );
}

#[test]
fn draft_starts_equal_and_cancel_leaves_store_untouched() {
    let mut controller = loaded_controller();
    let before = controller.store().bugs().to_vec();
    for bug in &before {
        controller.select(bug.id).unwrap();
        controller.begin_edit().unwrap();
        assert!(controller.draft().unwrap().matches_bug(bug), "bug #{}", bug.id);

        let draft = controller.draft_mut().unwrap();
        draft.set_title("scribble");
        draft.set_description("more scribble");
        draft.set_assignee_text("Someone");
        assert_eq!(controller.store().bugs(), before.as_slice());

        controller.cancel().unwrap();
        assert!(matches!(controller.mode(), Mode::Viewing(id) if *id == bug.id));
        controller.close().unwrap();
    }
    assert_eq!(controller.store().bugs(), before.as_slice());
}

#[test]
fn second_editor_reuses_cached_references() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);
    controller.cancel().unwrap();

    assert!(controller.begin_create().unwrap().is_empty());
    assert_eq!(controller.priorities().len(), 4);
}

#[test]
fn create_records_the_creator_and_adds_the_bug() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);

    let draft = controller.draft_mut().unwrap();
    draft.set_title("  Export fails  ");
    draft.cycle_priority(&load_fixture::<Priority>(include_str!("fixtures/priorities.json")), true);
    let effect = controller.submit(Some(3)).unwrap();
    let Effect::SubmitCreate { ticket, payload } = &effect else {
        panic!("expected a create, got {effect:?}");
    };
    assert_eq!(payload.title, "Export fails");
    assert_eq!(payload.priority_id, Some(1));
    assert_eq!(payload.created_by_user_id, Some(3));

    let new_bug = Bug {
        id: 4,
        ..stored(&fixture_bugs()[0], "Export fails")
    };
    assert_eq!(
        controller.on_save_succeeded(*ticket, new_bug),
        SaveOutcome::Applied { bug_id: 4 }
    );
    assert_eq!(controller.store().len(), 4);
}

#[test]
fn cancel_during_save_reconciles_late_success() {
    let mut controller = loaded_controller();
    controller.select(1).unwrap();
    let effects = controller.begin_edit().unwrap();
    serve_references(&mut controller, &effects);
    controller.draft_mut().unwrap().set_title("Renamed");
    let ticket = submitted_ticket(&controller.submit(None).unwrap());

    controller.cancel().unwrap();
    assert!(matches!(controller.mode(), Mode::Viewing(1)));

    let outcome = controller.on_save_succeeded(ticket, stored(&fixture_bugs()[0], "Renamed"));
    assert_eq!(outcome, SaveOutcome::Reconciled { bug_id: 1 });
    assert!(matches!(controller.mode(), Mode::Viewing(1)));
    assert_eq!(controller.store().get(1).unwrap().title, "Renamed");

    // The same ticket answered twice is ignored.
    assert_eq!(
        controller.on_save_succeeded(ticket, stored(&fixture_bugs()[0], "Again")),
        SaveOutcome::Dropped
    );
}

#[test]
fn stale_result_does_not_close_a_newer_editor() {
    let mut controller = loaded_controller();
    controller.select(1).unwrap();
    let effects = controller.begin_edit().unwrap();
    serve_references(&mut controller, &effects);
    let first = submitted_ticket(&controller.submit(None).unwrap());
    controller.cancel().unwrap();

    controller.select(3).unwrap();
    controller.begin_edit().unwrap();
    controller.draft_mut().unwrap().set_title("Slow search on large projects");
    assert_eq!(
        controller.submit(None),
        Err(WorkflowError::SaveInFlight),
        "one save at a time"
    );

    let outcome = controller.on_save_succeeded(first, fixture_bugs()[0].clone());
    assert_eq!(outcome, SaveOutcome::Reconciled { bug_id: 1 });
    let draft = controller.draft().expect("second editor still open");
    assert_eq!(draft.title(), "Slow search on large projects");

    // A late failure for the old ticket is not shown on the new editor.
    assert_eq!(
        controller.on_save_failed(first, "boom".into()),
        SaveOutcome::Dropped
    );
    assert!(controller.edit_session().unwrap().error().is_none());
}

#[test]
fn reopening_a_bug_mid_save_waits_for_the_server() {
    let mut controller = loaded_controller();
    controller.select(1).unwrap();
    let effects = controller.begin_edit().unwrap();
    serve_references(&mut controller, &effects);
    controller.draft_mut().unwrap().set_title("Renamed once");
    let first = submitted_ticket(&controller.submit(None).unwrap());
    controller.cancel().unwrap();

    // No second editor on the same bug, so no second PUT from stale data.
    assert_eq!(controller.begin_edit(), Err(WorkflowError::SaveInFlight));
    assert!(matches!(controller.mode(), Mode::Viewing(1)));

    controller.on_save_succeeded(first, stored(&fixture_bugs()[0], "Renamed once"));
    controller.begin_edit().unwrap();
    assert_eq!(controller.draft().unwrap().title(), "Renamed once");
    let second = controller.submit(None).unwrap();
    let Effect::SubmitUpdate { payload, .. } = second else {
        panic!("expected an update");
    };
    assert_eq!(payload.title, "Renamed once");
}

#[test]
fn failed_save_keeps_the_draft() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);
    controller.draft_mut().unwrap().set_title("Export fails");
    let ticket = submitted_ticket(&controller.submit(Some(3)).unwrap());

    assert_eq!(
        controller.on_save_failed(ticket, "Title already exists".into()),
        SaveOutcome::Failed
    );
    let session = controller.edit_session().unwrap();
    assert_eq!(session.error(), Some("Title already exists"));
    assert_eq!(session.draft().title(), "Export fails");
    assert!(!session.is_saving());
    assert_eq!(controller.store().len(), 3);

    // Retrying issues a fresh ticket.
    let retry = submitted_ticket(&controller.submit(Some(3)).unwrap());
    assert_ne!(retry, ticket);
}

#[test]
fn refresh_while_viewing_a_deleted_bug_returns_to_browsing() {
    let mut controller = loaded_controller();
    controller.select(2).unwrap();
    let remaining: Vec<Bug> = fixture_bugs().into_iter().filter(|b| b.id != 2).collect();
    controller.on_bugs_loaded(remaining);
    assert!(matches!(controller.mode(), Mode::Browsing));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn blank_title_is_rejected_without_a_request() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);
    controller.draft_mut().unwrap().set_title("   ");

    assert_eq!(controller.submit(None), Err(WorkflowError::EmptyTitle));
    let session = controller.edit_session().unwrap();
    assert!(!session.is_saving());
    assert_eq!(session.error(), Some("title is required"));
}

#[test]
fn overlong_title_is_truncated_at_the_cap() {
    let mut controller = loaded_controller();
    controller.begin_create().unwrap();
    let draft = controller.draft_mut().unwrap();
    draft.set_title(&"x".repeat(300));
    assert_eq!(draft.title().chars().count(), 255);
    assert!(!draft.push_title_char('y'));
}

#[test]
fn transitions_out_of_order_are_refused() {
    let mut controller = loaded_controller();
    assert!(controller.begin_edit().is_err(), "nothing is being viewed");
    assert!(controller.close().is_err());
    assert!(controller.submit(None).is_err());
    assert_eq!(controller.select(42), Err(WorkflowError::UnknownBug(42)));

    controller.begin_create().unwrap();
    assert!(controller.select(1).is_err(), "cannot switch bugs mid-edit");
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[test]
fn disabled_priority_on_the_bug_stays_selectable() {
    let mut controller = loaded_controller();
    controller.select(2).unwrap();
    let effects = controller.begin_edit().unwrap();
    serve_references(&mut controller, &effects);

    let priorities = controller.priorities().to_vec();
    let draft = controller.draft().unwrap();
    let labels: Vec<String> = draft
        .priority_choices(&priorities)
        .iter()
        .map(|c| c.as_ref().map_or("-".to_owned(), |p| p.level.clone()))
        .collect();
    assert_eq!(labels, ["-", "Low", "Medium", "High", "Legacy"]);

    // Saving without touching the priority keeps it.
    let effect = controller.submit(None).unwrap();
    let Effect::SubmitUpdate { payload, .. } = effect else {
        panic!("expected an update");
    };
    assert_eq!(payload.priority_id, Some(4));
    assert_eq!(payload.status_id, Some(4));
}

#[test]
fn disabled_priority_cannot_be_picked_for_a_new_bug() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);
    controller.draft_mut().unwrap().set_title("Export fails");
    controller.draft_mut().unwrap().set_priority(Some(4));

    assert_eq!(controller.submit(None), Err(WorkflowError::InvalidPriority(4)));
}

#[test]
fn failed_reference_load_is_retried_on_next_open() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    assert!(controller.is_loading(ReferenceKind::Users));
    controller.on_priorities_loaded(Vec::new());
    controller.on_statuses_loaded(Vec::new());
    controller.on_reference_failed(ReferenceKind::Users);
    assert_eq!(effects.len(), 3);
    assert!(!controller.is_cached(ReferenceKind::Users));
    assert!(controller.suggestions(8).is_empty());
    controller.cancel().unwrap();

    let retry = controller.begin_create().unwrap();
    assert_eq!(retry, [Effect::LoadUsers { force: false }]);
}

#[test]
fn reload_asks_again_for_cached_references() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);
    controller.cancel().unwrap();

    let reloads = controller.reload_references().unwrap();
    assert_eq!(
        reloads,
        [
            Effect::LoadPriorities { force: true },
            Effect::LoadStatuses { force: true },
            Effect::LoadUsers { force: true },
        ]
    );
    assert!(controller.priorities().is_empty());

    // The editor opened meanwhile waits on the loads already in flight.
    assert!(controller.begin_create().unwrap().is_empty());
    serve_references(&mut controller, &reloads);
    assert_eq!(controller.priorities().len(), 4);
}

#[test]
fn assignee_suggestions_follow_typed_text() {
    let mut controller = loaded_controller();
    let effects = controller.begin_create().unwrap();
    serve_references(&mut controller, &effects);

    for c in "Jo".chars() {
        controller.draft_mut().unwrap().push_assignee_char(c);
    }
    assert!(controller.suggestions(8).is_empty(), "two characters are too few");

    controller.draft_mut().unwrap().push_assignee_char('h');
    let names: Vec<String> = controller
        .suggestions(8)
        .iter()
        .map(|c| c.user.full_name())
        .collect();
    assert_eq!(names, ["John Smith", "Joanna Lee"]);

    let john = controller
        .users()
        .unwrap()
        .users()
        .find(|u| u.id == 1)
        .unwrap()
        .clone();
    controller.draft_mut().unwrap().choose_assignee(&john);
    assert!(controller.draft().unwrap().assignee().is_linked());
    assert!(controller.suggestions(8).is_empty());

    // Editing the text again drops the link.
    controller.draft_mut().unwrap().pop_assignee_char();
    assert!(!controller.draft().unwrap().assignee().is_linked());
}

#[test]
fn disabled_users_are_never_suggested() {
    let matcher = AssigneeMatcher::new(fixture_users());
    assert!(matcher.search("Old Timer").is_empty());
    let hits = matcher.search("stone");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].user.id, 3);
    assert!(hits[0].score.abs() < f64::EPSILON);
}

#[test]
fn ranked_candidates_stay_within_threshold() {
    let matcher = AssigneeMatcher::new(fixture_users());
    for query in ["joh", "lee", "smit", "bob s", "jonna", "xyz"] {
        let hits = matcher.search(query);
        assert!(hits.iter().all(|c| c.score <= 0.4), "{query}");
        assert!(
            hits.windows(2).all(|w| w[0].score <= w[1].score),
            "{query} is not best-first"
        );
    }
}
