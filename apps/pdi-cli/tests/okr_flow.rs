// okr_flow.rs — End-to-end test of one OKR cycle across the library crates.
//
// Flow:
//   1. Directory with a CEO, a COO, a sales head, and two collaborators
//   2. Company → area → individual objectives, each with key results
//   3. Owners submit before the cycle starts; managers approve
//   4. `advance` on the first day moves everything to tracking
//   5. Check-ins update key results, scores, and bands
//   6. Alignment tree and band summary reflect the scores
//   7. `advance` after the last day closes everything; check-ins stop

use chrono::NaiveDate;
use pdi_directory::{Directory, DirectoryGate, Person};
use pdi_habits::{evaluate_achievements, AchievementMetrics, AchievementType, Habit};
use pdi_okr::{
    build_alignment_tree, BandSummary, Confidence, Cycle, EventDispatcher, KeyResult, LogSink,
    Objective, ObjectiveLevel, ObjectiveStatus, OkrError, OkrEvent, OkrStore, Role, ScoreBand,
    Scorecard,
};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn okr_cycle_from_draft_to_closed() {
    // =========================================================
    // 1. People and storage
    // =========================================================

    let project = TempDir::new().unwrap();
    let store = OkrStore::new(project.path().join(".pdi/store")).unwrap();
    let events_log = project.path().join(".pdi/events.jsonl");
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_sink(Box::new(LogSink::new(&events_log)));

    let ceo = Person::new("Carla", Role::Admin);
    let coo = Person::new("Otto", Role::Admin).reporting_to(ceo.id);
    let head = Person::new("Hugo", Role::Head)
        .reporting_to(ceo.id)
        .in_area("Sales");
    let olive = Person::new("Olive", Role::Collaborator)
        .reporting_to(head.id)
        .in_area("Sales");
    let pete = Person::new("Pete", Role::Collaborator)
        .reporting_to(head.id)
        .in_area("Sales");
    let directory = Directory::new(vec![
        ceo.clone(),
        coo.clone(),
        head.clone(),
        olive.clone(),
        pete.clone(),
    ])
    .unwrap();
    let gate = DirectoryGate::new(&directory);

    let cycle = Cycle::new("2026 Q4", date(2026, 10, 1), date(2026, 12, 31)).unwrap();
    store.save_cycle(&cycle).unwrap();

    // =========================================================
    // 2. Objectives and key results
    // =========================================================

    let company = Objective::new("Grow ARR", ObjectiveLevel::Company, ceo.id, cycle.id);
    store.create_objective(&company).unwrap();
    dispatcher.dispatch(&OkrEvent::objective_created(&company));
    let arr = KeyResult::new(company.id, "ARR (millions)", 10.0, 20.0);
    store.save_key_result(&arr).unwrap();

    let mut area = Objective::new("Fill the pipeline", ObjectiveLevel::Area, head.id, cycle.id);
    area.parent_objective_id = Some(company.id);
    area.area = Some("Sales".into());
    store.create_objective(&area).unwrap();
    dispatcher.dispatch(&OkrEvent::objective_created(&area));
    let leads = KeyResult::new(area.id, "Qualified leads", 0.0, 100.0);
    store.save_key_result(&leads).unwrap();

    let mut mine = Objective::new("Close deals", ObjectiveLevel::Individual, olive.id, cycle.id);
    mine.parent_objective_id = Some(area.id);
    store.create_objective(&mine).unwrap();
    dispatcher.dispatch(&OkrEvent::objective_created(&mine));
    let mut deals = KeyResult::new(mine.id, "Deals closed", 0.0, 10.0);
    deals.weight = 2.0;
    store.save_key_result(&deals).unwrap();
    let churn = KeyResult::new(mine.id, "Churned accounts", 10.0, 0.0);
    store.save_key_result(&churn).unwrap();

    // An area objective cannot hang under an individual one.
    let mut upside_down = Objective::new("Wrong way", ObjectiveLevel::Area, head.id, cycle.id);
    upside_down.parent_objective_id = Some(mine.id);
    assert!(matches!(
        store.create_objective(&upside_down),
        Err(OkrError::ParentLevelMismatch { .. })
    ));

    // =========================================================
    // 3. Submit and approve before the cycle starts
    // =========================================================

    let before = date(2026, 9, 25);
    let submit = |objective: &Objective, owner: &Person| {
        store
            .apply_transition(
                objective.id,
                ObjectiveStatus::Draft,
                ObjectiveStatus::PendingValidation,
                &directory.actor_for(owner.id).unwrap(),
                &gate,
                before,
            )
            .unwrap()
    };
    submit(&company, &ceo);
    submit(&area, &head);
    submit(&mine, &olive);

    // A peer is stopped by the gate, the owner by the workflow.
    let by_peer = store.apply_transition(
        mine.id,
        ObjectiveStatus::PendingValidation,
        ObjectiveStatus::Approved,
        &pete.actor(),
        &gate,
        before,
    );
    assert!(matches!(by_peer, Err(OkrError::NotAuthorized { .. })));
    let by_owner = store.apply_transition(
        mine.id,
        ObjectiveStatus::PendingValidation,
        ObjectiveStatus::Approved,
        &olive.actor(),
        &gate,
        before,
    );
    assert!(matches!(by_owner, Err(OkrError::InvalidTransition(_))));

    for (objective, approver) in [(&company, &coo), (&area, &ceo), (&mine, &head)] {
        let outcome = store
            .apply_transition(
                objective.id,
                ObjectiveStatus::PendingValidation,
                ObjectiveStatus::Approved,
                &approver.actor(),
                &gate,
                before,
            )
            .unwrap();
        dispatcher.dispatch(&OkrEvent::status_changed(
            objective.id,
            outcome.from,
            outcome.objective.status,
            approver.id,
        ));
    }

    // A second approval from a stale view is refused.
    let stale = store.apply_transition(
        mine.id,
        ObjectiveStatus::PendingValidation,
        ObjectiveStatus::Approved,
        &head.actor(),
        &gate,
        before,
    );
    assert!(matches!(
        stale,
        Err(OkrError::StaleStatus {
            actual: ObjectiveStatus::Approved,
            ..
        })
    ));

    // =========================================================
    // 4. The cycle starts
    // =========================================================

    assert!(store.advance(before).unwrap().is_empty());
    let started = store.advance(cycle.starts_on).unwrap();
    assert_eq!(started.len(), 3);
    assert!(started
        .iter()
        .all(|o| o.from == ObjectiveStatus::Approved
            && o.objective.status == ObjectiveStatus::Tracking));

    // =========================================================
    // 5. Check-ins
    // =========================================================

    let outcome = store
        .record_check_in(deals.id, &olive.actor(), 9.0, Some(Confidence::High), None, &gate)
        .unwrap();
    dispatcher.dispatch(&OkrEvent::check_in_recorded(mine.id, &outcome.check_in));
    assert!(approx(outcome.check_in.previous_value, 0.0));
    store
        .record_check_in(churn.id, &olive.actor(), 5.0, None, Some("two saves".into()), &gate)
        .unwrap();
    store
        .record_check_in(leads.id, &head.actor(), 30.0, None, None, &gate)
        .unwrap();
    store
        .record_check_in(arr.id, &ceo.actor(), 15.0, Some(Confidence::Medium), None, &gate)
        .unwrap();

    let denied = store.record_check_in(deals.id, &pete.actor(), 10.0, None, None, &gate);
    assert!(matches!(denied, Err(OkrError::NotAuthorized { .. })));

    let mine_now = store.get_objective(mine.id).unwrap().unwrap();
    let card = Scorecard::build(&mine_now, &store.list_key_results(mine.id).unwrap());
    // (9 × 2 + 5 × 1) / 3
    assert!(approx(card.score.unwrap(), 23.0 / 3.0));
    assert_eq!(card.band, Some(ScoreBand::OnTrack));
    assert!(approx(mine_now.current_score.unwrap(), 23.0 / 3.0));
    assert_eq!(store.list_check_ins(deals.id).unwrap().len(), 1);

    // =========================================================
    // 6. Alignment tree and dashboard
    // =========================================================

    let objectives = store.list_objectives().unwrap();
    let forest = build_alignment_tree(&objectives, &store.list_all_key_results().unwrap());
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].objective.id, company.id);
    assert_eq!(forest[0].subtree_size(), 3);
    assert_eq!(forest[0].children[0].children[0].key_results.len(), 2);

    let summary = BandSummary::from_scores(objectives.iter().map(|o| o.current_score));
    assert_eq!(
        (summary.on_track, summary.at_risk, summary.off_track),
        (1, 1, 1)
    );
    assert!(approx(
        summary.mean_score.unwrap(),
        (23.0 / 3.0 + 5.0 + 3.0) / 3.0
    ));

    // =========================================================
    // 7. The cycle ends
    // =========================================================

    let closed = store.advance(date(2027, 1, 1)).unwrap();
    assert_eq!(closed.len(), 3);
    assert!(store
        .list_objectives_by_status(ObjectiveStatus::Closed)
        .unwrap()
        .len()
        == 3);
    let late = store.record_check_in(deals.id, &olive.actor(), 10.0, None, None, &gate);
    assert!(matches!(late, Err(OkrError::CheckInRejected { .. })));

    let log = std::fs::read_to_string(&events_log).unwrap();
    // 3 created + 3 approved + 1 check-in
    assert_eq!(log.lines().count(), 7);
}

#[test]
fn habit_history_unlocks_achievements_once() {
    let user = uuid::Uuid::new_v4();
    let read = Habit::new(user, "Read 20 pages");
    let logs: Vec<_> = (1..=8)
        .map(|d| read.log(date(2026, 10, d), true))
        .collect();

    let metrics = AchievementMetrics::from_habits(&[read], &logs, 1, 0);
    let first = evaluate_achievements(&metrics, &[]);
    assert_eq!(
        first,
        vec![
            AchievementType::FirstHabit,
            AchievementType::Streak7,
            AchievementType::FirstGoal,
        ]
    );
    assert!(evaluate_achievements(&metrics, &first).is_empty());
}
