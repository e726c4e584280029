mod common;

use std::sync::Arc;

use lesson_core::model::{ActivityKind, ActivityOutcome, TopicCatalog};
use lesson_core::time::{fixed_clock, fixed_now};
use services::{
    ActivityInput, LessonOutcome, ProgressError, ProgressGraph, PuzzleView, RecordedSpeech,
    SessionError, WordBank,
};

use storage::repository::DocumentStore;

use common::{FlakyStore, chapter, orchestrator, seeded_store, topic, user};

async fn graph(store: &FlakyStore) -> ProgressGraph {
    let catalog: TopicCatalog = WordBank::new(Arc::new(store.clone()))
        .load_catalog(&chapter())
        .await
        .unwrap();
    ProgressGraph::new(fixed_clock(), Arc::new(store.clone()), chapter(), catalog)
}

#[tokio::test]
async fn failed_write_leaves_progress_untouched() {
    let store = FlakyStore::new(seeded_store().await);
    let graph = graph(&store).await;
    let (user, greetings) = (user(), topic("greetings"));

    let before = graph.open(&user, &greetings).await.unwrap();
    store.fail_writes(true);
    let err = graph
        .complete(&user, &greetings, ActivityKind::Flashcard, ActivityOutcome::full(6))
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::PersistenceFailure(_)));
    assert_eq!(graph.snapshot(&user, &greetings).await.unwrap(), before);
    assert_eq!(graph.open(&user, &greetings).await.unwrap(), before);

    store.fail_writes(false);
    let done = graph
        .complete(&user, &greetings, ActivityKind::Flashcard, ActivityOutcome::full(6))
        .await
        .unwrap();
    assert_eq!(done.unlocked, Some(ActivityKind::Matching));
}

#[tokio::test]
async fn session_keeps_finished_activity_until_commit_succeeds() {
    let store = FlakyStore::new(seeded_store().await);
    let mut orch = orchestrator(Arc::new(store.clone()), Arc::new(RecordedSpeech::new()));
    orch.start_activity(&user(), &chapter(), &topic("greetings"), ActivityKind::Flashcard)
        .await
        .unwrap();

    store.fail_writes(true);
    let mut result = Ok(None);
    for _ in 0..6 {
        result = orch
            .submit(ActivityInput::NextCard, fixed_now())
            .await
            .map(|u| u.outcome);
    }
    assert!(matches!(result, Err(SessionError::PersistenceFailure(_))));

    // still finished and waiting; progress not advanced
    assert!(matches!(
        orch.current_puzzle_state(),
        Some(PuzzleView::Finished {
            kind: ActivityKind::Flashcard
        })
    ));
    let progress = orch
        .progress_snapshot(&user(), &chapter(), &topic("greetings"))
        .await
        .unwrap();
    assert!(!progress.is_unlocked(ActivityKind::Matching));

    store.fail_writes(false);
    let update = orch.retry_completion().await.unwrap();
    assert!(matches!(
        update.outcome,
        Some(LessonOutcome::Completed {
            kind: ActivityKind::Flashcard,
            unlocked: Some(ActivityKind::Matching),
            ..
        })
    ));
    assert!(orch.current_puzzle_state().is_none());
    assert!(matches!(
        orch.retry_completion().await,
        Err(SessionError::NoActiveActivity)
    ));
}

#[tokio::test]
async fn failed_next_topic_unlock_does_not_fail_completion() {
    let store = FlakyStore::new(seeded_store().await);
    let graph = graph(&store).await;
    let (user, greetings, family) = (user(), topic("greetings"), topic("family"));

    for &kind in &ActivityKind::all()[..4] {
        graph
            .complete(&user, &greetings, kind, ActivityOutcome::full(6))
            .await
            .unwrap();
    }

    store.fail_writes_to("sub_chapters/family");
    let done = graph
        .complete(&user, &greetings, ActivityKind::SpeakIt, ActivityOutcome::full(6))
        .await
        .unwrap();
    assert!(done.topic_completed);
    let family_path = graph.document_path(&user, &family).unwrap();
    assert!(store.get_document(&family_path).await.unwrap().is_none());

    // the next topic is still reachable through the completed predecessor
    let next = graph.open(&user, &family).await.unwrap();
    assert!(next.is_unlocked(ActivityKind::Flashcard));
}

#[tokio::test]
async fn reset_next_topic_opens_once_predecessor_completes_despite_failed_unlock() {
    let store = FlakyStore::new(seeded_store().await);
    let graph = graph(&store).await;
    let (user, greetings, family) = (user(), topic("greetings"), topic("family"));

    let locked = graph.reset(&user, &family).await.unwrap();
    assert!(!locked.is_unlocked(ActivityKind::Flashcard));

    for &kind in &ActivityKind::all()[..4] {
        graph
            .complete(&user, &greetings, kind, ActivityOutcome::full(6))
            .await
            .unwrap();
    }
    store.fail_writes_to("sub_chapters/family");
    let done = graph
        .complete(&user, &greetings, ActivityKind::SpeakIt, ActivityOutcome::full(6))
        .await
        .unwrap();
    assert!(done.topic_completed);

    let family_path = graph.document_path(&user, &family).unwrap();
    let stored = store.get_document(&family_path).await.unwrap().unwrap();
    assert_eq!(stored["status"], "locked");

    let next = graph.open(&user, &family).await.unwrap();
    assert!(next.is_unlocked(ActivityKind::Flashcard));
}
