//! Session and conversation log tests

mod common;

use common::mocks::{
    chain_with, default_template, medical_chunks, CountingOpener, FailingOpener, MockFactory,
    MockLLMClient,
};
use medibot::llm::{ChatSettings, ModelChoice};
use medibot::memory::{Session, SessionStore};
use medibot::types::{AppError, Role};
use std::sync::Arc;

#[tokio::test]
async fn test_successful_queries_alternate_user_and_assistant() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("An answer.")));
    let chain = chain_with(
        CountingOpener::new(medical_chunks()),
        factory,
        default_template(),
    );
    let mut session = Session::new(ChatSettings::default());

    let questions = ["What is aspirin?", "What is insulin?", "What is vitamin C?"];
    for question in questions {
        session.submit(&chain, 2, question).await.unwrap();
    }

    let turns = session.log().all();
    assert_eq!(turns.len(), 2 * questions.len());
    for (i, pair) in turns.chunks(2).enumerate() {
        assert_eq!(pair[0].role(), Role::User);
        assert_eq!(pair[0].text(), questions[i]);
        assert!(pair[0].sources().is_none());

        assert_eq!(pair[1].role(), Role::Assistant);
        assert_eq!(pair[1].text(), "An answer.");
        assert_eq!(pair[1].sources().map(|s| s.len()), Some(2));
    }
}

#[tokio::test]
async fn test_submit_returns_the_appended_answer() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("Insulin lowers blood sugar.")));
    let chain = chain_with(
        CountingOpener::new(medical_chunks()),
        factory,
        default_template(),
    );
    let mut session = Session::new(ChatSettings::default());

    let turn = session
        .submit(&chain, 1, "insulin blood sugar")
        .await
        .unwrap()
        .clone();

    assert_eq!(turn.role(), Role::Assistant);
    assert_eq!(turn.sources().unwrap()[0].id, "insulin:1");
    assert_eq!(session.log().last().unwrap().text(), turn.text());
}

#[tokio::test]
async fn test_store_failure_leaves_only_the_user_turn() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("unused")));
    let chain = chain_with(FailingOpener::always(), factory, default_template());
    let mut session = Session::new(ChatSettings::default());

    let err = session
        .submit(&chain, 3, "What is aspirin?")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StoreUnavailable(_)));
    let turns = session.log().all();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role(), Role::User);
    assert_eq!(turns[0].text(), "What is aspirin?");
}

#[tokio::test]
async fn test_store_failure_keeps_prior_turns_unchanged() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("An answer.")));
    let working = chain_with(
        CountingOpener::new(medical_chunks()),
        factory.clone(),
        default_template(),
    );
    let broken = chain_with(FailingOpener::always(), factory, default_template());
    let mut session = Session::new(ChatSettings::default());

    session.submit(&working, 2, "What is aspirin?").await.unwrap();
    session.submit(&working, 1, "What is insulin?").await.unwrap();

    let snapshot = |session: &Session| -> Vec<(Role, String, Option<Vec<String>>)> {
        session
            .log()
            .all()
            .iter()
            .map(|turn| {
                (
                    turn.role(),
                    turn.text().to_string(),
                    turn.sources()
                        .map(|sources| sources.iter().map(|c| c.id.clone()).collect()),
                )
            })
            .collect()
    };
    let before = snapshot(&session);
    assert_eq!(before.len(), 4);

    let err = session
        .submit(&broken, 2, "What is vitamin C?")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));

    let after = snapshot(&session);
    assert_eq!(after.len(), 5);
    assert_eq!(&after[..4], &before[..]);
    assert_eq!(after[4].0, Role::User);
    assert_eq!(after[4].1, "What is vitamin C?");
    assert!(after[4].2.is_none());
}

#[tokio::test]
async fn test_failed_query_can_be_retried() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("Recovered.")));
    let chain = chain_with(
        FailingOpener::new(1, medical_chunks()),
        factory,
        default_template(),
    );
    let mut session = Session::new(ChatSettings::default());

    assert!(session.submit(&chain, 1, "aspirin").await.is_err());
    let answer = session.submit(&chain, 1, "aspirin").await.unwrap();
    assert_eq!(answer.text(), "Recovered.");

    let roles: Vec<Role> = session.log().all().iter().map(|t| t.role()).collect();
    assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_blank_question_leaves_log_untouched() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("unused")));
    let chain = chain_with(
        CountingOpener::new(medical_chunks()),
        factory,
        default_template(),
    );
    let mut session = Session::new(ChatSettings::default());

    let err = session.submit(&chain, 3, "  ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert!(session.log().is_empty());
}

#[tokio::test]
async fn test_settings_changes_apply_to_the_next_query() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("ok")));
    let chain = chain_with(
        CountingOpener::new(medical_chunks()),
        factory.clone(),
        default_template(),
    );
    let mut session = Session::new(ChatSettings::default());

    session.submit(&chain, 1, "aspirin").await.unwrap();
    session.settings.model = ModelChoice::Gpt4oOpenAI;
    session.settings.set_temperature(0.9).unwrap();
    session.submit(&chain, 1, "aspirin").await.unwrap();

    assert_eq!(
        factory.requested(),
        vec![ModelChoice::Llama3Groq, ModelChoice::Gpt4oOpenAI]
    );
    let temperatures: Vec<f32> = factory
        .client()
        .params()
        .iter()
        .map(|p| p.temperature)
        .collect();
    assert_eq!(temperatures, vec![0.5, 0.9]);
}

#[tokio::test]
async fn test_clear_keeps_settings() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("ok")));
    let chain = chain_with(
        CountingOpener::new(medical_chunks()),
        factory,
        default_template(),
    );
    let settings = ChatSettings::new(ModelChoice::Mistral7bHf, 0.2).unwrap();
    let mut session = Session::new(settings);

    session.submit(&chain, 1, "aspirin").await.unwrap();
    session.submit(&chain, 1, "insulin").await.unwrap();
    session.clear();

    assert!(session.log().is_empty());
    assert_eq!(session.settings, settings);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let factory = Arc::new(MockFactory::new(MockLLMClient::new("ok")));
    let chain = Arc::new(chain_with(
        CountingOpener::new(medical_chunks()),
        factory,
        default_template(),
    ));
    let store = SessionStore::new();
    let (first_id, first) = store.create(ChatSettings::default());
    let (second_id, second) = store.create(ChatSettings::default());
    assert_ne!(first_id, second_id);

    let (a, b) = tokio::join!(
        {
            let chain = Arc::clone(&chain);
            let first = Arc::clone(&first);
            async move {
                let mut session = first.lock().await;
                session.submit(&chain, 1, "aspirin").await.map(|_| ())
            }
        },
        {
            let chain = Arc::clone(&chain);
            let second = Arc::clone(&second);
            async move {
                let mut session = second.lock().await;
                session.submit(&chain, 1, "insulin").await?;
                session.submit(&chain, 1, "vitamin").await.map(|_| ())
            }
        }
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(first.lock().await.log().len(), 2);
    assert_eq!(second.lock().await.log().len(), 4);

    first.lock().await.clear();
    assert_eq!(second.lock().await.log().len(), 4);
}
