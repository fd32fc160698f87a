//! End-to-end dispatch tests over the in-memory store and recording
//! transport: authorization, argument validation, relay turns, and the admin
//! flows.

mod common;

use bot_core::{AccessLevel, Chat, ChatMessage, UserSeed};
use relay_bot::events::{Incoming, IncomingKind, Sender};
use relay_bot::router::Router;
use relay_bot::strings;
use user_store::UserStore;

use common::{test_bot, Call, ScriptedBackend, TestBot};

const CHAT: Chat = Chat { id: 10 };

fn sender(id: i64) -> Sender {
    Sender {
        id,
        first_name: "Test".to_string(),
        username: Some("test".to_string()),
        language_code: Some("en".to_string()),
    }
}

fn command(from: i64, name: &str, args: &[&str]) -> Incoming {
    Incoming {
        chat: CHAT,
        sender: sender(from),
        kind: IncomingKind::Command {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        },
    }
}

fn text(from: i64, body: &str) -> Incoming {
    Incoming {
        chat: CHAT,
        sender: sender(from),
        kind: IncomingKind::Text(body.to_string()),
    }
}

fn callback(from: i64, payload: &str) -> Incoming {
    Incoming {
        chat: CHAT,
        sender: sender(from),
        kind: IncomingKind::Callback {
            payload: payload.to_string(),
            message_id: Some("55".to_string()),
        },
    }
}

async fn seed_user(bot: &TestBot, id: i64, level: AccessLevel) {
    let user = UserSeed {
        first_name: "Seeded".to_string(),
        username: None,
        language_code: Some("en".to_string()),
        access_level: level,
        chosen_model: "llama3.1".to_string(),
    }
    .into_record(id);
    bot.store.save(&user).await.unwrap();
}

#[tokio::test]
async fn guest_is_denied_verbosely_for_user_command() {
    let bot = test_bot(ScriptedBackend::new(&["unused"]), false);
    seed_user(&bot, 1, AccessLevel::Guest).await;

    Router::new()
        .dispatch(&bot.ctx, command(1, "reset", &[]))
        .await
        .unwrap();

    assert_eq!(bot.transport.sent_texts(), vec![strings::MSG_NO_ACCESS]);
}

#[tokio::test]
async fn unknown_command_gets_generic_reply() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);

    Router::new()
        .dispatch(&bot.ctx, command(1, "frobnicate", &[]))
        .await
        .unwrap();

    assert_eq!(bot.transport.sent_texts(), vec![strings::MSG_UNKNOWN_COMMAND]);
}

#[tokio::test]
async fn maintenance_mode_admits_only_admins() {
    let bot = test_bot(ScriptedBackend::new(&[]), true);
    seed_user(&bot, 1, AccessLevel::Moderator).await;
    seed_user(&bot, 2, AccessLevel::Admin).await;

    let router = Router::new();
    router
        .dispatch(&bot.ctx, command(1, "help", &[]))
        .await
        .unwrap();
    router
        .dispatch(&bot.ctx, command(2, "help", &[]))
        .await
        .unwrap();

    assert_eq!(
        bot.transport.sent_texts(),
        vec![strings::MSG_MAINTENANCE, strings::MSG_HELP]
    );
}

#[tokio::test]
async fn callback_arity_mismatch_edits_the_message() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::User).await;

    Router::new()
        .dispatch(&bot.ctx, callback(1, "choose_model"))
        .await
        .unwrap();

    assert_eq!(bot.transport.edits(), vec![strings::MSG_WRONG_ARGS]);
}

#[tokio::test]
async fn relay_turn_streams_edits_and_persists() {
    let bot = test_bot(ScriptedBackend::new(&["Hel", "lo, ", "world"]), false);

    Router::new()
        .dispatch(&bot.ctx, text(1, "hi there"))
        .await
        .unwrap();

    // Placeholder first, then the streamed edits ending in the full text.
    assert_eq!(bot.transport.sent_texts(), vec![strings::MSG_THINKING]);
    assert_eq!(
        bot.transport.edits().last().map(String::as_str),
        Some("Hello, world")
    );

    let stored = bot.store.get(1).await.unwrap();
    assert_eq!(stored.conversation.len(), 2);
    assert_eq!(
        stored.conversation.messages(),
        &[
            ChatMessage::user("hi there"),
            ChatMessage::assistant("Hello, world"),
        ]
    );
    assert_eq!(bot.ctx.providers.stability_percentage(), 100.0);
}

#[tokio::test]
async fn failed_stream_reports_and_persists_nothing() {
    let bot = test_bot(
        ScriptedBackend::failing_after(&["par"], "connection reset"),
        false,
    );

    Router::new()
        .dispatch(&bot.ctx, text(1, "hi"))
        .await
        .unwrap();

    let stored = bot.store.get(1).await.unwrap();
    assert!(stored.conversation.is_empty());
    assert_eq!(bot.ctx.providers.stability_percentage(), 0.0);
    // The failure notice arrives as a fresh message, leaving the partial
    // stream text in place.
    let sent = bot.transport.sent_texts();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].starts_with("Something went wrong"));
}

#[tokio::test]
async fn choose_model_respects_min_level() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::User).await;

    let router = Router::new();
    router
        .dispatch(&bot.ctx, callback(1, "choose_model gpt-4o"))
        .await
        .unwrap();
    assert_eq!(bot.transport.edits(), vec![strings::MSG_MODEL_UNAVAILABLE]);

    router
        .dispatch(&bot.ctx, callback(1, "choose_model llama2-uncensored"))
        .await
        .unwrap();
    let stored = bot.store.get(1).await.unwrap();
    assert_eq!(stored.chosen_model, "llama2-uncensored");
    assert_eq!(
        bot.transport.edits().last().map(String::as_str),
        Some("Model set to llama2-uncensored.")
    );
}

#[tokio::test]
async fn two_step_access_level_change() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;
    seed_user(&bot, 7, AccessLevel::User).await;

    let router = Router::new();
    router
        .dispatch(&bot.ctx, callback(1, "change_access_level ID7"))
        .await
        .unwrap();

    // Step one: a keyboard of level labels, each pointing at the confirm
    // callback.
    let calls = bot.transport.calls();
    let Some(Call::EditWithKeyboard { buttons, text, .. }) = calls.last() else {
        panic!("expected keyboard edit, got {:?}", calls.last());
    };
    assert_eq!(text, strings::MSG_CHOOSE_LEVEL);
    assert!(buttons
        .iter()
        .any(|(_, data)| data == "change_access_level_confirm ID7 4"));

    router
        .dispatch(&bot.ctx, callback(1, "change_access_level_confirm ID7 4"))
        .await
        .unwrap();

    let target = bot.store.get(7).await.unwrap();
    assert_eq!(target.access_level, AccessLevel::Admin);
    assert_eq!(
        bot.transport.edits().last().map(String::as_str),
        Some("Access level of user 7 is now Admin.")
    );
}

#[tokio::test]
async fn deleting_nonexistent_user_reports_not_found() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;

    Router::new()
        .dispatch(&bot.ctx, callback(1, "delete_user ID9999"))
        .await
        .unwrap();

    assert_eq!(bot.transport.edits(), vec!["User 9999 not found."]);
    // Only the admin themselves is in the store.
    assert_eq!(bot.store.len().await, 1);
}

#[tokio::test]
async fn delete_user_removes_the_record() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;
    seed_user(&bot, 7, AccessLevel::User).await;

    Router::new()
        .dispatch(&bot.ctx, callback(1, "delete_user ID7"))
        .await
        .unwrap();

    assert_eq!(bot.transport.edits(), vec!["User 7 deleted."]);
    assert!(bot.store.get(7).await.is_err());
}

#[tokio::test]
async fn silent_routes_do_not_explain_denials() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::User).await;

    Router::new()
        .dispatch(&bot.ctx, callback(1, "delete_user ID7"))
        .await
        .unwrap();

    assert!(bot.transport.calls().is_empty());
}

#[tokio::test]
async fn users_lists_one_line_per_user() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;
    seed_user(&bot, 7, AccessLevel::User).await;

    Router::new()
        .dispatch(&bot.ctx, command(1, "users", &[]))
        .await
        .unwrap();

    let sent = bot.transport.sent_texts();
    assert_eq!(sent.len(), 1);
    let lines: Vec<&str> = sent[0].lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l.contains("(ID7)")));
}

#[tokio::test]
async fn forward_requests_resends_user_messages() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;
    let mut target = bot.store.get(1).await.unwrap();
    target.id = 7;
    target.conversation.push(ChatMessage::user("first question"));
    target.conversation.push(ChatMessage::assistant("an answer"));
    target.conversation.push(ChatMessage::user("second question"));
    bot.store.save(&target).await.unwrap();

    Router::new()
        .dispatch(&bot.ctx, callback(1, "forward_requests ID7"))
        .await
        .unwrap();

    assert_eq!(
        bot.transport.sent_texts(),
        vec!["first question", "second question"]
    );
    assert_eq!(bot.transport.edits(), vec!["Forwarded 2 request(s)."]);
}

#[tokio::test]
async fn dump_sends_a_dated_json_document() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);
    seed_user(&bot, 1, AccessLevel::Admin).await;

    Router::new()
        .dispatch(&bot.ctx, command(1, "dump", &[]))
        .await
        .unwrap();

    let calls = bot.transport.calls();
    let Some(Call::Document { filename }) = calls.last() else {
        panic!("expected a document, got {:?}", calls.last());
    };
    assert!(filename.starts_with("users-"));
    assert!(filename.ends_with(".json"));
}

#[tokio::test]
async fn first_contact_creates_the_user_lazily() {
    let bot = test_bot(ScriptedBackend::new(&[]), false);

    Router::new()
        .dispatch(&bot.ctx, command(42, "start", &[]))
        .await
        .unwrap();

    let created = bot.store.get(42).await.unwrap();
    assert_eq!(created.access_level, AccessLevel::User);
    assert_eq!(created.chosen_model, "llama3.1");
    assert_eq!(bot.transport.sent_texts(), vec![strings::MSG_WELCOME]);
}
