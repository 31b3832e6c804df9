mod support;

use std::sync::Arc;

use chat_provider::Role;
use chat_provider_mock::MockProvider;
use persistent_chat::app::{ChatApp, Flow};
use persistent_chat::readline::ReadLine;
use persistent_chat::session::{SessionController, TurnOutcome};
use support::{chunks, controller, disable_colors, no_cancel, ScriptedReader};

fn run_script(
    session: SessionController,
    reader: ScriptedReader,
    preset: Option<&str>,
) -> (SessionController, String) {
    disable_colors();
    let mut out = Vec::new();
    let mut app = ChatApp::new(session, reader, &mut out, no_cancel());
    app.run(preset.map(str::to_string)).expect("session should run");
    let session = app.into_session();
    (session, String::from_utf8(out).expect("output should be utf-8"))
}

#[test]
fn menu_choice_is_persisted_and_used_for_turns() {
    let (_dir, session, provider) = controller(MockProvider::echo());
    let reader = ScriptedReader::new(&["2", "hello there", "/quit"]);

    let (session, output) = run_script(session, reader, None);

    assert!(output.contains("1. mock\n"));
    assert!(output.contains("2. mock-alt\n"));
    assert!(output.contains("Using model: mock-alt"));
    assert!(output.contains("hello there"));
    assert!(output.contains("Goodbye! Your chat history has been saved."));
    assert_eq!(session.store().config().last_model(), Some("mock-alt"));

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "mock-alt");

    let log = session.store().log().messages();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].role, Role::Assistant);
    assert_eq!(log[1].content, "hello there");
}

#[test]
fn invalid_menu_input_reprompts() {
    let (_dir, session, _provider) = controller(MockProvider::echo());
    let reader = ScriptedReader::new(&["", "seven", "9", "1", "/goodbye"]);

    let (session, output) = run_script(session, reader, None);

    assert!(output.contains("No previous model found. Please select a model."));
    assert!(output.contains("Invalid input. Please enter a number."));
    assert!(output.contains("Invalid selection. Please choose 1-2"));
    assert!(output.contains("Using model: mock\n"));
    assert!(output.contains("Thank you for chatting"));
    assert!(session.store().log().is_empty());
}

#[test]
fn enter_reuses_last_model_marked_in_menu() {
    let (_dir, mut session, _provider) = controller(MockProvider::echo());
    session
        .store_mut()
        .config_mut()
        .update_last_model("mock-alt")
        .expect("config should save");
    let reader = ScriptedReader::new(&["", "/quit"]);

    let (_session, output) = run_script(session, reader, None);

    assert!(output.contains("2. mock-alt (last used)"));
    assert!(output.contains("Using model: mock-alt"));
}

#[test]
fn no_models_ends_the_session() {
    let (_dir, session, provider) = controller(MockProvider::echo().with_models(Vec::new()));
    let reader = ScriptedReader::new(&["hello"]);

    let (session, output) = run_script(session, reader, None);

    assert!(output.contains("No Ollama models found"));
    assert!(provider.requests().is_empty());
    assert!(session.store().log().is_empty());
}

#[test]
fn preset_model_skips_the_menu() {
    let (_dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let reader = ScriptedReader::new(&["ping"]);

    let (session, output) = run_script(session, reader, Some("llama3"));

    assert!(!output.contains("Available models:"));
    assert!(output.contains("Chat ended. Your history has been saved. Goodbye!"));
    assert_eq!(session.store().config().last_model(), Some("llama3"));
    assert_eq!(provider.requests()[0].model, "llama3");
}

#[test]
fn summary_and_clear_operate_on_history() {
    let (_dir, session, _provider) = controller(MockProvider::new(chunks(&["fine, thanks"])));
    let reader = ScriptedReader::new(&["how are you?", "/summary", "/clear", "no", "/clear", "YES"]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("No previous chat history found."));
    assert!(output.contains("Total messages: 2"));
    assert!(output.contains("User: how are you?"));
    assert!(output.contains("Assistant: fine, thanks"));
    assert!(output.contains("Chat history preserved."));
    assert!(output.contains("Chat history cleared!"));
    assert!(session.store().log().is_empty());
}

#[test]
fn system_command_replaces_prompt_and_blank_keeps_it() {
    let (_dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let reader = ScriptedReader::new(&[
        "/system",
        "",
        "/SYSTEM",
        "  Reply like a pirate.  ",
        "ahoy",
    ]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("System prompt unchanged."));
    assert!(output.contains("System prompt updated!"));
    assert_eq!(session.store().system_prompt().text(), "Reply like a pirate.");
    let requests = provider.requests();
    assert_eq!(requests[0].messages[0].content, "Reply like a pirate.");
}

#[test]
fn multiline_input_is_sent_as_one_turn() {
    let (_dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let reader = ScriptedReader::new(&["/multiline", "first line", "  indented", "END", "/quit"]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("Multi-line input captured (21 characters)"));
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(
        session.store().log().messages()[0].content,
        "first line\n  indented"
    );
}

#[test]
fn interrupted_multiline_sends_nothing() {
    let (_dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let reader = ScriptedReader::from_reads(vec![
        ReadLine::Line("/multiline".to_string()),
        ReadLine::Line("draft".to_string()),
        ReadLine::Interrupted,
        ReadLine::Line("/quit".to_string()),
    ]);

    let (_session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("Multi-line input cancelled"));
    assert!(provider.requests().is_empty());
}

#[test]
fn file_command_sends_file_contents() {
    let (dir, session, provider) = controller(MockProvider::new(chunks(&["summarized"])));
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "  line one\nline two\n").expect("fixture should be written");
    let inline = format!("/file {}", path.display());
    let reader = ScriptedReader::new(&["/file", "/no/such/file.txt", &inline, "/quit"]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("does not exist"));
    assert!(output.contains("File content loaded (17 characters)"));
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(
        session.store().log().messages()[0].content,
        "line one\nline two"
    );
}

#[test]
fn unknown_command_is_not_sent() {
    let (_dir, session, provider) = controller(MockProvider::echo());
    let reader = ScriptedReader::new(&["/frobnicate", "/help", "/quit"]);

    let (_session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("Unknown command '/frobnicate'"));
    assert!(output.contains("/multiline"));
    assert!(provider.requests().is_empty());
}

#[test]
fn ctrl_c_at_prompt_exits_with_history_saved() {
    let (_dir, session, _provider) = controller(MockProvider::echo());
    let reader = ScriptedReader::from_reads(vec![
        ReadLine::Line("keep me".to_string()),
        ReadLine::Interrupted,
        ReadLine::Line("never read".to_string()),
    ]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("Chat interrupted. Your history has been saved. Goodbye!"));
    assert_eq!(session.store().log().len(), 2);
}

#[test]
fn prompt_line_is_cleaned_before_sending() {
    let (_dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let mut out = Vec::new();
    disable_colors();
    let mut app = ChatApp::new(session, ScriptedReader::new(&[]), &mut out, no_cancel());

    assert_eq!(app.handle_line("   \t ").expect("blank line"), Flow::Continue);
    assert_eq!(
        app.handle_line("  what   is\u{7} this?  ").expect("chat line"),
        Flow::Continue
    );
    assert_eq!(app.handle_line("/quit").expect("quit"), Flow::Exit);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].messages.last().map(|message| message.content.as_str()),
        Some("what is this?")
    );
}

#[test]
fn interrupted_reply_is_reported_and_not_saved() {
    let (_dir, session, _provider) = controller(
        MockProvider::new(chunks(&["He", "llo"]))
            .with_ending(chat_provider_mock::MockEnding::InterruptAfter { after: 1 }),
    );
    let mut out = Vec::new();
    disable_colors();
    let cancel = no_cancel();
    let mut app = ChatApp::new(session, ScriptedReader::new(&[]), &mut out, Arc::clone(&cancel));

    let outcome = app.send_turn("hi").expect("turn should persist");

    assert_eq!(
        outcome,
        TurnOutcome::Cancelled {
            partial: "He".to_string(),
        }
    );
    assert_eq!(app.session().store().log().len(), 1);
    drop(app);
    let output = String::from_utf8(out).expect("output should be utf-8");
    assert!(output.contains("Assistant:\nHe\n"));
    assert!(output.contains("Response interrupted; the partial reply was not saved."));
}

#[test]
fn interrupt_during_model_listing_exits_before_the_menu() {
    let (_dir, session, provider) = controller(MockProvider::echo());
    let reader = ScriptedReader::new(&["1", "hello"]);
    let mut out = Vec::new();
    disable_colors();
    let cancel = no_cancel();
    cancel.store(true, std::sync::atomic::Ordering::SeqCst);
    let mut app = ChatApp::new(session, reader, &mut out, Arc::clone(&cancel));

    app.run(None).expect("session should run");

    assert_eq!(app.model(), "");
    assert!(app.session().store().config().last_model().is_none());
    drop(app);
    let output = String::from_utf8(out).expect("output should be utf-8");
    assert!(output.contains("Interrupted while listing models. Goodbye!"));
    assert!(!output.contains("Available models:"));
    assert!(provider.requests().is_empty());
    assert!(!cancel.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn inline_file_path_keeps_its_exact_spelling() {
    let (dir, session, provider) = controller(MockProvider::new(chunks(&["ok"])));
    let path = dir.path().join("my  notes.txt");
    std::fs::write(&path, "spaced name").expect("fixture should be written");
    let inline = format!("/file {}", path.display());
    let reader = ScriptedReader::new(&[&inline, "/quit"]);

    let (session, output) = run_script(session, reader, Some("mock"));

    assert!(output.contains("File content loaded (11 characters)"));
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(session.store().log().messages()[0].content, "spaced name");
}
