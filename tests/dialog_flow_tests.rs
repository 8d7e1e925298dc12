mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{joined, say, texts, Harness, OWNER, TENANT};
use markily_core::{
    dialog::{DialogEngine, DialogState, Outbound},
    domain::ContactId,
    ports::{Callback, DateShortcut, FlowAction, InboundEvent, MenuAction, RecipientId},
};

fn press(engine: &DialogEngine, callback: Callback) -> Vec<String> {
    texts(engine.step(&InboundEvent::callback(TENANT, OWNER, callback)))
}

fn menu(engine: &DialogEngine, action: MenuAction) -> Vec<String> {
    press(engine, Callback::Menu { action })
}

const SARA: ContactId = ContactId(1);

#[test]
fn lend_then_borrow_leaves_the_difference() {
    let harness = Harness::new();
    let engine = harness.engine();

    assert_eq!(say(&engine, "/addcontact Sara"), vec!["Contact Sara added."]);

    let picker = menu(&engine, MenuAction::Lend);
    assert_eq!(picker, vec!["Who did you lend to?"]);

    let prompt = press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Lend,
            contact: SARA,
        },
    );
    assert!(joined(&prompt).contains("How much did you lend to Sara?"));
    assert_eq!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingAmount {
            action: FlowAction::Lend,
            contact: SARA,
        }
    );

    let ask_note = say(&engine, "1,000");
    assert_eq!(ask_note, vec!["1,000 DZD with Sara. Add a note?"]);
    assert!(matches!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingNote { amount, .. } if amount == 1000.0
    ));

    let recorded = press(&engine, Callback::SaveWithoutNote);
    assert_eq!(
        recorded,
        vec!["Recorded: you lent 1,000 DZD to Sara.\nSara owes you 1,000 DZD"]
    );
    assert!(engine.state(TENANT, OWNER).is_idle());

    let quick = say(&engine, "/borrow sara 400 for groceries");
    assert_eq!(
        quick,
        vec!["Recorded: you borrowed 400 DZD from Sara (for groceries).\nSara owes you 600 DZD"]
    );

    let balance = harness.stores.ledger.balance(TENANT, OWNER, SARA).unwrap();
    assert!((balance.amount - 600.0).abs() < 1e-9);
    assert_eq!(say(&engine, "/balance Sara"), vec!["Sara owes you 600 DZD"]);
}

#[test]
fn cancelling_while_awaiting_amount_records_nothing() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Borrow,
            contact: SARA,
        },
    );

    let replies = say(&engine, "cancel");
    assert_eq!(replies[0], "Cancelled.");
    assert!(engine.state(TENANT, OWNER).is_idle());
    assert!(harness
        .stores
        .ledger
        .history(TENANT, OWNER, SARA)
        .unwrap()
        .is_empty());
}

#[test]
fn invalid_amounts_reprompt_in_place() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Lend,
            contact: SARA,
        },
    );

    for bad in ["lots", "-5", "0"] {
        let replies = say(&engine, bad);
        assert_eq!(replies, vec!["Please send a positive number, for example 1500."]);
        assert!(matches!(
            engine.state(TENANT, OWNER),
            DialogState::AwaitingAmount { .. }
        ));
    }
}

#[test]
fn typed_note_is_kept_with_the_transaction() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Lend,
            contact: SARA,
        },
    );
    say(&engine, "250");
    assert_eq!(press(&engine, Callback::AddNote), vec!["Send the note."]);
    say(&engine, "taxi");

    let history = harness.stores.ledger.history(TENANT, OWNER, SARA).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].note.as_deref(), Some("taxi"));
}

#[test]
fn settling_prompts_in_the_balance_currency() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    say(&engine, "/lend Sara 100 usd");

    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Settle,
            contact: SARA,
        },
    );
    assert_eq!(say(&engine, "40"), vec!["40 USD with Sara. Add a note?"]);

    let recorded = joined(&press(&engine, Callback::SaveWithoutNote));
    assert!(recorded.contains("Recorded a payment of 40 USD with Sara"));
    assert!(recorded.ends_with("Sara owes you 60 USD"));
}

#[test]
fn quick_clear_without_currency_follows_the_balance() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    say(&engine, "/lend Sara 100 usd");

    let recorded = joined(&say(&engine, "/clear Sara 60"));
    assert!(recorded.contains("Recorded a payment of 60 USD with Sara"));
    assert!(recorded.ends_with("Sara owes you 40 USD"));

    let history = harness.stores.ledger.history(TENANT, OWNER, SARA).unwrap();
    assert!(history.iter().all(|txn| txn.currency.as_str() == "USD"));
    assert_eq!(say(&engine, "/balance Sara"), vec!["Sara owes you 40 USD"]);
}

#[test]
fn placeholder_text_in_names_is_not_expanded() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact {amount}");

    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Lend,
            contact: SARA,
        },
    );
    assert_eq!(say(&engine, "5"), vec!["5 DZD with {amount}. Add a note?"]);
}

#[test]
fn commands_abandon_the_current_flow() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    press(
        &engine,
        Callback::PickContact {
            action: FlowAction::Lend,
            contact: SARA,
        },
    );

    let replies = say(&engine, "/balance Sara");
    assert_eq!(replies, vec!["You and Sara are settled"]);
    assert!(engine.state(TENANT, OWNER).is_idle());
}

#[test]
fn unknown_contact_in_quick_entry_offers_to_add_it() {
    let harness = Harness::new();
    let engine = harness.engine();

    let outbound = engine.step(&InboundEvent::from_line(TENANT, OWNER, "/lend Karim 300"));
    let Outbound::Message { message, .. } = &outbound[0] else {
        panic!("expected a message");
    };
    assert_eq!(message.text, "No contact matches \"Karim\". Add it?");
    let add = message
        .layout
        .as_ref()
        .and_then(|layout| layout.buttons().next().cloned())
        .unwrap();
    assert_eq!(add.label, "Add Karim");

    assert_eq!(press(&engine, add.callback), vec!["Contact Karim added."]);
    assert_eq!(harness.stores.contacts.list(TENANT, OWNER).unwrap().len(), 1);
}

#[test]
fn unknown_contact_ends_the_reminder_flow() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    menu(&engine, MenuAction::SetReminder);
    assert_eq!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingReminderContact
    );

    assert_eq!(say(&engine, "xyz"), vec!["No contact matches \"xyz\"."]);
    assert!(engine.state(TENANT, OWNER).is_idle());
}

#[test]
fn reminder_flow_schedules_in_the_future() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    menu(&engine, MenuAction::SetReminder);

    say(&engine, "sara");
    assert_eq!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingReminderDate { contact: SARA }
    );

    say(&engine, "tomorrow");
    let tomorrow = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
    assert_eq!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingReminderTime {
            contact: SARA,
            date: tomorrow,
        }
    );

    press(&engine, Callback::TimeSlot { hour: 9 });
    let fire_at = Utc.with_ymd_and_hms(2025, 6, 5, 9, 0, 0).unwrap();
    assert_eq!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingReminderNote {
            contact: SARA,
            fire_at,
        }
    );

    assert_eq!(
        say(&engine, "ask about the rent"),
        vec!["Reminder saved: Sara on 2025-06-05 09:00."]
    );
    let upcoming = harness.stores.reminders.active_future(TENANT, OWNER).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].fire_at, fire_at);
    assert_eq!(upcoming[0].note, "ask about the rent");
}

#[test]
fn past_times_today_are_refused() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    press(&engine, Callback::ReminderContact { contact: SARA });
    press(
        &engine,
        Callback::Date {
            shortcut: DateShortcut::Today,
        },
    );

    let replies = say(&engine, "9am");
    assert_eq!(replies[0], "That time has already passed. Pick a later one.");
    assert!(matches!(
        engine.state(TENANT, OWNER),
        DialogState::AwaitingReminderTime { .. }
    ));

    assert_eq!(
        say(&engine, "next tuesday")[0],
        "I could not read that time. Try \"14:30\" or \"2pm\"."
    );
}

#[test]
fn deleting_a_contact_asks_first_and_cascades() {
    let harness = Harness::new();
    let engine = harness.engine();
    say(&engine, "/addcontact Sara");
    say(&engine, "/lend Sara 100");

    let confirm = press(&engine, Callback::DeleteContact { contact: SARA });
    assert_eq!(
        confirm,
        vec!["Delete Sara with all transactions and reminders?"]
    );
    assert_eq!(harness.stores.contacts.list(TENANT, OWNER).unwrap().len(), 1);

    assert_eq!(
        press(&engine, Callback::ConfirmDelete { contact: SARA }),
        vec!["Sara deleted."]
    );
    assert!(harness.stores.contacts.list(TENANT, OWNER).unwrap().is_empty());
    assert!(harness
        .stores
        .ledger
        .history(TENANT, OWNER, SARA)
        .unwrap()
        .is_empty());
}

#[test]
fn stale_flow_buttons_fall_back_to_the_menu() {
    let harness = Harness::new();
    let engine = harness.engine();
    let replies = press(&engine, Callback::SaveWithoutNote);
    assert_eq!(replies, vec!["That button belongs to a finished conversation."]);
}

#[tokio::test]
async fn handle_delivers_replies_to_the_conversation() {
    let harness = Harness::new();
    let engine = harness.engine();

    let delivered = engine
        .handle(InboundEvent::from_line(TENANT, OWNER, "/start"))
        .await;
    assert_eq!(delivered, 1);

    let sent = harness.port.sent();
    assert_eq!(sent[0].0, RecipientId::Conversation(TENANT));
    assert!(sent[0].1.text.starts_with("Welcome to Markily!"));
    assert_eq!(sent[0].1.layout.as_ref().map(|l| l.rows.len()), Some(5));
}

#[tokio::test]
async fn undeliverable_replies_are_dropped() {
    let harness = Harness::new();
    let engine = harness.engine();
    harness.port.set_failing(true);

    let delivered = engine
        .handle(InboundEvent::from_line(TENANT, OWNER, "/addcontact Sara"))
        .await;
    assert_eq!(delivered, 0);
    assert_eq!(harness.stores.contacts.list(TENANT, OWNER).unwrap().len(), 1);
}
