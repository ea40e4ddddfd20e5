//! End-to-end dispatch of webhook payloads through handlers with factories.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hookwire_core::{CallbackData, DecodeError, Update, join_segments};
use hookwire_framework::{
    DecodedValue, Dispatcher, ErrorPolicy, FactoryElement, FactorySpec, Handler, PlainDecoder,
    ResolveOptions, filters,
};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, CallbackData)]
#[callback(id = "vote")]
struct Vote {
    poll: u32,
    choice: String,
}

#[derive(Debug, Clone, PartialEq, CallbackData)]
#[callback(id = "page")]
struct Page(u32);

/// Shared state handed to every filter and callback.
#[derive(Default)]
struct Bot {
    seen: Mutex<Vec<String>>,
}

impl Bot {
    fn record(&self, entry: impl Into<String>) {
        self.seen.lock().unwrap().push(entry.into());
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn button_payload(data: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "15550783881", "phone_number_id": "106" },
                    "contacts": [{ "profile": { "name": "Alice" }, "wa_id": "16505551234" }],
                    "messages": [{
                        "context": { "from": "15550783881", "id": "wamid.menu" },
                        "from": "16505551234",
                        "id": "wamid.click",
                        "timestamp": "1690000000",
                        "type": "interactive",
                        "interactive": {
                            "type": "button_reply",
                            "button_reply": { "id": data, "title": "Pick" }
                        }
                    }]
                }
            }]
        }]
    })
}

fn vote_handler() -> Handler<Bot> {
    Handler::callback_button(
        |bot: &Bot, _, value: &DecodedValue| {
            if let Some(vote) = value.single::<Vote>() {
                bot.record(format!("vote {} {}", vote.poll, vote.choice));
            }
        },
        FactorySpec::structured::<Vote>(),
    )
    .unwrap()
    .named("vote")
}

#[test]
fn test_structured_button_reaches_matching_handler_only() {
    let bot = Bot::default();
    let dispatcher = Dispatcher::new().with(vote_handler()).with(
        Handler::callback_button(
            |bot: &Bot, _, _: &DecodedValue| bot.record("page"),
            FactorySpec::structured::<Page>(),
        )
        .unwrap(),
    );

    let data = Vote {
        poll: 12,
        choice: "yes".into(),
    }
    .to_callback_string()
    .unwrap();
    let report = dispatcher.dispatch_webhook(&bot, &button_payload(&data)).unwrap();

    assert_eq!(report.considered, 2);
    assert_eq!(report.executed, 1);
    assert_eq!(bot.seen(), vec!["vote 12 yes"]);
}

#[test]
fn test_user_filters_run_after_derived_filter() {
    let bot = Bot::default();
    let handler = vote_handler().with_filter_fn(|bot: &Bot, update: &Update| {
        bot.record(format!("user filter saw {}", update.callback_data().unwrap_or("")));
        true
    });
    let dispatcher = Dispatcher::new().with(handler);

    dispatcher
        .dispatch_webhook(&bot, &button_payload("page¶1"))
        .unwrap();
    assert!(bot.seen().is_empty());

    dispatcher
        .dispatch_webhook(&bot, &button_payload("vote¶1¶no"))
        .unwrap();
    assert_eq!(bot.seen(), vec!["user filter saw vote¶1¶no", "vote 1 no"]);
}

#[test]
fn test_positional_sequence_round_trip() {
    let bot = Bot::default();
    let handler = Handler::callback_button(
        |bot: &Bot, _, value: &DecodedValue| {
            let page = value.get::<Page>(0).map_or(0, |p| p.0);
            let offset = value.get::<i32>(1).copied().unwrap_or_default();
            let tail = value.get::<String>(2).map_or("", String::as_str);
            bot.record(format!("{} values: page {page} offset {offset} {tail}", value.len()));
        },
        FactorySpec::sequence([
            FactoryElement::structured::<Page>(),
            PlainDecoder::parse::<i32>().into(),
            PlainDecoder::identity().into(),
        ]),
    )
    .unwrap();
    let dispatcher = Dispatcher::new().with(handler);

    let segments = [Page(4).to_callback_string().unwrap(), "-7".into(), "tail".into()];
    let raw = join_segments(&segments);
    let report = dispatcher.dispatch_webhook(&bot, &button_payload(&raw)).unwrap();

    assert_eq!(report.executed, 1);
    assert_eq!(bot.seen(), vec!["3 values: page 4 offset -7 tail"]);
}

#[test]
fn test_dispatch_decodes_once_per_executed_handler() {
    let bot = Bot::default();
    let decodes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&decodes);
    let handler = Handler::callback_button(
        |bot: &Bot, click, value: &DecodedValue| {
            let amount = value.single::<u64>().copied().unwrap_or_default();
            bot.record(format!("{} -> {amount}", click.data));
        },
        FactorySpec::plain(move |_: &Bot, raw: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            raw.parse::<u64>()
                .map_err(|e| DecodeError::custom(e.to_string()))
        }),
    )
    .unwrap()
    .with_filter(filters::callback::data_starts_with("1"));
    let dispatcher = Dispatcher::new().with(handler);

    let click = Update::from_webhook(&button_payload("1250")).unwrap().unwrap();
    let report = dispatcher.dispatch(&bot, &click).unwrap();
    assert_eq!(report.executed, 1);
    assert_eq!(decodes.load(Ordering::SeqCst), 1);
    assert_eq!(bot.seen(), vec!["1250 -> 1250"]);

    let skipped = Update::from_webhook(&button_payload("900")).unwrap().unwrap();
    dispatcher.dispatch(&bot, &skipped).unwrap();
    assert_eq!(decodes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_decode_failure_surfaces_as_handler_error() {
    let bot = Bot::default();
    let dispatcher = Dispatcher::new().with(vote_handler());

    let err = dispatcher
        .dispatch_webhook(&bot, &button_payload("vote¶many¶yes"))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DecodeError>(),
        Some(DecodeError::InvalidField { field: "poll", .. })
    ));
    assert!(bot.seen().is_empty());
}

#[test]
fn test_strict_positional_filter_checks_every_structured_segment() {
    let bot = Bot::default();
    let spec = || {
        FactorySpec::sequence([
            FactoryElement::structured::<Page>(),
            FactoryElement::structured::<Vote>(),
        ])
    };
    let lenient = Handler::callback_button(
        |bot: &Bot, _, _: &DecodedValue| bot.record("lenient"),
        spec(),
    )
    .unwrap();
    let strict = Handler::callback_button_with(
        |bot: &Bot, _, _: &DecodedValue| bot.record("strict"),
        spec(),
        ResolveOptions::strict(),
    )
    .unwrap();
    let dispatcher = Dispatcher::new()
        .with(lenient)
        .with(strict)
        .error_policy(ErrorPolicy::Continue);

    // The lenient filter only checks the first segment, so the click gets
    // through and fails to decode; the strict one never matches.
    let report = dispatcher
        .dispatch_webhook(&bot, &button_payload("page¶1~other¶2"))
        .unwrap();
    assert_eq!((report.executed, report.failed), (0, 1));
    assert!(bot.seen().is_empty());

    let report = dispatcher
        .dispatch_webhook(&bot, &button_payload("page¶1~vote¶2¶yes"))
        .unwrap();
    assert_eq!((report.executed, report.failed), (2, 0));
    assert_eq!(bot.seen(), vec!["lenient", "strict"]);
}

#[test]
fn test_message_filters_through_webhook() {
    let bot = Bot::default();
    let dispatcher = Dispatcher::new().with(
        Handler::message(|bot: &Bot, msg| bot.record(msg.text.clone().unwrap_or_default()))
            .with_filter(filters::message::text_starts_with("/"))
            .with_filter(!filters::message::forwarded()),
    );

    for body in ["/start", "hello"] {
        let payload = json!({
            "entry": [{ "changes": [{ "field": "messages", "value": {
                "metadata": { "display_phone_number": "1", "phone_number_id": "2" },
                "contacts": [{ "wa_id": "3" }],
                "messages": [{
                    "from": "3", "id": "wamid.x", "timestamp": "5",
                    "type": "text", "text": { "body": body }
                }]
            } }] }]
        });
        dispatcher.dispatch_webhook(&bot, &payload).unwrap();
    }

    assert_eq!(bot.seen(), vec!["/start"]);
}
