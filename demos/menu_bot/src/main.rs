//! Menu bot demo.
//!
//! Registers handlers for a small food-ordering menu and feeds them one
//! webhook body, first directly through the runtime and then through a tower
//! stack with a timeout and a concurrency limit.
//!
//! ```text
//! cargo run -p menu_bot                              # bundled button click
//! cargo run -p menu_bot -- demos/menu_bot/payloads/list.json
//! cargo run -p menu_bot -- --config deploy/hookwire.toml
//! HOOKWIRE_LOGGING__LEVEL=debug cargo run -p menu_bot
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use hookwire::prelude::*;
use hookwire::runtime::prelude::*;
use parking_lot::Mutex;
use tower::{ServiceBuilder, ServiceExt};

const SAMPLE_PAYLOAD: &str = include_str!("../payloads/button.json");

#[derive(Debug, Parser)]
#[command(about = "Dispatch a webhook body through the menu bot handlers")]
struct Args {
    /// Webhook body to dispatch. Defaults to the bundled button click.
    payload: Option<PathBuf>,

    /// Configuration file. Searched for when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// "Order `quantity` of `item`" button.
#[derive(Debug, Clone, PartialEq, CallbackData)]
#[callback(id = "order", crate = "hookwire::core")]
struct Order {
    item: String,
    quantity: u32,
}

/// Menu page, followed by a plain category segment.
#[derive(Debug, Clone, PartialEq, CallbackData)]
#[callback(id = "page", crate = "hookwire::core")]
struct Page(u16);

#[derive(Debug, Default)]
struct MenuBot {
    orders: Mutex<Vec<Order>>,
}

fn on_order(bot: &MenuBot, click: &CallbackButton, value: &DecodedValue) {
    let Some(order) = value.single::<Order>() else {
        return;
    };
    info!(
        user = %click.meta.from_user.wa_id,
        item = %order.item,
        quantity = order.quantity,
        "Order placed"
    );
    bot.orders.lock().push(order.clone());
}

fn on_page(_: &MenuBot, _: &CallbackSelection, value: &DecodedValue) {
    let page = value.get::<Page>(0).map_or(0, |p| p.0);
    let category = value.get::<String>(1).map_or("", String::as_str);
    info!(page, category, "Showing menu page");
}

fn register_handlers(runtime: &WebhookRuntime<MenuBot>) -> anyhow::Result<()> {
    let order = runtime.callback_button_handler(on_order, FactorySpec::structured::<Order>())?;
    let page = runtime.callback_selection_handler(
        on_page,
        FactorySpec::sequence([
            FactoryElement::structured::<Page>(),
            PlainDecoder::identity().into(),
        ]),
    )?;

    runtime.add_handlers([
        Handler::message(|_: &MenuBot, msg: &Message| {
            info!(user = %msg.meta.from_user.wa_id, "Showing menu");
        })
        .with_filter(filters::message::text_equals("/menu"))
        .with_filter(!filters::message::forwarded())
        .named("show_menu"),
        order.named("order"),
        page.named("page"),
        Handler::message_status(|_: &MenuBot, status: &MessageStatus| {
            warn!(message = %status.meta.id, error = ?status.error, "Delivery failed");
        })
        .with_filter(filters::status::failed())
        .named("delivery_failed"),
        Handler::raw_update(|_: &MenuBot, raw: &RawUpdate| {
            debug!(field = raw.field().unwrap_or("?"), payload = %raw.payload(), "Webhook received");
        })
        .named("audit"),
    ]);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let runtime = WebhookRuntime::from_loader(MenuBot::default(), loader)?;
    let _guard = runtime.init_logging();
    register_handlers(&runtime)?;
    info!(handlers = runtime.handler_count(), "Menu bot ready");

    let body = match &args.payload {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading payload from {}", path.display()))?,
        None => SAMPLE_PAYLOAD.as_bytes().to_vec(),
    };

    let report = runtime.handle_bytes(&body)?;
    info!(?report, "Direct dispatch finished");

    let payload: serde_json::Value = serde_json::from_slice(&body)?;
    let service = ServiceBuilder::new()
        .concurrency_limit(4)
        .timeout(Duration::from_secs(5))
        .service(runtime.service());
    let report = service
        .oneshot(payload)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    info!(?report, "Service dispatch finished");

    let orders = runtime.context().orders.lock();
    info!(count = orders.len(), ?orders, "Orders so far");
    Ok(())
}
