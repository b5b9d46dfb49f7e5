//! `watch`: run the coordinators and print each committed update.

use chrono::Local;
use tokio::sync::mpsc;
use tuyasense_core::{ReadingState, SensorHub, SensorReading, Subscription, TokioScheduler};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::read::{format_value, plain_line};

pub async fn handle(
    hub: &SensorHub,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if hub.readings().is_empty() {
        if !global.quiet {
            eprintln!("No compatible sensors found.");
        }
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let subscriptions: Vec<Subscription> = hub
        .coordinators()
        .map(|coordinator| {
            let tx = tx.clone();
            let device_id = coordinator.device_id().to_owned();
            coordinator.subscribe(move |_| {
                let _ = tx.send(device_id.clone());
            })
        })
        .collect();
    drop(tx);

    hub.refresh_all().await;
    hub.start(&TokioScheduler);
    if !global.quiet {
        eprintln!(
            "Watching {} sensors on {} devices. Press Ctrl-C to stop.",
            hub.readings().len(),
            hub.devices().len()
        );
    }

    let color = output::should_color(global.color);
    pump_updates(&mut rx, tokio::signal::ctrl_c(), args.count, |device_id| {
        print_device(hub.readings(), device_id, global, color);
    })
    .await;

    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    hub.shutdown();
    Ok(())
}

/// Feed updates to `on_update` until `stop` resolves, the channel closes,
/// or `count` updates were handled. Returns the number handled.
async fn pump_updates<S, F>(
    rx: &mut mpsc::UnboundedReceiver<String>,
    stop: S,
    count: Option<usize>,
    mut on_update: F,
) -> usize
where
    S: Future,
    F: FnMut(&str),
{
    tokio::pin!(stop);
    let mut seen = 0usize;
    while count.is_none_or(|n| seen < n) {
        tokio::select! {
            _ = &mut stop => break,
            update = rx.recv() => {
                let Some(device_id) = update else { break };
                on_update(&device_id);
                seen += 1;
            }
        }
    }
    seen
}

fn print_device(readings: &[SensorReading], device_id: &str, global: &GlobalOpts, color: bool) {
    let stamp = Local::now().format("%H:%M:%S");
    for state in readings
        .iter()
        .filter(|r| r.device_id() == device_id)
        .map(SensorReading::state)
    {
        let line = match global.output {
            OutputFormat::Table => format!("{stamp}  {}", update_line(&state, color)),
            OutputFormat::Plain => plain_line(&state),
            format => output::render_document(format, &state),
        };
        output::print_output(&line, global.quiet);
    }
}

fn update_line(state: &ReadingState, color: bool) -> String {
    let unit = state
        .unit
        .as_deref()
        .map_or_else(String::new, |u| format!(" {u}"));
    format!(
        "{}: {}{unit} [{}]",
        state.name,
        format_value(state),
        output::availability(state.available, color)
    )
}
