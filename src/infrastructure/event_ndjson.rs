use crate::usecase::event::HistoryEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn history_event_to_json(ev: &HistoryEvent) -> serde_json::Value {
    serde_json::to_value(ev)
        .unwrap_or_else(|e| serde_json::json!({"type": "encode_error", "error": e.to_string()}))
}

pub fn spawn_ndjson_printer(mut rx: mpsc::UnboundedReceiver<HistoryEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let line = history_event_to_json(&ev);

            // NDJSON to stdout.
            println!("{line}");
        }
    })
}
