use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bus::{Bus, CoreCommand, CoreEvent};
use html::Document;
use lazy_views::{HeadlessHost, LazyViews, LazyViewsConfig, Settings};
use net::{FormBody, HttpResponse, NetError, Transport};
use serde_json::{Value, json};

const PAGE: &str = r#"<!DOCTYPE html><html><body>
<div id="lv-a1" class="lazy-views-placeholder" data-lazy-views-cache-id="a1"><span class="lazy-views-spinner"></span></div>
<div id="lv-a2" class="lazy-views-placeholder" data-lazy-views-cache-id="a2"><span class="lazy-views-spinner"></span></div>
</body></html>"#;

fn page_settings() -> Settings {
    Settings::new(json!({
        "ajaxPageState": {
            "theme": "bartik",
            "theme_token": "tok",
            "css": {"modules/system/system.base.css": 1},
            "js": {"misc/jquery.js": 1},
        },
        "lazy_views": {"current_path": "node/1", "view_arguments": []},
    }))
}

fn new_page(bus: &Bus) -> LazyViews<HeadlessHost> {
    LazyViews::new(
        LazyViewsConfig::default(),
        Document::parse(PAGE),
        page_settings(),
        "http://example.test/node/1?foo=bar",
        bus.cmd_tx.clone(),
        HeadlessHost::with_height(900.0),
    )
    .unwrap()
}

fn next_post(cmd_rx: &Receiver<CoreCommand>) -> (u64, FormBody) {
    match cmd_rx.try_recv().expect("a batch post") {
        CoreCommand::PostBatch {
            request_id, form, ..
        } => (request_id, form),
        other => panic!("unexpected {other:?}"),
    }
}

fn response(request_id: u64, commands: Value) -> CoreEvent {
    CoreEvent::BatchResponse {
        request_id,
        status: 200,
        content_type: Some("application/json".to_string()),
        body: commands.to_string().into_bytes(),
    }
}

#[test]
fn two_placeholders_one_batch_two_replacements() {
    let (bus, cmd_rx) = Bus::new();
    let mut page = new_page(&bus);

    page.attach().unwrap();
    let (request_id, form) = next_post(&cmd_rx);
    assert_eq!(form.get_all("lazy_views_ids[]"), ["a1", "a2"]);
    assert_eq!(form.get("lazy_views_get[foo]"), Some("bar"));
    assert!(form.encode().contains("lazy_views_get%5Bfoo%5D=bar"));
    assert_eq!(page.host().spinners().len(), 2);

    // Scanning again right away claims nothing and posts nothing.
    assert_eq!(page.attach().unwrap(), None);
    assert!(cmd_rx.try_recv().is_err());

    let start = Instant::now();
    let report = page
        .on_event(
            response(
                request_id,
                json!([
                    {"command": "settings", "settings": {"lazy_views": {"loaded": true}}, "merge": true},
                    {"command": "insert", "selector": "#lv-a1", "method": "replaceWith", "data": "<p>first</p>"},
                    {"command": "insert", "selector": "#lv-a2", "method": "replaceWith", "data": "<p>second</p>"},
                ]),
            ),
            start,
        )
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.dispatched.len(), 3);
    assert!(page.document().select("#freeze-height").unwrap().is_empty());
    assert_eq!(page.settings().get("/lazy_views/loaded"), Some(&json!(true)));

    assert_eq!(page.tick(start + Duration::from_millis(2000)).unwrap(), 2);
    assert!(page.is_idle());

    let html = page.document().to_html();
    assert!(html.contains("<p>first</p>"));
    assert!(html.contains("<p>second</p>"));
    assert!(!html.contains("lazy-views-placeholder"));

    let attachments = page.host().attachments();
    assert_eq!(attachments.len(), 2);
    let attached: Vec<&str> = attachments
        .iter()
        .flat_map(|a| a.html.iter().map(String::as_str))
        .collect();
    assert!(attached.contains(&"<p>first</p>"));
    assert!(attached.contains(&"<p>second</p>"));
    // Settings were captured at dispatch, after the merge.
    assert_eq!(attachments[0].settings["lazy_views"]["loaded"], json!(true));
}

#[test]
fn replace_with_hello_leaves_only_the_new_div() {
    let (bus, cmd_rx) = Bus::new();
    let mut page = new_page(&bus);
    page.attach().unwrap();
    let (request_id, _) = next_post(&cmd_rx);
    let body = page.document().body();
    let a1 = page.document().select("#lv-a1").unwrap()[0];
    let slot = page.document().children(body).iter().position(|&n| n == a1).unwrap();

    let start = Instant::now();
    page.on_event(
        response(
            request_id,
            json!([{"command": "insert", "selector": "#lv-a1", "method": "replace", "data": "<div>Hello</div>"}]),
        ),
        start,
    )
    .unwrap();
    page.tick(start + Duration::from_millis(300)).unwrap();
    assert!(page.host().attachments().is_empty());
    page.tick(start + Duration::from_millis(1100)).unwrap();

    let doc = page.document();
    assert!(!doc.is_live(a1));
    assert!(doc.select("#lv-a1").unwrap().is_empty());
    let attachments = page.host().attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].scope.len(), 1);
    let hello = attachments[0].scope[0];
    assert_eq!(doc.outer_html(hello), "<div>Hello</div>");
    assert_eq!(doc.children(body).get(slot), Some(&hello));
}

#[test]
fn settings_without_merge_leave_store_unchanged() {
    let (bus, cmd_rx) = Bus::new();
    let mut page = new_page(&bus);
    page.attach().unwrap();
    let (request_id, _) = next_post(&cmd_rx);

    let before = page.settings().clone();
    let report = page
        .on_event(
            response(
                request_id,
                json!([{"command": "settings", "settings": {"ajaxPageState": {"theme": "seven"}}}]),
            ),
            Instant::now(),
        )
        .unwrap();
    assert_eq!(report.dispatched.len(), 1);
    assert_eq!(page.settings(), &before);
}

#[test]
fn failed_request_leaves_placeholders_spinning() {
    let (bus, cmd_rx) = Bus::new();
    let mut page = new_page(&bus);
    page.attach().unwrap();
    let (request_id, _) = next_post(&cmd_rx);

    let err = page
        .on_event(
            CoreEvent::BatchFailed {
                request_id,
                url: "http://localhost/lazy-views/ajax".to_string(),
                error: "HTTP 500".to_string(),
            },
            Instant::now(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(page.document().select(".lazy-views-placeholder.processed").unwrap().len(), 2);
    assert!(page.is_idle());
    assert_eq!(page.attach().unwrap(), None);
}

struct ScriptedServer {
    posts: Mutex<Vec<FormBody>>,
}

impl Transport for ScriptedServer {
    fn post_form(&self, url: &str, form: &FormBody) -> Result<HttpResponse, NetError> {
        self.posts.lock().unwrap().push(form.clone());
        let commands: Vec<Value> = form
            .get_all("lazy_views_ids[]")
            .into_iter()
            .map(|id| {
                json!({
                    "command": "insert",
                    "selector": format!("#lv-{id}"),
                    "method": "replaceWith",
                    "data": format!("<section>{id}</section>"),
                })
            })
            .collect();
        Ok(HttpResponse {
            url: url.to_string(),
            status: 200,
            content_type: Some("application/json".to_string()),
            body: Value::Array(commands).to_string().into_bytes(),
            duration_ms: 0,
        })
    }
}

#[test]
fn runs_against_the_network_runtime() {
    let (bus, cmd_rx) = Bus::new();
    let server = Arc::new(ScriptedServer {
        posts: Mutex::new(Vec::new()),
    });
    let runtime = runtime_net::start_net_runtime(cmd_rx, bus.evt_tx.clone(), server.clone());

    let mut config = LazyViewsConfig::default();
    config.fade_out_ms = 0;
    config.fade_in_ms = 0;
    let mut page = LazyViews::new(
        config,
        Document::parse(PAGE),
        page_settings(),
        "?foo=bar",
        bus.cmd_tx.clone(),
        HeadlessHost::new(),
    )
    .unwrap();

    page.attach().unwrap();
    let event = bus.evt_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    page.on_event(event, Instant::now()).unwrap();
    assert_eq!(page.tick(Instant::now()).unwrap(), 2);
    assert!(page.is_idle());

    bus.cmd_tx.send(CoreCommand::Shutdown).unwrap();
    runtime.join().unwrap();

    let html = page.document().to_html();
    assert!(html.contains("<section>a1</section>"));
    assert!(html.contains("<section>a2</section>"));
    let posts = server.posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].get("ajax_page_state[css][modules/system/system.base.css]"), Some("1"));
}
