//! Shared test fixtures for the integration tests.
//!
//! Provides a scripted [`FakeTransport`] that plays both the card catalog and
//! the deck backend, and a [`ManualClock`] whose time only moves when the
//! code under test sleeps.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use decklist_resolver::{
    CatalogPolicy, Clock, DecklistClient, DecklistError, HttpRequest, HttpResponse, HttpTransport,
    Method,
};
use serde_json::{json, Value};

pub const CATALOG_URL: &str = "https://catalog.test";
pub const BACKEND_URL: &str = "http://backend.test";

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap() += by;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

// ---------------------------------------------------------------------------
// FakeTransport
// ---------------------------------------------------------------------------

/// A one-shot answer that pre-empts the normal handler.
#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Status(u16),
    Disconnect,
}

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

pub struct FakeTransport {
    handler: Handler,
    scripted: Mutex<VecDeque<(Method, String, Scripted)>>,
    requests: Mutex<Vec<HttpRequest>>,
    hook: Mutex<Option<Box<dyn Fn(&HttpRequest) + Send + Sync>>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            scripted: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            hook: Mutex::new(None),
        })
    }

    /// A transport answering catalog requests from `cards` and backend
    /// requests from `decks`.
    pub fn with_fixtures(cards: Vec<Value>, decks: Vec<Value>) -> Arc<Self> {
        let by_name: HashMap<String, Value> = cards
            .iter()
            .map(|c| (c["name"].as_str().unwrap().to_lowercase(), c.clone()))
            .collect();
        let by_id: HashMap<String, Value> = cards
            .iter()
            .map(|c| (c["id"].as_str().unwrap().to_lowercase(), c.clone()))
            .collect();

        Self::new(move |req| {
            let path = req.url.as_str();
            if path == format!("{CATALOG_URL}/cards/named") {
                let query = req.query_param("fuzzy").unwrap_or_default().to_lowercase();
                return match by_name.get(&query) {
                    Some(card) => HttpResponse::new(200, card.to_string()),
                    None => not_found(),
                };
            }
            // Identifiers are matched case-insensitively, as the catalog does.
            if path == format!("{CATALOG_URL}/cards/collection") {
                let body = req.body.clone().unwrap_or(Value::Null);
                let mut data = Vec::new();
                let mut missing = Vec::new();
                for ident in body["identifiers"].as_array().cloned().unwrap_or_default() {
                    let id = ident["id"].as_str().unwrap_or_default().to_lowercase();
                    match by_id.get(&id) {
                        Some(card) => data.push(card.clone()),
                        None => missing.push(ident.clone()),
                    }
                }
                return HttpResponse::new(
                    200,
                    json!({ "object": "list", "not_found": missing, "data": data }).to_string(),
                );
            }
            if path == format!("{CATALOG_URL}/cards/search") {
                let query = req.query_param("q").unwrap_or_default().to_lowercase();
                let data: Vec<Value> = cards
                    .iter()
                    .filter(|c| c["name"].as_str().unwrap().to_lowercase().contains(&query))
                    .cloned()
                    .collect();
                if data.is_empty() {
                    return not_found();
                }
                return HttpResponse::new(200, json!({ "data": data }).to_string());
            }
            if path == format!("{BACKEND_URL}/decks") {
                return match req.method {
                    Method::Get => HttpResponse::new(200, Value::Array(decks.clone()).to_string()),
                    _ => {
                        let mut created = req.body.clone().unwrap_or(Value::Null);
                        created["id"] = json!(100);
                        HttpResponse::new(201, created.to_string())
                    }
                };
            }
            if let Some(id) = path.strip_prefix(&format!("{BACKEND_URL}/decks/")) {
                let id: i64 = id.parse().unwrap();
                let Some(deck) = decks.iter().find(|d| d["id"] == json!(id)) else {
                    return not_found();
                };
                return match req.method {
                    Method::Patch => {
                        let mut updated = deck.clone();
                        if let Some(Value::Object(fields)) = &req.body {
                            for (k, v) in fields {
                                updated[k] = v.clone();
                            }
                        }
                        HttpResponse::new(200, updated.to_string())
                    }
                    _ => HttpResponse::new(200, deck.to_string()),
                };
            }
            not_found()
        })
    }

    /// Answer the next `method` request to `path` with `answer`, once.
    pub fn script(&self, method: Method, path: &str, answer: Scripted) {
        self.scripted
            .lock()
            .unwrap()
            .push_back((method, path.to_string(), answer));
    }

    /// Run `hook` on every request before it is answered.
    pub fn on_request<F>(&self, hook: F)
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> decklist_resolver::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(&request);
        }

        let scripted = {
            let mut queue = self.scripted.lock().unwrap();
            let pos = queue
                .iter()
                .position(|(m, p, _)| *m == request.method && request.url.ends_with(p.as_str()));
            pos.and_then(|i| queue.remove(i)).map(|(_, _, answer)| answer)
        };
        match scripted {
            Some(Scripted::Status(status)) => {
                Ok(HttpResponse::new(status, json!({ "status": status }).to_string()))
            }
            Some(Scripted::Disconnect) => Err(DecklistError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            None => Ok((self.handler)(&request)),
        }
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::new(404, json!({ "object": "error", "status": 404 }).to_string())
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn card(id: &str, name: &str) -> Value {
    json!({
        "object": "card",
        "id": id,
        "name": name,
        "mana_cost": "{R}",
        "type_line": "Instant",
        "rarity": "common",
        "set_name": "Test Set",
        "image_uris": {
            "small": format!("https://img.test/small/{id}.jpg"),
            "normal": format!("https://img.test/normal/{id}.jpg")
        }
    })
}

pub fn double_faced_card(id: &str, name: &str) -> Value {
    json!({
        "object": "card",
        "id": id,
        "name": name,
        "type_line": "Creature // Creature",
        "rarity": "common",
        "set_name": "Test Set",
        "card_faces": [
            { "name": "Front", "mana_cost": "{U}", "image_uris": {
                "small": format!("https://img.test/small/{id}-front.jpg"),
                "normal": format!("https://img.test/normal/{id}-front.jpg") } },
            { "name": "Back", "mana_cost": "", "image_uris": {
                "small": format!("https://img.test/small/{id}-back.jpg"),
                "normal": format!("https://img.test/normal/{id}-back.jpg") } }
        ]
    })
}

pub fn standard_cards() -> Vec<Value> {
    vec![
        card("bolt-id", "Lightning Bolt"),
        card("brainstorm-id", "Brainstorm"),
        card("counterspell-id", "Counterspell"),
        double_faced_card("delver-id", "Delver of Secrets"),
    ]
}

/// `count` generated cards with ids `card-000`, `card-001`, ...
pub fn numbered_cards(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| card(&format!("card-{i:03}"), &format!("Card {i}")))
        .collect()
}

pub fn deck_record(id: i64, owner: i64, deck_list: &str) -> Value {
    json!({
        "id": id,
        "deckName": format!("Deck {id}"),
        "format": "Modern",
        "deckDescription": "fixture",
        "deckList": deck_list,
        "player_id": owner,
        "creationDate": "2024-01-01T00:00:00Z"
    })
}

pub fn client(transport: Arc<FakeTransport>, clock: Arc<ManualClock>) -> DecklistClient {
    client_with_policy(transport, clock, CatalogPolicy::default())
}

pub fn client_with_policy(
    transport: Arc<FakeTransport>,
    clock: Arc<ManualClock>,
    policy: CatalogPolicy,
) -> DecklistClient {
    DecklistClient::builder()
        .catalog_url(CATALOG_URL)
        .backend_url(BACKEND_URL)
        .policy(policy)
        .transport(transport)
        .clock(clock)
        .build()
        .unwrap()
}
