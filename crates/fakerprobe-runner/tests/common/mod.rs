//! In-process fake of the Faker service, served with tiny_http
//!
//! Implements the contract the suites check: envelope, clamped quantity,
//! seeded determinism, locale echo, and the resource-specific parameters.
//! `Faults` switches individual guarantees off.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use fakerprobe_core::{Config, Resource};
use serde_json::{Value, json};
use tiny_http::{Header, Response, Server};

/// Contract guarantees the fake can break.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// Return the requested quantity even above 1000
    pub ignore_clamp: bool,
    /// Generate fresh data on every request, seeded or not
    pub ignore_seed: bool,
    /// Always report `en_US`
    pub fixed_locale: bool,
    /// Omit `vat` from companies
    pub drop_vat: bool,
    /// Respond 401 unless this header is present with this value
    pub required_header: Option<(&'static str, &'static str)>,
}

pub struct FakeFaker {
    pub base_url: String,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl FakeFaker {
    pub fn start(faults: Faults) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let worker = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            let unseeded = AtomicU64::new(1);
            for request in worker.incoming_requests() {
                let (status, body) = serve(&request, faults, &unseeded);
                let response = Response::from_string(body.to_string())
                    .with_status_code(status)
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });
        Self {
            base_url: format!("http://{addr}/api/v2"),
            server,
            handle: Some(handle),
        }
    }

    /// Config pointing at this server and the workspace fixtures.
    pub fn config(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            data_dir: fixtures_dir().join("data"),
            schema_dir: fixtures_dir().join("schemas"),
            ..Config::default()
        }
    }

    pub fn config_for(&self, resources: &[Resource]) -> Config {
        Config {
            resources: resources.to_vec(),
            ..self.config()
        }
    }
}

impl Drop for FakeFaker {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
}

// ── Request handling ──

fn query(url: &str) -> Vec<(String, String)> {
    url.split_once('?')
        .map(|(_, q)| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn int_param(params: &[(String, String)], key: &str) -> Option<i64> {
    param(params, key).and_then(|v| v.parse().ok())
}

fn error(code: u16, message: &str) -> (u16, Value) {
    (code, json!({"status": "error", "code": code, "message": message}))
}

fn serve(request: &tiny_http::Request, faults: Faults, unseeded: &AtomicU64) -> (u16, Value) {
    if let Some((name, value)) = faults.required_header {
        let present = request
            .headers()
            .iter()
            .any(|h| h.field.equiv(name) && h.value.as_str() == value);
        if !present {
            return error(401, "missing credentials");
        }
    }

    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or_default();
    let params = query(&url);

    let resource = match path.rsplit('/').next() {
        Some("companies") => Resource::Company,
        Some("products") => Resource::Product,
        Some("users") => Resource::User,
        Some("images") => Resource::Image,
        _ => return error(404, "not found"),
    };

    let requested = int_param(&params, "_quantity").unwrap_or(10).max(0);
    let quantity = if faults.ignore_clamp {
        requested
    } else {
        requested.min(1000)
    };
    let seed = int_param(&params, "_seed");
    let locale = if faults.fixed_locale {
        "en_US"
    } else {
        param(&params, "_locale").unwrap_or("en_US")
    };

    let mut rng = match seed {
        Some(s) if !faults.ignore_seed => Rng::new(s as u64),
        _ => Rng::new(unseeded.fetch_add(7919, Ordering::Relaxed)),
    };

    let mut data = Vec::with_capacity(quantity as usize);
    for i in 0..quantity {
        let record = match resource {
            Resource::Company => company(&mut rng, i, faults),
            Resource::Product => product(&mut rng, i, &params),
            Resource::User => match user(&mut rng, i, &params) {
                Some(u) => u,
                None => return error(422, "invalid gender"),
            },
            Resource::Image => match image(&mut rng, &params) {
                Some(img) => img,
                None => return error(400, "invalid dimensions"),
            },
        };
        data.push(record);
    }

    (
        200,
        json!({
            "status": "OK",
            "code": 200,
            "locale": locale,
            "seed": seed.map(|s| s.to_string()),
            "total": data.len(),
            "data": data,
        }),
    )
}

// ── Data generation ──

/// xorshift64*, enough for reproducible fake data.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next() % items.len() as u64) as usize]
    }

    fn uuid(&mut self) -> String {
        let a = self.next();
        let b = self.next();
        format!(
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            a >> 32,
            (a >> 16) & 0xffff,
            a & 0xffff,
            b >> 48,
            b & 0xffff_ffff_ffff
        )
    }
}

const FIRST: &[&str] = &["Ada", "Grace", "Linus", "Margaret", "Ken", "Barbara"];
const LAST: &[&str] = &["Lovelace", "Hopper", "Torvalds", "Hamilton", "Thompson", "Liskov"];
const WORDS: &[&str] = &["alpha", "bravo", "delta", "lorem", "ipsum", "nova"];
const COUNTRIES: &[(&str, &str)] = &[("Italy", "IT"), ("France", "FR"), ("Germany", "DE")];

fn company(rng: &mut Rng, i: i64, faults: Faults) -> Value {
    let name = format!("{} {}", rng.pick(WORDS), rng.pick(LAST));
    let slug = name.replace(' ', "").to_lowercase();
    let (country, code) = COUNTRIES[(rng.next() % COUNTRIES.len() as u64) as usize];
    let mut record = json!({
        "id": i + 1,
        "name": name,
        "email": format!("info@{slug}.com"),
        "vat": format!("{code}{:011}", rng.next() % 100_000_000_000),
        "phone": format!("+39{:010}", rng.next() % 10_000_000_000),
        "country": country,
        "addresses": [{
            "id": 1,
            "street": format!("{} Street {}", rng.pick(LAST), rng.next() % 200),
            "city": rng.pick(WORDS),
            "zipcode": format!("{:05}", rng.next() % 100_000),
            "country": country,
            "country_code": code,
            "latitude": (rng.next() % 180) as f64 - 90.0,
            "longitude": (rng.next() % 360) as f64 - 180.0,
        }],
        "website": format!("https://{slug}.com"),
        "image": "https://picsum.photos/640/480",
        "contact": {
            "id": 1,
            "firstname": rng.pick(FIRST),
            "lastname": rng.pick(LAST),
            "email": format!("contact@{slug}.com"),
            "phone": format!("+39{:010}", rng.next() % 10_000_000_000),
            "gender": rng.pick(&["male", "female"]),
        },
    });
    if faults.drop_vat {
        if let Some(obj) = record.as_object_mut() {
            obj.remove("vat");
        }
    }
    record
}

fn product(rng: &mut Rng, i: i64, params: &[(String, String)]) -> Value {
    let taxes = int_param(params, "_taxes").unwrap_or(22);
    let min = int_param(params, "_price_min").unwrap_or(0);
    let max = int_param(params, "_price_max").unwrap_or(10_000).max(min + 1);
    let net = min + (rng.next() % (max - min) as u64) as i64;
    let categories: Vec<Value> = (0..3)
        .map(|_| match param(params, "_categories_type").unwrap_or("integer") {
            "string" => Value::from(rng.pick(WORDS)),
            "uuid" => Value::from(rng.uuid()),
            _ => Value::from(rng.next() % 100),
        })
        .collect();
    json!({
        "id": i + 1,
        "name": format!("{} {}", rng.pick(WORDS), rng.pick(WORDS)),
        "description": rng.pick(WORDS),
        "net_price": net,
        "taxes": taxes,
        "price": format!("{:.2}", net as f64 * (1.0 + taxes as f64 / 100.0)),
        "categories": categories,
        "tags": [rng.pick(WORDS)],
    })
}

fn user(rng: &mut Rng, i: i64, params: &[(String, String)]) -> Option<Value> {
    let gender = match param(params, "_gender") {
        None => rng.pick(&["male", "female"]),
        Some(g @ ("male" | "female")) => g,
        Some(_) => return None,
    };
    let first = rng.pick(FIRST);
    let last = rng.pick(LAST);
    Some(json!({
        "id": i + 1,
        "uuid": rng.uuid(),
        "firstname": first,
        "lastname": last,
        "username": format!("{}{}", first.to_lowercase(), rng.next() % 1000),
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "gender": gender,
        "ip": format!("10.0.{}.{}", rng.next() % 256, rng.next() % 256),
        "website": "https://example.com",
        "image": "https://picsum.photos/640/480",
    }))
}

fn image(rng: &mut Rng, params: &[(String, String)]) -> Option<Value> {
    let width = int_param(params, "_width").unwrap_or(640);
    let height = int_param(params, "_height").unwrap_or(480);
    if width < 0 || height < 0 {
        return None;
    }
    Some(json!({
        "title": format!("{} {}", rng.pick(WORDS), rng.pick(WORDS)),
        "description": rng.pick(WORDS),
        "url": format!("https://picsum.photos/{width}/{height}"),
    }))
}
