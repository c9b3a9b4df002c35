//! Minimal blocking HTTP/1.1 server for integration tests.
//!
//! Each path has a script of replies served in order; once the script runs
//! out the last reply repeats. Unknown paths get 404. Hits are counted per
//! path so tests can assert how many attempts were made. A
//! [`Reply::hang_up`] closes the connection without sending a response.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub hang_up: bool,
}

impl Reply {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
            hang_up: false,
        }
    }

    pub fn xml(body: impl Into<Vec<u8>>) -> Self {
        Self::ok("application/xml", body)
    }

    pub fn png(body: Vec<u8>) -> Self {
        Self::ok("image/png", body)
    }

    pub fn json(body: &str) -> Self {
        Self::ok("application/json", body.as_bytes().to_vec())
    }

    pub fn status(code: u16) -> Self {
        Self {
            status: code,
            content_type: "text/plain",
            body: format!("status {}", code).into_bytes(),
            hang_up: false,
        }
    }

    /// Reads the request, then closes the socket with nothing written.
    pub fn hang_up() -> Self {
        Self {
            hang_up: true,
            ..Self::status(0)
        }
    }
}

type Routes = HashMap<String, Vec<Reply>>;

#[derive(Debug, Default)]
struct State {
    hits: HashMap<String, usize>,
    headers: HashMap<String, Vec<(String, String)>>,
}

pub struct ScriptedServer {
    base: String,
    state: Arc<Mutex<State>>,
}

impl ScriptedServer {
    /// Starts a server in a background thread. Runs until the process exits.
    pub fn start(routes: Vec<(&str, Vec<Reply>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes: Arc<Routes> = Arc::new(
            routes
                .into_iter()
                .map(|(path, replies)| (path.to_string(), replies))
                .collect(),
        );
        let state = Arc::new(Mutex::new(State::default()));
        let server_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let state = Arc::clone(&server_state);
                thread::spawn(move || handle(stream, &routes, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Base URL with a trailing slash.
    pub fn base(&self) -> String {
        format!("{}/", self.base)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }

    /// Value of request header `name` on the last request to `path`.
    pub fn last_header(&self, path: &str, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .headers
            .get(path)?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

fn handle(stream: TcpStream, routes: &Routes, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let mut writer = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/").to_string();

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    let mut expect_continue = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let (name, value) = (name.trim().to_string(), value.trim().to_string());
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            if name.eq_ignore_ascii_case("expect") && value.eq_ignore_ascii_case("100-continue") {
                expect_continue = true;
            }
            headers.push((name, value));
        }
    }
    if expect_continue {
        let _ = writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            return;
        }
    }

    let reply = {
        let mut state = state.lock().unwrap();
        let hit = state.hits.entry(path.clone()).or_insert(0);
        let index = *hit;
        *hit += 1;
        state.headers.insert(path.clone(), headers);
        routes
            .get(&path)
            .and_then(|script| script.get(index).or_else(|| script.last()))
            .cloned()
            .unwrap_or_else(|| Reply::status(404))
    };
    if reply.hang_up {
        let _ = writer.shutdown(std::net::Shutdown::Both);
        return;
    }

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reason(reply.status),
        reply.content_type,
        reply.body.len()
    );
    let _ = writer.write_all(head.as_bytes());
    let _ = writer.write_all(&reply.body);
    let _ = writer.flush();
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Status",
    }
}
