//! Minimal HTTP stub for exercising the calendar client without the network

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A response body with two sessions on 2025-03-03 and 2025-03-04
pub const SCHEDULE_BODY: &str = r#"{
    "data": [
        [{"Total": 2}],
        [],
        [
            {
                "ThoiGianBD": "2025-03-03T07:00:00",
                "ThoiGianKT": "2025-03-03T09:30:00",
                "TenPhong": "A.301",
                "TenMonHoc": "Lập trình mạng",
                "TenCoSo": "Cơ sở 1"
            },
            {
                "ThoiGianBD": "2025-03-04T13:00:00",
                "ThoiGianKT": "2025-03-04T15:00:00",
                "TenPhong": "B.105",
                "TenMonHoc": "Cơ sở dữ liệu",
                "TenCoSo": "Cơ sở 3"
            }
        ]
    ]
}"#;

/// How the stub answers every request
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given JSON body
    Json(String),
    /// The given status with an empty body
    Status(u16, &'static str),
    /// Accept the connection and say nothing for this long
    Hang(Duration),
}

pub struct StubServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind stub server");
        let url = format!("http://{}/calen", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let (thread_hits, thread_bodies) = (hits.clone(), bodies.clone());
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let (reply, hits, bodies) = (reply.clone(), thread_hits.clone(), thread_bodies.clone());
                thread::spawn(move || {
                    let _ = serve(stream, &reply, &hits, &bodies);
                });
            }
        });

        Self { url, hits, bodies }
    }

    /// Number of requests received so far
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request bodies received so far, oldest first
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

/// Address that refuses connections
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/calen", addr)
}

fn serve(
    mut stream: TcpStream,
    reply: &Reply,
    hits: &AtomicUsize,
    bodies: &Mutex<Vec<String>>,
) -> io::Result<()> {
    let body = read_request(&mut stream)?;
    hits.fetch_add(1, Ordering::SeqCst);
    bodies.lock().unwrap().push(body);

    let (status, reason, payload) = match reply {
        Reply::Json(json) => (200, "OK", json.clone()),
        Reply::Status(code, reason) => (*code, *reason, String::new()),
        Reply::Hang(duration) => {
            thread::sleep(*duration);
            return Ok(());
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        payload.len(),
        payload
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Reads one request and returns its body
fn read_request(stream: &mut TcpStream) -> io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(String::new());
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            let body = &buf[body_start..body_start + content_length];
            return Ok(String::from_utf8_lossy(body).into_owned());
        }
    }
}
