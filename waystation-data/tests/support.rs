//! Canned HTTP servers for exercising the geocoder without a network.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Recorded request line, e.g. `GET /reverse?lat=.. HTTP/1.1`.
pub type RequestLog = Arc<Mutex<Option<String>>>;

fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    (listener, addr)
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut chunk).expect("read request");
        if read == 0 {
            break;
        }
        head.extend(chunk.iter().take(read));
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Serve a single response and record the request line.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, RequestLog) {
    let (listener, addr) = bind();
    let log: RequestLog = Arc::new(Mutex::new(None));
    let recorded = Arc::clone(&log);
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let head = read_request_head(&mut stream);
        let request_line = head.lines().next().unwrap_or_default().to_owned();
        *recorded.lock().expect("request log lock") = Some(request_line);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .expect("write response");
        stream.flush().expect("flush response");
    });
    (format!("http://{addr}"), log)
}

/// Accept a connection and hold it open without answering.
pub fn serve_silently(hold: Duration) -> String {
    let (listener, addr) = bind();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_request_head(&mut stream);
            thread::sleep(hold);
        }
    });
    format!("http://{addr}")
}

/// Base URL of a loopback port with nothing listening.
pub fn closed_port() -> String {
    let (listener, addr) = bind();
    drop(listener);
    format!("http://{addr}")
}
