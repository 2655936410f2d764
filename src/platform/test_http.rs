//! One-shot local HTTP server for exercising `ureq`-backed code.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

/// Serve one request with `status` and `payload`, returning the base URL and
/// a handle yielding the raw request text.
pub(crate) fn spawn_one_shot_http(
    status: u16,
    payload: &str,
) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let payload = payload.as_bytes().to_vec();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read headers, then any declared body.
        loop {
            let read = stream.read(&mut buf).unwrap_or(0);
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
            if let Some(header_end) = find_header_end(&request) {
                let declared = content_length(&request[..header_end]);
                if request.len() >= header_end + 4 + declared {
                    break;
                }
            }
        }
        let reason = if status < 400 { "OK" } else { "Error" };
        let headers = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        );
        // The client may hang up early on error statuses.
        let _ = stream.write_all(headers.as_bytes());
        let _ = stream.write_all(&payload);
        let _ = stream.flush();
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}"), handle)
}

fn find_header_end(request: &[u8]) -> Option<usize> {
    request.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}
