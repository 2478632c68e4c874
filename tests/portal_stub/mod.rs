use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Local stand-in for the decisions portal. Serves fixed bodies by
/// path-and-query and records every request it receives.
pub struct PortalStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PortalStub {
    pub fn spawn(pages: HashMap<String, Vec<u8>>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start portal stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                seen.lock().expect("lock request log").push(url.clone());

                let response = match pages.get(&url) {
                    Some(body) => {
                        let header = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/html; charset=ISO-8859-1"[..],
                        )
                        .expect("build header");
                        tiny_http::Response::from_data(body.clone()).with_header(header)
                    }
                    None => tiny_http::Response::from_data(b"not found".to_vec())
                        .with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock request log").clone()
    }
}

impl Drop for PortalStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Encodes `text` as ISO-8859-1, the portal's charset.
pub fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).expect("latin-1 char"))
        .collect()
}

pub fn index_page(links: &[(&str, &str)]) -> Vec<u8> {
    let mut html = String::from("<html><body><a href=\"/home.nsf/help?OpenDocument\">Help Desk</a>");
    for (href, label) in links {
        html.push_str(&format!("<a href=\"{href}\">{label}</a>"));
    }
    html.push_str("<a href=\"/jtrg.nsf/por-data?OpenView\">Por data</a></body></html>");
    latin1(&html)
}

pub fn document_page(process: &str, rows: &[(&str, &str)]) -> Vec<u8> {
    let mut html = format!(
        "<html><body><table><tr><td><b>Processo:</b></td><td><b>{process}</b></td></tr>"
    );
    for (label, value) in rows {
        html.push_str(&format!("<tr><td>{label}</td><td>{value}</td></tr>"));
    }
    html.push_str("</table></body></html>");
    latin1(&html)
}
