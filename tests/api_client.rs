//! HTTP client against a one-shot loopback server (no external network).

use sequia::api::{AnalysisSource, Client};
use sequia::ingest::parse_analysis;
use sequia::{AnalysisController, AnalysisError, Catalog, Outcome, Page};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serve exactly one response; the join handle yields the request line.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (format!("http://{addr}/api"), handle)
}

fn client(base: &str) -> Client {
    Client::new(base, Duration::from_secs(5)).unwrap()
}

#[test]
fn fetches_and_parses_analysis() {
    let body = r#"{"success":true,"indice_sequia":45,"categoria":"D2",
        "datos":{"precipitacion_promedio":0.8,"temperatura_promedio":24.1,"evapotranspiracion_promedio":5.2},
        "series":{"fechas":["2024-03-01","2024-03-02"],"lluvia_mm":[0.0,1.6],"temperatura_c":[23.0,25.2]}}"#;
    let (base, server) = serve_once("200 OK", body);

    let value = client(&base).fetch_analysis("Ciudad Juárez").unwrap();
    let report = parse_analysis(&value).unwrap();
    assert_eq!(report.indice_sequia, 45.0);
    assert_eq!(report.series.unwrap().dates.len(), 2);

    let request_line = server.join().unwrap();
    assert_eq!(
        request_line,
        "GET /api/analizar?municipio=Ciudad%20Ju%C3%A1rez HTTP/1.1"
    );
}

#[test]
fn non_success_status_is_an_http_error() {
    let (base, server) = serve_once("500 Internal Server Error", r#"{"success":false}"#);
    let err = client(&base).fetch_analysis("Aldama").unwrap_err();
    server.join().unwrap();

    assert_eq!(
        err,
        AnalysisError::Http {
            status: 500,
            reason: "Internal Server Error".into()
        }
    );
    assert!(err.is_connectivity());
    assert_eq!(err.to_string(), "Error 500: Internal Server Error");
}

#[test]
fn undecodable_body_is_malformed() {
    let (base, server) = serve_once("200 OK", "<html>gateway</html>");
    let err = client(&base).fetch_analysis("Aldama").unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, AnalysisError::Malformed(_)), "{err:?}");
}

#[test]
fn refused_connection_is_a_transport_error() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = client(&format!("http://127.0.0.1:{port}/api"))
        .fetch_analysis("Aldama")
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Transport(_)), "{err:?}");
}

#[test]
fn lists_municipalities() {
    let (base, server) = serve_once("200 OK", r#"{"municipios":["Aldama","Guachochi","Ojinaga"]}"#);
    let names = client(&base).municipalities().unwrap();
    assert_eq!(names, ["Aldama", "Guachochi", "Ojinaga"]);
    assert_eq!(server.join().unwrap(), "GET /api/municipios HTTP/1.1");
}

#[test]
fn application_error_reaches_the_view() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"success":false,"error":"municipio no encontrado"}"#,
    );
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(client(&base), Catalog::builtin());

    let out = ctl.submit(&mut page, "Atlantis");
    server.join().unwrap();
    assert!(matches!(out, Outcome::Failed(AnalysisError::Application(_))));
    assert_eq!(page.view.error_message(), Some("municipio no encontrado"));
    assert!(!page.view.is_loading());
}
