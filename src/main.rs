use std::io::{self, Read};

use chrono::Utc;
use clap::Parser;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use leetsync_host::relay::{Envelope, Relay, Reply};
use leetsync_host::settings;

const DEFAULT_PORT: u16 = 21417;

#[derive(Parser)]
#[command(name = "leetsync-host")]
#[command(about = "Local sync host for the LeetCode to GitHub browser extension")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seed default settings on first install
    #[arg(long)]
    install: bool,

    /// Remove stored settings
    #[arg(long)]
    uninstall: bool,
}

fn setup_logging() {
    let log_path = settings::data_dir().join("host-log");

    let base = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(io::stderr());

    let dispatch = if let Ok(log_file) = fern::log_file(&log_path) {
        base.chain(log_file)
    } else {
        eprintln!(
            "Warning: could not open log file {:?}, logging to stderr only",
            log_path
        );
        base
    };

    if let Err(e) = dispatch.apply() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
}

fn do_install() -> Result<(), leetsync_host::SyncError> {
    std::fs::create_dir_all(settings::data_dir())?;
    let path = settings::settings_path();
    if settings::seed_defaults(&path)? {
        println!("Seeded default settings at {}", path.display());
    } else {
        println!("Settings already exist at {}", path.display());
    }
    println!("Finish setup in the extension's options page.");
    Ok(())
}

fn do_uninstall() -> Result<(), leetsync_host::SyncError> {
    let path = settings::settings_path();
    settings::clear_at(&path)?;
    println!("Removed stored settings.");
    Ok(())
}

fn cors_headers() -> Vec<Header> {
    vec![
        Header::from_bytes("Access-Control-Allow-Origin", "*").unwrap(),
        Header::from_bytes("Access-Control-Allow-Methods", "GET, POST, OPTIONS").unwrap(),
        Header::from_bytes("Access-Control-Allow-Headers", "Content-Type").unwrap(),
    ]
}

fn respond_text(request: Request, status: u16, body: &str) {
    let mut response = Response::from_string(body).with_status_code(StatusCode(status));
    for h in cors_headers() {
        response.add_header(h);
    }
    let _ = request.respond(response);
}

fn respond_json(request: Request, reply: &Reply) {
    let body = serde_json::to_string(reply).unwrap_or_else(|_| {
        r#"{"success":false,"error":"Failed to serialize response"}"#.to_string()
    });
    let mut response = Response::from_string(body).with_status_code(StatusCode(200));
    response.add_header(Header::from_bytes("Content-Type", "application/json").unwrap());
    for h in cors_headers() {
        response.add_header(h);
    }
    let _ = request.respond(response);
}

fn handle_request(mut request: Request, relay: &mut Relay) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // CORS preflight
    if method == Method::Options {
        respond_text(request, 204, "");
        return;
    }

    if method == Method::Get && url == "/health" {
        respond_text(request, 200, "ok");
        return;
    }

    // The extension posts one envelope per request and reads one reply.
    if method == Method::Post && url == "/message" {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            log::error!("Failed to read request body: {}", e);
            respond_json(request, &Reply::err(format!("Failed to read request: {}", e)));
            return;
        }
        let reply = match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => relay.dispatch(&envelope),
            Err(e) => Reply::err(format!("Invalid message envelope: {}", e)),
        };
        respond_json(request, &reply);
        return;
    }

    respond_text(request, 404, "Not found");
}

fn main() {
    let cli = Cli::parse();

    if cli.install {
        if let Err(e) = do_install() {
            eprintln!("Install failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if cli.uninstall {
        if let Err(e) = do_uninstall() {
            eprintln!("Uninstall failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    setup_logging();

    if let Err(e) = std::fs::create_dir_all(settings::data_dir()) {
        log::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    let addr = format!("127.0.0.1:{}", cli.port);
    let server = match Server::http(&addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to start HTTP server on {}: {}", addr, e);
            eprintln!("Failed to start HTTP server on {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    log::info!("LeetSync host listening on {}", addr);
    println!("LeetSync host listening on {}", addr);

    let mut relay = Relay::new();
    for request in server.incoming_requests() {
        handle_request(request, &mut relay);
    }
}
