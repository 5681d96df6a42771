//! Serve a directory of static files.
//!
//! Usage:
//!   cargo run --bin static-server -- --port 8080 --path ./html --verbose

use std::env;
use std::path::PathBuf;

use actix_files::Files;
use actix_web::{App, HttpServer};

struct Options {
    port: u16,
    path: PathBuf,
    verbose: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    match std::fs::metadata(&options.path) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            eprintln!("Error: {} is not a directory", options.path.display());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}: {}", options.path.display(), e);
            std::process::exit(1);
        }
    }

    let address = format!("0.0.0.0:{}", options.port);
    if options.verbose {
        println!(
            "Serving {} on http://{}",
            options.path.display(),
            address
        );
    }

    let root = options.path;
    HttpServer::new(move || {
        App::new().service(
            Files::new("/", root.clone())
                .index_file("index.html")
                .prefer_utf8(true),
        )
    })
    .bind(&address)?
    .run()
    .await
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options {
        port: 8080,
        path: PathBuf::from("./html"),
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse().ok()) {
                    Some(port) => options.port = port,
                    None => {
                        eprintln!("Error: --port requires a valid port number");
                        print_usage();
                        std::process::exit(1);
                    }
                }
            }
            "--path" => {
                i += 1;
                match args.get(i) {
                    Some(path) => options.path = PathBuf::from(path),
                    None => {
                        eprintln!("Error: --path requires a directory");
                        print_usage();
                        std::process::exit(1);
                    }
                }
            }
            "--verbose" | "-v" => options.verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!(
        r#"
Serve a directory of static files

Usage:
  static-server [OPTIONS]

Options:
  -p, --port <PORT>    Port to listen on (default: 8080)
      --path <DIR>     Directory to serve (default: ./html)
  -v, --verbose        Print the listening address
  -h, --help           Show this help message
"#
    );
}
