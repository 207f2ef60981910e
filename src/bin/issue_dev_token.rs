//! CLI tool to mint identity tokens for local development and scripted tests.
//!
//! Usage:
//!   cargo run --bin issue-dev-token -- --user 1 --role administrador --ttl 24h

use std::env;

use icemas_fsm_lib::auth::TokenVerifier;
use icemas_fsm_lib::config::Config;

const ROLES: [&str; 2] = ["administrador", "tecnico"];

fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    let mut user: Option<String> = None;
    let mut role = "administrador".to_string();
    let mut ttl = "24h".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" | "-u" => {
                i += 1;
                if i < args.len() {
                    user = Some(args[i].clone());
                }
            }
            "--role" | "-r" => {
                i += 1;
                if i < args.len() {
                    role = args[i].clone();
                }
            }
            "--ttl" | "-t" => {
                i += 1;
                if i < args.len() {
                    ttl = args[i].clone();
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let user_id = match user.as_deref().map(str::parse::<i32>) {
        Some(Ok(id)) => id,
        Some(Err(_)) => {
            eprintln!("Error: --user must be a numeric user id");
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: --user is required");
            print_usage();
            std::process::exit(1);
        }
    };

    if !ROLES.contains(&role.as_str()) {
        eprintln!("Error: Invalid role '{}'. Must be: {}", role, ROLES.join(", "));
        std::process::exit(1);
    }

    let ttl_secs = match parse_ttl(&ttl) {
        Some(secs) => secs,
        None => {
            eprintln!("Error: Invalid --ttl '{}'. Use e.g. 30m, 24h or 7d", ttl);
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    if config.environment.is_production() {
        eprintln!("Warning: issuing a token signed with the production secret");
    }

    match TokenVerifier::new(&config.auth).issue(user_id, &role, ttl_secs) {
        Ok(token) => println!("{}", token),
        Err(e) => {
            eprintln!("Error creating token: {}", e);
            std::process::exit(1);
        }
    }
}

/// `30m`, `24h`, `7d` or bare seconds.
fn parse_ttl(s: &str) -> Option<u64> {
    let s = s.trim();
    let (number, unit) = match s.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&s[..idx], c),
        _ => (s, 's'),
    };
    let value: u64 = number.parse().ok()?;
    let factor = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return None,
    };
    value.checked_mul(factor).filter(|secs| *secs > 0)
}

fn print_usage() {
    eprintln!(
        r#"
Usage: issue-dev-token --user <ID> [--role <ROLE>] [--ttl <DURATION>]

Options:
  -u, --user <ID>        Acting user id placed in the `sub` claim (required)
  -r, --role <ROLE>      administrador or tecnico (default: administrador)
  -t, --ttl <DURATION>   Token lifetime: 30m, 24h, 7d (default: 24h)
  -h, --help             Show this help message

The token is signed with FSM_JWT_SECRET from the environment or .env file.

Example:
  curl -H "Authorization: Bearer $(issue-dev-token --user 1)" \
       http://127.0.0.1:8080/api/v1/service-orders
"#
    );
}
