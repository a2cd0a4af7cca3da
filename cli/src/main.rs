//! `web`: common web requests from the command line.
//!
//! A thin wrapper around `web_core` that handles:
//! - argument parsing
//! - logger initialization
//! - printing the response or the error, and the exit code

use std::process;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use web_core::{Body, Client, Data, Query, Req, WebError, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Parser)]
#[command(name = "web", version, about = "common web requests")]
struct Cli {
    /// Seconds to wait for the whole request
    #[arg(long, env = "WEB_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Log each request and response status
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit an HTTP GET request
    Get(RequestArgs),
    /// Submit an HTTP POST request
    Post(RequestArgs),
    /// Submit an HTTP PUT request
    Put(RequestArgs),
    /// Submit an HTTP PATCH request
    Patch(RequestArgs),
    /// Submit an HTTP DELETE request
    #[command(alias = "del")]
    Delete(RequestArgs),
}

impl Command {
    fn split(self) -> (&'static str, RequestArgs) {
        match self {
            Command::Get(args) => ("GET", args),
            Command::Post(args) => ("POST", args),
            Command::Put(args) => ("PUT", args),
            Command::Patch(args) => ("PATCH", args),
            Command::Delete(args) => ("DELETE", args),
        }
    }
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// Base URL, without a query string
    url: String,

    /// Query parameter, may be repeated
    #[arg(short, long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    /// Request header, may be repeated
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    header: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Send the body as a form: `-d` takes `KEY=VALUE&KEY=VALUE`
    #[arg(long, requires = "data")]
    form: bool,
}

fn split_pair(raw: &str, sep: char) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once(sep)
        .ok_or_else(|| anyhow!("expected {sep:?} in {raw:?}"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_pairs(raw: &[String], sep: char) -> Result<Query> {
    let mut query = Query::new();
    for item in raw {
        let (key, value) = split_pair(item, sep)?;
        query.entry(key).or_default().push(value);
    }
    Ok(query)
}

/// Turn parsed arguments into a request descriptor, without a destination.
fn build_req<'a>(method: &str, args: RequestArgs) -> Result<Req<'a>> {
    let mut req = Req::new(method, &args.url);
    req.query = parse_pairs(&args.query, '=')?;
    for header in &args.header {
        let (name, value) = split_pair(header, ':')?;
        req.headers.insert(name, value);
    }
    if let Some(data) = args.data {
        req.body = if args.form {
            let pairs: Vec<String> = data.split('&').map(str::to_string).collect();
            Body::Form(parse_pairs(&pairs, '=')?)
        } else {
            Body::Text(data)
        };
    }
    Ok(req)
}

fn init_logger(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_module("web_core", LevelFilter::Debug);
    }
    // A second initialization only happens in tests.
    let _ = builder.try_init();
}

fn run(cli: Cli) -> Result<String> {
    let client = Client::new().with_timeout(Duration::from_secs(cli.timeout));
    let (method, args) = cli.command.split();
    let mut req = build_req(method, args)?;

    let mut text = String::new();
    req.data = Data::Text(&mut text);
    client.submit(&mut req)?;
    drop(req);
    Ok(text)
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("web: {e}");
            let response = e.downcast_ref::<WebError>().and_then(WebError::response);
            if let Some(response) = response {
                let body = response.text();
                if !body.is_empty() {
                    eprintln!("{body}");
                }
            }
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn split_pair_trims_both_sides() {
        let (k, v) = split_pair("Accept : application/json", ':').unwrap();
        assert_eq!(k, "Accept");
        assert_eq!(v, "application/json");
    }

    #[test]
    fn split_pair_requires_separator() {
        assert!(split_pair("no-separator", '=').is_err());
    }

    #[test]
    fn get_with_query_and_headers() {
        let cli = parse(&[
            "web", "get", "http://localhost:3000/get", "-q", "a=1", "-q", "a=2", "-H", "X-Trace: abc",
        ]);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        let (method, args) = cli.command.split();
        let req = build_req(method, args).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.query["a"], vec!["1", "2"]);
        assert_eq!(req.headers["X-Trace"], "abc");
        assert!(matches!(req.body, Body::Empty));
    }

    #[test]
    fn post_form_body() {
        let cli = parse(&[
            "web", "--timeout", "5", "post", "http://localhost:3000/post", "--form", "-d", "user=rob&note=hi",
        ]);
        assert_eq!(cli.timeout, 5);
        let (method, args) = cli.command.split();
        let req = build_req(method, args).unwrap();
        assert_eq!(req.method, "POST");
        match req.body {
            Body::Form(form) => {
                assert_eq!(form["user"], vec!["rob"]);
                assert_eq!(form["note"], vec!["hi"]);
            }
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[test]
    fn del_alias_and_text_body() {
        let cli = parse(&["web", "del", "http://localhost:3000/delete", "-d", "gone"]);
        let (method, args) = cli.command.split();
        let req = build_req(method, args).unwrap();
        assert_eq!(req.method, "DELETE");
        assert!(matches!(req.body, Body::Text(ref t) if t == "gone"));
    }

    #[test]
    fn form_requires_data() {
        assert!(Cli::try_parse_from(["web", "post", "http://localhost:3000/post", "--form"]).is_err());
    }

    #[test]
    fn query_in_url_fails_before_sending() {
        let cli = parse(&["web", "get", "http://127.0.0.1:9/get?a=1"]);
        let err = run(cli).unwrap_err();
        assert!(matches!(err.downcast_ref::<WebError>(), Some(WebError::Syntax(_))));
    }
}
