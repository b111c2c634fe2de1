use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

const CHECK_KEY: &str = "service-check";

/// Exercise a running API and report which backends are usable
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the API
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Default)]
struct Report {
    failures: usize,
}

impl Report {
    fn pass(&self, check: &str, detail: impl AsRef<str>) {
        println!("[pass] {check}: {}", detail.as_ref());
    }

    fn warn(&self, check: &str, detail: impl AsRef<str>) {
        println!("[warn] {check}: {}", detail.as_ref());
    }

    fn fail(&mut self, check: &str, detail: impl AsRef<str>) {
        self.failures += 1;
        println!("[fail] {check}: {}", detail.as_ref());
    }
}

struct Api {
    client: Client,
    base: String,
}

impl Api {
    fn new(base: &str, timeout: Duration) -> Result<Self> {
        Ok(Api {
            client: Client::builder().timeout(timeout).build()?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    async fn call(&self, method: Method, path: &str) -> Result<(StatusCode, Value)> {
        let url = format!("{}{path}", self.base);
        let response = self
            .client
            .request(method, &url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}

async fn check_root(api: &Api, report: &mut Report) -> Result<()> {
    let (status, body) = api.call(Method::GET, "/").await?;
    if status != StatusCode::OK {
        bail!("API root returned {status}");
    }
    report.pass("root", format!("{} {}", body["name"], body["version"]));
    Ok(())
}

/// Returns whether the cache is usable.
async fn check_health(api: &Api, report: &mut Report) -> Result<bool> {
    let (status, body) = api.call(Method::GET, "/health").await?;
    if status != StatusCode::OK {
        report.fail("health", format!("unexpected status {status}"));
        return Ok(false);
    }

    let line = format!(
        "{} (redis: {}, supabase: {})",
        body["status"], body["redis"], body["supabase"]
    );
    if body["status"] == "healthy" {
        report.pass("health", line);
    } else {
        report.warn("health", line);
    }
    Ok(body["redis"] == "connected")
}

async fn check_redis(api: &Api, report: &mut Report, cache_usable: bool) -> Result<()> {
    let (status, body) = api.call(Method::GET, "/redis/test").await?;
    match status {
        StatusCode::OK if body["redis_available"] == true => {
            report.pass("redis test", format!("read back {}", body["value"]))
        }
        StatusCode::OK => report.warn("redis test", "Redis is not available"),
        other => report.fail("redis test", format!("{other}: {}", body["detail"])),
    }

    if !cache_usable {
        report.warn("cache round trip", "skipped, Redis is not connected");
        return Ok(());
    }

    let set_path = format!("/redis/cache/{CHECK_KEY}?value=ok&ttl=60");
    let key_path = format!("/redis/cache/{CHECK_KEY}");

    let (status, _) = api.call(Method::POST, &set_path).await?;
    if status != StatusCode::OK {
        report.fail("cache set", format!("unexpected status {status}"));
        return Ok(());
    }

    let (status, body) = api.call(Method::GET, &key_path).await?;
    if status == StatusCode::OK && body["value"] == "ok" {
        report.pass("cache get", "value matches");
    } else {
        report.fail("cache get", format!("{status}: {body}"));
    }

    let (status, body) = api.call(Method::DELETE, &key_path).await?;
    if status == StatusCode::OK && body["deleted"] == true {
        report.pass("cache delete", "key removed");
    } else {
        report.fail("cache delete", format!("{status}: {body}"));
    }
    Ok(())
}

async fn check_supabase(api: &Api, report: &mut Report) -> Result<()> {
    let (status, body) = api.call(Method::GET, "/supabase/test").await?;
    match status {
        StatusCode::OK if body["supabase_available"] == true => {
            report.pass("supabase test", format!("client for {}", body["url"]))
        }
        StatusCode::OK => report.warn("supabase test", format!("{}", body["message"])),
        other => report.fail("supabase test", format!("{other}: {}", body["detail"])),
    }
    Ok(())
}

/// Run every check, failing if the API is unreachable or any check failed.
async fn run(api: &Api) -> Result<()> {
    let mut report = Report::default();

    check_root(api, &mut report)
        .await
        .context("API is not reachable")?;
    let cache_usable = check_health(api, &mut report).await?;
    check_redis(api, &mut report, cache_usable).await?;
    check_supabase(api, &mut report).await?;

    if report.failures > 0 {
        bail!("{} check(s) failed", report.failures);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = Api::new(&cli.api_url, Duration::from_secs(cli.timeout_secs))?;

    println!("Checking {}", api.base);
    run(&api).await?;
    println!("All checks completed");
    Ok(())
}
