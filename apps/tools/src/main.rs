use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{Map, Value};
use shared::{
    domain::{AllowList, ObjectKind},
    protocol::{DispatchReport, SignalsTaken},
};

#[derive(Parser, Debug)]
#[command(name = "mowctl", about = "Send commands to the mower control server")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8480")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// `select` or `load` a saved task of the loaded map.
    Task { command: String, name: String },
    /// `select` or `load` a saved map.
    Map { command: String, name: String },
    /// `mow <resume|task|all|selection>`, `stop <value>` or `dock <value>`.
    Robot {
        command: String,
        value: Option<String>,
    },
    /// Mow parameters as `field=value` pairs, e.g. `width=0.2 pattern=rings`.
    Params {
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Print the full state, or one of robot, maps, tasks, mowparameters.
    State { view: Option<String> },
    /// Consume the raised command signals.
    TakeSignals,
    /// Send a command envelope as given.
    Raw { envelope: String },
}

fn object_envelope(object: ObjectKind, command: &str, value: Option<&str>) -> Value {
    let mut body = Map::new();
    body.insert("command".into(), Value::from(command));
    if let Some(value) = value {
        body.insert("value".into(), Value::from(value));
    }
    wrap(object, body)
}

fn wrap(object: ObjectKind, body: Map<String, Value>) -> Value {
    let mut envelope = Map::new();
    envelope.insert(object.as_str().to_string(), Value::Object(body));
    Value::Object(envelope)
}

/// Values that parse as JSON keep their type; anything else is sent as a string.
fn params_envelope(fields: &[String]) -> Result<Value> {
    let mut body = Map::new();
    for field in fields {
        let Some((name, raw)) = field.split_once('=') else {
            bail!("expected field=value, got '{field}'");
        };
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
        body.insert(name.trim().to_string(), value);
    }
    Ok(wrap(ObjectKind::MowParameters, body))
}

async fn send_command(http: &Client, server: &str, envelope: &Value) -> Result<DispatchReport> {
    let report = http
        .post(format!("{server}/api/command"))
        .json(envelope)
        .send()
        .await
        .with_context(|| format!("failed to reach {server}"))?
        .error_for_status()?
        .json()
        .await?;
    Ok(report)
}

fn print_report(report: &DispatchReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    if !report.is_clean() {
        bail!("{} rejection(s)", report.rejections.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/');
    let http = Client::new();

    let envelope = match cli.command {
        Command::Task { command, name } => object_envelope(ObjectKind::Tasks, &command, Some(&name)),
        Command::Map { command, name } => object_envelope(ObjectKind::Maps, &command, Some(&name)),
        Command::Robot { command, value } => {
            object_envelope(ObjectKind::Robot, &command, value.as_deref())
        }
        Command::Params { fields } => params_envelope(&fields)?,
        Command::Raw { envelope } => {
            serde_json::from_str(&envelope).context("envelope is not valid JSON")?
        }
        Command::State { view } => {
            let url = match view {
                Some(view) => format!("{server}/api/state/{view}"),
                None => format!("{server}/api/state"),
            };
            let state: Value = http
                .get(url)
                .send()
                .await
                .with_context(|| format!("failed to reach {server}"))?
                .error_for_status()?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(());
        }
        Command::TakeSignals => {
            let taken: SignalsTaken = http
                .post(format!("{server}/api/signals/take"))
                .send()
                .await
                .with_context(|| format!("failed to reach {server}"))?
                .error_for_status()?
                .json()
                .await?;
            for flag in taken.flags {
                println!("{flag}");
            }
            return Ok(());
        }
    };

    let report = send_command(&http, server, &envelope).await?;
    print_report(&report)
}
