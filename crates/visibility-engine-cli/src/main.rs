mod cli;
mod logging;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use visibility_engine::reference::system_now;
use visibility_engine::{
    extract_schedules, next_content_transition, parse_blocks, parse_reference_instant,
    parse_timezone, restrict_visibility_controls, ContentNode,
};

use crate::cli::{CliArgs, Command, EvalArgs, InputArgs};

#[derive(Debug, Serialize)]
struct NextReport {
    timezone: String,
    now: String,
    next_transition: Option<i64>,
    next_transition_local: Option<String>,
}

#[derive(Debug, Serialize)]
struct Transition {
    timestamp: i64,
    local: String,
}

#[derive(Debug, Serialize)]
struct UpcomingReport {
    timezone: String,
    now: String,
    transitions: Vec<Transition>,
}

fn main() -> Result<()> {
    logging::init();
    let args = CliArgs::parse();

    let output = match args.command {
        Command::Next(eval) => {
            let (blocks, now) = load_evaluation(&eval)?;
            let next = next_content_transition(&blocks, &now);
            debug!(?next, "computed next transition");
            serde_json::to_value(NextReport {
                timezone: eval.timezone.clone(),
                now: now.to_rfc3339(),
                next_transition: next,
                next_transition_local: next.and_then(|ts| format_local(ts, &now.timezone())),
            })?
        }
        Command::Upcoming { eval, count } => {
            let (blocks, now) = load_evaluation(&eval)?;
            serde_json::to_value(UpcomingReport {
                timezone: eval.timezone.clone(),
                now: now.to_rfc3339(),
                transitions: follow_chain(&blocks, now, count),
            })?
        }
        Command::Extract(input) => {
            let blocks = parse_blocks(&read_input(&input)?)?;
            serde_json::to_value(extract_schedules(&blocks))?
        }
        Command::RestrictSettings(input) => {
            let settings: Value = serde_json::from_str(&read_input(&input)?)
                .context("settings input is not valid JSON")?;
            restrict_visibility_controls(settings)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_evaluation(eval: &EvalArgs) -> Result<(Vec<ContentNode>, DateTime<Tz>)> {
    let now = match &eval.now {
        Some(now) => parse_reference_instant(now, &eval.timezone)?,
        None => system_now(parse_timezone(&eval.timezone)?),
    };
    let blocks = parse_blocks(&read_input(&eval.input)?)?;
    Ok((blocks, now))
}

/// Re-evaluate at each transition, as the host does when a wake-up fires.
fn follow_chain(blocks: &[ContentNode], mut now: DateTime<Tz>, count: usize) -> Vec<Transition> {
    let tz = now.timezone();
    let mut transitions = Vec::new();

    while transitions.len() < count {
        let Some(ts) = next_content_transition(blocks, &now) else {
            break;
        };
        let Some(at) = DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&tz)) else {
            break;
        };
        transitions.push(Transition {
            timestamp: ts,
            local: at.to_rfc3339(),
        });
        now = at;
    }

    transitions
}

fn format_local(ts: i64, tz: &Tz) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(tz).to_rfc3339())
}

fn read_input(input: &InputArgs) -> Result<String> {
    match input.input.as_deref() {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}
