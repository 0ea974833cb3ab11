/// AI Travel Planner - interactive CLI
///
/// Prompts for origin, destination and travel dates on stdin,
/// sends them to the hosted agent and prints the itinerary.
/// Ctrl-C abandons the wait.
///
/// Requires: AZURE_AI_PROJECT_ENDPOINT and AZURE_AI_AGENT_ID (environment or .env)

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use travel_planner::{build_planner, init_tracing, PlannerConfig, TripRequest};

fn prompt_line(stdin: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_date(stdin: &mut impl BufRead, label: &str) -> Result<Option<NaiveDate>> {
    loop {
        let raw = prompt_line(stdin, label)?;
        if raw.is_empty() {
            return Ok(None);
        }
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => return Ok(Some(date)),
            Err(_) => println!("  Please enter the date as YYYY-MM-DD."),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    init_tracing();

    let config = PlannerConfig::from_env().context("failed to load configuration")?;
    let planner = build_planner(&config)?;

    println!("\n🧳 AI Travel Planner");
    println!("Plan your next adventure with AI-powered itinerary suggestions.\n");

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let request = TripRequest {
        origin: prompt_line(&mut stdin, "Origin City (e.g., Nashville, TN)")?,
        destination: prompt_line(&mut stdin, "Destination City (e.g., Boston, MA)")?,
        start_date: prompt_date(&mut stdin, "Start Date (YYYY-MM-DD)")?,
        end_date: prompt_date(&mut stdin, "End Date (YYYY-MM-DD)")?,
    };
    drop(stdin);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    println!("\nBuilding your personalized itinerary...\n");
    match planner.plan(&request, &cancel).await {
        Ok(itinerary) => {
            println!("🎉 Your Itinerary:\n");
            println!("{}", itinerary);
        }
        Err(e) => {
            println!("{}", e.user_message());
            if let Some(hint) = e.hint() {
                println!("{}", hint);
            }
        }
    }

    Ok(())
}
