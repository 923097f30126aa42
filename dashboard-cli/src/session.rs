//! Interactive dashboard session.
//!
//! One cache lives for the whole session, so repeating a search within the
//! cache window does not hit the network.

use dashboard_core::{Dashboard, SWEEP_INTERVAL, SearchOutcome};
use inquire::InquireError;

use crate::render;

const HELP: &str = "city name, :here, :units, :recent, :quit";

pub async fn run(dashboard: Dashboard) -> anyhow::Result<()> {
    let sweeper = dashboard.client().cache().spawn_sweeper(SWEEP_INTERVAL);
    println!("Units: {}  (type :help for commands)", dashboard.units());

    loop {
        let input = match inquire::Text::new("Search:").with_help_message(HELP).prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => {
                sweeper.shutdown().await;
                return Err(err.into());
            }
        };

        let outcome = match input.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":help" => {
                println!("{HELP}");
                continue;
            }
            ":units" => {
                println!("Units: {}", dashboard.toggle_units());
                continue;
            }
            ":recent" => {
                let recent = dashboard.preferences().recent_searches;
                if recent.is_empty() {
                    println!("No recent searches.");
                }
                for (i, city) in recent.iter().enumerate() {
                    println!("  {}. {city}", i + 1);
                }
                continue;
            }
            ":here" => dashboard.search_here().await,
            city => dashboard.search_city(city).await,
        };

        match outcome {
            Ok(SearchOutcome::Applied(view)) => print!("{}", render::view(&view, 24, 5)),
            Ok(SearchOutcome::Superseded) => {}
            Err(err) => eprintln!("{}", err.user_message()),
        }
        tracing::debug!(cached = dashboard.client().cache().len(), "search finished");
    }

    sweeper.shutdown().await;
    Ok(())
}
