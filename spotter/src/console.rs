use anyhow::{anyhow, bail};
use zerocore::catalog::{radius_for_name, Caliber, CaliberSpec};
use zerocore::session::{HistoryEntry, SessionEvent, VisibilityFilter};
use zerocore::sync::CalibrationView;
use zerocore::telemetry::SyncMetrics;
use zerocore::{Point, PointId, SyncHandle};

pub const HELP: &str = "commands: select <id> | distance <m> | preset <label> | caliber <name> | calibers | finish | history | show [all|latest|until] | stats | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Select(PointId),
    Distance(f64),
    Preset(String),
    Caliber(String),
    Calibers,
    Finish,
    History,
    Show(VisibilityFilter),
    Stats,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> anyhow::Result<ConsoleCommand> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let command = match word.to_ascii_lowercase().as_str() {
        "select" | "s" => ConsoleCommand::Select(
            rest.trim_start_matches('#')
                .parse()
                .map_err(|_| anyhow!("select needs a point id, got {rest:?}"))?,
        ),
        "distance" | "d" => ConsoleCommand::Distance(
            rest.trim_end_matches('m')
                .trim()
                .parse()
                .map_err(|_| anyhow!("distance needs a number of metres, got {rest:?}"))?,
        ),
        "preset" | "p" => {
            if rest.is_empty() {
                bail!("preset needs a distance label such as \"100 m\"");
            }
            ConsoleCommand::Preset(rest.to_string())
        }
        "caliber" | "c" => {
            if rest.is_empty() {
                bail!("caliber needs a name");
            }
            ConsoleCommand::Caliber(rest.to_string())
        }
        "finish" | "reset" => ConsoleCommand::Finish,
        "history" | "h" => ConsoleCommand::History,
        "calibers" => ConsoleCommand::Calibers,
        "show" => ConsoleCommand::Show(parse_filter(rest)?),
        "stats" => ConsoleCommand::Stats,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => bail!("unknown command {other:?}; {HELP}"),
    };
    Ok(command)
}

fn parse_filter(word: &str) -> anyhow::Result<VisibilityFilter> {
    match word.to_ascii_lowercase().as_str() {
        "" | "all" => Ok(VisibilityFilter::All),
        "latest" | "last" => Ok(VisibilityFilter::LatestOnly),
        "until" | "selected" => Ok(VisibilityFilter::UntilSelection),
        other => bail!("show takes all, latest or until, got {other:?}"),
    }
}

/// One-line notice for events worth telling the shooter about.
pub fn describe_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::PointAdded(id) => Some(format!("shot #{id:03} recorded")),
        SessionEvent::PointsReplaced(count) => Some(format!("board loaded with {count} shots")),
        SessionEvent::LockChanged(true) => Some("session started, distance and caliber locked".into()),
        SessionEvent::LockChanged(false) => Some("controls unlocked".into()),
        SessionEvent::Reset => Some("session finished".into()),
        SessionEvent::DistanceChanged(_)
        | SessionEvent::CaliberChanged(_)
        | SessionEvent::SelectionChanged(_) => None,
    }
}

pub fn render_calibration(view: &CalibrationView) -> String {
    let selected = view
        .selected
        .map(|id| format!("#{id:03}"))
        .unwrap_or_else(|| "none".into());
    format!(
        "[{} | {}] {}  ({}, {})  selected {}  shots {}",
        view.distance, view.caliber, view.adjustment, view.horizontal, view.vertical, selected, view.shots
    )
}

pub fn render_points(points: &[Point]) -> Vec<String> {
    points
        .iter()
        .map(|p| {
            format!(
                "  #{:03}  X: {} mm | Y: {} mm  r {} mm",
                p.id, p.x_mm, p.y_mm, p.radius_mm
            )
        })
        .collect()
}

pub fn render_catalog(specs: &[CaliberSpec]) -> Vec<String> {
    specs
        .iter()
        .map(|spec| format!("  {:<16} marker {:.2} mm", spec.caliber.name(), spec.radius_mm))
        .collect()
}

pub fn render_history(entries: &[HistoryEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["no shots yet".into()];
    }
    entries
        .iter()
        .map(|entry| {
            let marker = if entry.selected { ">" } else { " " };
            format!("{marker} {}", entry.text)
        })
        .collect()
}

pub fn render_metrics(metrics: &SyncMetrics) -> String {
    let latency = metrics
        .last_clear_latency
        .map(|d| format!("{} ms", d.as_millis()))
        .unwrap_or_else(|| "n/a".into());
    format!(
        "polls {} | failures {} | skipped {} | ingested {} | last clear {}",
        metrics.polls, metrics.failures, metrics.skipped_ticks, metrics.ingested, latency
    )
}

/// Runs one command against the engine and prints the outcome.
pub async fn execute(handle: &SyncHandle, command: ConsoleCommand) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Select(id) => {
            if !handle.select_point(id).await? {
                println!("no shot #{id:03}");
            }
        }
        ConsoleCommand::Distance(distance_m) => {
            if handle.set_distance(distance_m).await? {
                println!("distance set to {distance_m} m");
            } else {
                println!("distance unchanged (session locked, invalid or same value)");
            }
        }
        ConsoleCommand::Preset(label) => {
            if !handle.select_distance_label(&label).await? {
                println!("distance unchanged (session locked, unknown or same preset)");
            }
        }
        ConsoleCommand::Caliber(name) => {
            if handle.set_caliber(&name).await? {
                println!("caliber set to {name}, marker {:.2} mm", radius_for_name(&name));
            } else {
                println!("caliber unchanged (session locked or unknown caliber)");
            }
        }
        ConsoleCommand::Finish => {
            let report = handle.finish_session().await?;
            let board = if report.remote_cleared {
                "board cleared"
            } else {
                "board did not confirm"
            };
            println!("{board} in {} ms", report.latency.as_millis());
        }
        ConsoleCommand::History => {
            for line in render_history(&handle.history().await?) {
                println!("{line}");
            }
        }
        ConsoleCommand::Calibers => {
            let specs: Vec<CaliberSpec> = Caliber::ALL.iter().map(|c| c.spec()).collect();
            for line in render_catalog(&specs) {
                println!("{line}");
            }
        }
        ConsoleCommand::Show(filter) => {
            println!("{}", render_calibration(&handle.calibration().await?));
            for line in render_points(&handle.visible_points(filter).await?) {
                println!("{line}");
            }
        }
        ConsoleCommand::Stats => println!("{}", render_metrics(&handle.metrics())),
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_commands_and_arguments() {
        assert_eq!(parse_command("select 7").unwrap(), ConsoleCommand::Select(7));
        assert_eq!(parse_command("s #12").unwrap(), ConsoleCommand::Select(12));
        assert_eq!(parse_command("distance 100 m").unwrap(), ConsoleCommand::Distance(100.0));
        assert_eq!(parse_command("d 12.5").unwrap(), ConsoleCommand::Distance(12.5));
        assert_eq!(
            parse_command("caliber .308 Win").unwrap(),
            ConsoleCommand::Caliber(".308 Win".into())
        );
        assert_eq!(parse_command("  FINISH ").unwrap(), ConsoleCommand::Finish);
        assert_eq!(
            parse_command("preset 200 m").unwrap(),
            ConsoleCommand::Preset("200 m".into())
        );
        assert_eq!(
            parse_command("show").unwrap(),
            ConsoleCommand::Show(VisibilityFilter::All)
        );
        assert_eq!(
            parse_command("show until").unwrap(),
            ConsoleCommand::Show(VisibilityFilter::UntilSelection)
        );
        assert_eq!(parse_command("q").unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("select x").is_err());
        assert!(parse_command("distance far").is_err());
        assert!(parse_command("caliber").is_err());
        assert!(parse_command("preset").is_err());
        assert!(parse_command("show some").is_err());
        assert!(parse_command("fire").is_err());
    }

    #[test]
    fn history_marks_the_selected_row() {
        let entries = vec![
            HistoryEntry {
                point_id: 2,
                text: "#002".into(),
                selected: true,
            },
            HistoryEntry {
                point_id: 1,
                text: "#001".into(),
                selected: false,
            },
        ];
        assert_eq!(render_history(&entries), vec!["> #002", "  #001"]);
        assert_eq!(render_history(&[]), vec!["no shots yet"]);
    }

    #[test]
    fn catalog_lists_every_caliber_with_its_marker() {
        let specs: Vec<CaliberSpec> = Caliber::ALL.iter().map(|c| c.spec()).collect();
        let lines = render_catalog(&specs);
        assert_eq!(lines.len(), 24);
        assert!(lines.last().unwrap().ends_with("marker 6.49 mm"));
    }

    #[test]
    fn points_show_raw_offsets() {
        let lines = render_points(&[Point::new(3, 12.34, -0.05, 4.0)]);
        assert_eq!(lines, vec!["  #003  X: 12.34 mm | Y: -0.05 mm  r 4 mm"]);
    }

    #[test]
    fn quiet_events_are_not_announced() {
        assert_eq!(describe_event(&SessionEvent::SelectionChanged(Some(1))), None);
        assert_eq!(
            describe_event(&SessionEvent::PointAdded(4)).as_deref(),
            Some("shot #004 recorded")
        );
    }

    #[test]
    fn metrics_line_shows_clear_latency() {
        let metrics = SyncMetrics {
            polls: 3,
            last_clear_latency: Some(Duration::from_millis(42)),
            ..Default::default()
        };
        assert!(render_metrics(&metrics).ends_with("last clear 42 ms"));
    }
}
