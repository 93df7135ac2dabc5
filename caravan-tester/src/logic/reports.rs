use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Autopilot Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(out, "{} {}", status, result.scenario_name.bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} clean",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Endings: {} hero / {} starved / {} unfinished",
            result.outcomes.hero, result.outcomes.starved, result.outcomes.unfinished
        )?;
        writeln!(
            out,
            "   Score: best {} mean {:.1} | legs {:.2}",
            result.best_score, result.mean_score, result.mean_journeys
        )?;
        writeln!(
            out,
            "   Road: {} coins, {} recruits, {} encounters, {} lives lost",
            result.outcomes.coins,
            result.outcomes.recruits,
            result.outcomes.encounters,
            result.outcomes.lives_lost
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Caravan Autopilot Results\n")?;
    writeln!(
        out,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    writeln!(
        out,
        "| Scenario | Clean | Hero | Starved | Unfinished | Best score | Mean score |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for result in results {
        writeln!(
            out,
            "| {} | {}/{} | {} | {} | {} | {} | {:.1} |",
            result.scenario_name,
            result.successful_iterations,
            result.iterations_run,
            result.outcomes.hero,
            result.outcomes.starved,
            result.outcomes.unfinished,
            result.best_score,
            result.mean_score
        )?;
    }
    writeln!(out)?;

    for result in results.iter().filter(|r| !r.failures.is_empty()) {
        writeln!(out, "### ❌ {}\n", result.scenario_name)?;
        for failure in &result.failures {
            writeln!(out, "- {failure}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
