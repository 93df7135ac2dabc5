use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use caravan_game::Ending;

use crate::logic::policy::DrivingStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{RunPlan, RunSummary, run_playthrough};

/// Aggregate outcome of every iteration for one strategy and seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub strategy: String,
    pub seed: u64,
    pub seed_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub outcomes: OutcomeTally,
    pub best_score: u64,
    pub mean_score: f64,
    pub mean_journeys: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// How the iterations of a scenario ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub hero: usize,
    pub starved: usize,
    pub unfinished: usize,
    pub encounters: u64,
    pub recruits: u64,
    pub coins: u64,
    pub lives_lost: u64,
}

impl OutcomeTally {
    fn record(&mut self, summary: &RunSummary) {
        match summary.result.ending {
            Ending::Hero => self.hero += 1,
            Ending::Starved => self.starved += 1,
            Ending::Unfinished => self.unfinished += 1,
        }
        self.encounters += u64::from(summary.encounters);
        self.recruits += u64::from(summary.recruits);
        self.coins += u64::from(summary.coins);
        self.lives_lost += u64::from(summary.lives_lost);
    }
}

pub struct LogicTester {
    plan: RunPlan,
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(plan: RunPlan, verbose: bool) -> Self {
        Self { plan, verbose }
    }

    pub fn run_strategy(
        &self,
        strategy: DrivingStrategy,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for info in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing strategy: {} (seed: {} {})",
                    strategy.label().bright_white(),
                    info.seed,
                    info.share_code()
                );
            }
            results.push(self.run_single_scenario(strategy, info, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        strategy: DrivingStrategy,
        info: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut outcomes = OutcomeTally::default();
        let mut scores = Vec::new();
        let mut journeys = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = info
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let code = (i == 0).then(|| info.share_code());
            let mut policy = strategy.create_policy(iteration_seed);

            let summary = match run_playthrough(&self.plan, iteration_seed, code, policy.as_mut()) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {iteration_seed}): {err:#}",
                        i + 1,
                        strategy.label()
                    ));
                    continue;
                }
            };

            outcomes.record(&summary);
            scores.push(summary.result.score);
            journeys.push(summary.result.journeys);

            if summary.passed() {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) steps:{} ending:{} score:{}",
                        i + 1,
                        iterations,
                        summary.steps,
                        summary.result.ending,
                        summary.result.score
                    );
                }
            } else {
                let context = summarize_decision_path(&summary);
                let err = summary.violations.join("; ");
                failures.push(format!(
                    "Iteration {} (strategy {}, seed {}, steps {}, ending '{}'): {} | {} | final food {:.1} gold {} reputation {}",
                    i + 1,
                    strategy.label(),
                    summary.seed,
                    summary.steps,
                    summary.result.ending,
                    err,
                    context,
                    summary.result.food,
                    summary.result.gold,
                    summary.result.reputation
                ));
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            }
        }

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: format!("{} @ {}", strategy.label(), info.share_code()),
            strategy: strategy.key().to_string(),
            seed: info.seed,
            seed_code: info.share_code(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            outcomes,
            best_score: scores.iter().copied().max().unwrap_or(0),
            mean_score: mean(scores.iter().map(|&score| score as f64)),
            mean_journeys: mean(journeys.iter().map(|&legs| f64::from(legs))),
            average_duration: avg_duration,
            performance_data,
        }
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len();
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

fn summarize_decision_path(summary: &RunSummary) -> String {
    if summary.decisions.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .decisions
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            let rationale = entry
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            format!(
                "step {} leg {} ({}): {} [{}] reason {}",
                entry.step,
                entry.leg,
                entry.encounter_id,
                entry.choice_id,
                entry.policy_name,
                rationale
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_counts_every_iteration() {
        let tester = LogicTester::new(RunPlan::bundled(1, 3_000), false);
        let seeds = [SeedInfo::from_numeric(21)];
        let results = tester.run_strategy(DrivingStrategy::Greedy, &seeds, 2);
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.iterations_run, 2);
        assert_eq!(
            result.outcomes.hero + result.outcomes.starved + result.outcomes.unfinished,
            2
        );
        assert_eq!(result.seed_code, caravan_game::encode_friendly(21));
    }

    #[test]
    fn results_serialize_durations_as_millis() {
        let tester = LogicTester::new(RunPlan::bundled(1, 50), false);
        let results = tester.run_strategy(DrivingStrategy::Cautious, &[SeedInfo::from_numeric(4)], 1);
        let json = serde_json::to_value(&results[0]).unwrap();
        assert!(json["average_duration"].is_u64());
        assert!(json["performance_data"].is_array());
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.iterations_run, 1);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert!(mean(std::iter::empty::<f64>()).abs() < f64::EPSILON);
        assert!((mean([2.0, 4.0].into_iter()) - 3.0).abs() < f64::EPSILON);
    }
}
