// src/cli/solve.rs — `arbor solve`: run one search and print the result

use super::SolveArgs;
use crate::core::solver::Solver;
use crate::core::types::SolveResponse;
use crate::infra::config::Config;

pub async fn run_solve(args: &SolveArgs, config: Config) -> anyhow::Result<()> {
    let request = args.to_request();
    let solver = Solver::new(config);
    let response = solver.solve(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render(&response));
    }
    Ok(())
}

fn render(response: &SolveResponse) -> String {
    let mut out = String::new();
    if response.solution.is_empty() {
        out.push_str("(no solution)\n");
    } else {
        out.push_str(&response.solution);
        out.push('\n');
    }

    let verdict = if response.solved { "solved" } else { "not solved" };
    let status = if response.incomplete {
        format!(" [incomplete: {:?}]", response.status)
    } else {
        String::new()
    };
    out.push_str(&format!(
        "\n{verdict}{status}: {} round(s), {} oracle call(s), {} failed, ${:.4}\n",
        response.steps.len(),
        response.usage.calls,
        response.usage.failures,
        response.usage.cost_usd,
    ));
    out
}
