//! JSON summaries printed to stdout.

use anyhow::Result;
use elevation::{FetchPlan, FetchReport};
use serde_json::{json, Value};

fn plan_json(plan: &FetchPlan) -> Value {
    let jobs: Vec<Value> = plan
        .jobs
        .iter()
        .map(|job| {
            json!({
                "href": job.href,
                "source": job.source,
                "destination": job.destination,
            })
        })
        .collect();

    json!({
        "output_dir": plan.output_dir,
        "bounds": plan.bounds,
        "selected": plan.selected.len(),
        "jobs": jobs,
        "collisions": plan.collisions,
    })
}

pub fn print_plan(plan: &FetchPlan) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&plan_json(plan))?);
    Ok(())
}

pub fn print_report(report: &FetchReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
